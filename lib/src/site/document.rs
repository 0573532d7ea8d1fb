use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::{Chainable, Result};
use crate::site::Owner;
use crate::util::slugify;

const FRONT_MATTER_PREFIX: &str = "+++\n";
const FRONT_MATTER_SUFFIX: &str = "\n+++\n";

/// Key TOML uses when a datetime is deserialized into a generic value.
const TOML_DATETIME: &str = "$__toml_private_datetime";

/// A post or page: front matter plus a mutable text body.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: Owner,
    /// Path relative to the content root.
    pub path: PathBuf,
    /// Front matter.
    pub data: Map<String, Value>,
    /// The body, as read, then as mutated by `pre_render` hooks.
    pub content: String,
    /// Rendered HTML, once available.
    pub output: Option<String>,
}

impl Document {
    /// Splits optional TOML front matter, fenced by `+++` lines, off `text`.
    pub fn parse<P: Into<PathBuf>>(kind: Owner, path: P, text: &str) -> Result<Self> {
        let path = path.into();
        let (data, content) = match split_front_matter(text) {
            Some((front_matter, content)) => {
                let data = toml::from_str(front_matter).chain_with(|| error! {
                    "invalid front matter",
                    "document" => path.display(),
                })?;

                (data, content)
            }
            None => (Map::new(), text),
        };

        Ok(Document { kind, path, data, content: content.to_string(), output: None })
    }

    /// Reads and parses `root/path`.
    pub fn read(kind: Owner, root: &Path, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(root.join(path)).chain_with(|| error! {
            "failed to read document",
            "path" => root.join(path).display(),
        })?;

        Document::parse(kind, path, &text)
    }

    pub fn file_stem(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Cow<'_, str> {
        match self.get_str("title") {
            Some(title) => title.into(),
            None => self.slug().replace('-', " ").into(),
        }
    }

    /// The front matter `date`, else the `YYYY-MM-DD-` prefix of the file
    /// name.
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.data.get("date")
            .and_then(parse_date_value)
            .or_else(|| date_prefix(self.file_stem()).and_then(|(date, _)| midnight(date)))
    }

    /// The front matter `slug`, else the file stem without any date prefix.
    pub fn slug(&self) -> String {
        if let Some(slug) = self.get_str("slug") {
            return slugify(slug);
        }

        let stem = self.file_stem();
        let stem = date_prefix(stem).map_or(stem, |(_, rest)| rest);
        slugify(stem)
    }

    pub fn is_draft(&self) -> bool {
        self.data.get("draft").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn tags(&self) -> Vec<&str> {
        match self.data.get("tags") {
            Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(tags)) => tags.split_whitespace().collect(),
            _ => vec![],
        }
    }

    /// Where the rendered document is written, relative to the output root.
    pub fn output_path(&self) -> PathBuf {
        match self.kind {
            Owner::Posts => Path::new("posts").join(self.slug()).join("index.html"),
            Owner::Pages => self.path.with_extension("html"),
        }
    }

    /// The path component of the document's URL.
    pub fn url_path(&self) -> String {
        match self.kind {
            Owner::Posts => format!("posts/{}/", self.slug()),
            Owner::Pages => self.output_path().to_string_lossy().replace('\\', "/"),
        }
    }
}

fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(FRONT_MATTER_PREFIX)?;

    // Allow for empty front matter, where the closing fence follows directly.
    if let Some(content) = rest.strip_prefix(&FRONT_MATTER_SUFFIX[1..]) {
        return Some(("", content));
    }

    rest.split_once(FRONT_MATTER_SUFFIX)
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

/// Splits `2024-01-31-rest` into the date and `rest`.
fn date_prefix(stem: &str) -> Option<(NaiveDate, &str)> {
    let (date, rest) = (stem.get(..10)?, stem.get(10..)?);
    let rest = rest.strip_prefix('-')?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, rest))
}

pub(crate) fn parse_date_value(value: &Value) -> Option<NaiveDateTime> {
    let string = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get(TOML_DATETIME)?.as_str()?,
        _ => return None,
    };

    parse_date(string)
}

/// Parses RFC 3339 datetimes, local datetimes, and plain dates.
pub fn parse_date(string: &str) -> Option<NaiveDateTime> {
    let string = string.trim();
    DateTime::parse_from_rfc3339(string).map(|dt| dt.naive_utc()).ok()
        .or_else(|| NaiveDateTime::parse_from_str(string, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(string, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| NaiveDate::parse_from_str(string, "%Y-%m-%d").ok().and_then(midnight))
}
