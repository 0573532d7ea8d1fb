use std::path::Path;
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use plumage::diagram::{Dot, Graphviz};
use plumage::error::{Chainable, Result};
use plumage::error;
use plumage::site::{Feed, SiteInfo};

#[derive(Default, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub graphviz: GraphvizConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(flatten)]
    pub globals: FxHashMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphvizConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Seconds to wait for the renderer before giving up.
    pub timeout: u64,
    pub header_lines: usize,
    pub source_comment: bool,
    pub parallel: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub enabled: bool,
    pub path: String,
    pub limit: usize,
}

impl Default for GraphvizConfig {
    fn default() -> Self {
        GraphvizConfig {
            program: Dot::PROGRAM.into(),
            args: vec!["-Tsvg".into()],
            timeout: Dot::TIMEOUT.as_secs(),
            header_lines: Dot::HEADER_LINES,
            source_comment: true,
            parallel: true,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig { enabled: true, path: Feed::PATH.into(), limit: Feed::LIMIT }
    }
}

impl Config {
    /// Reads `root/config.toml`, or returns the defaults if there isn't one.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(crate::CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Config::default());
        }

        let string = std::fs::read_to_string(&path)?;
        toml::from_str(&string).chain_with(|| error! {
            "invalid configuration",
            "path" => path.display(),
        })
    }

    pub fn site_info(&self) -> SiteInfo {
        SiteInfo {
            title: self.title.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            root: self.root.clone(),
            extra: self.globals.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        }
    }

    pub fn graphviz(&self) -> Graphviz<Dot> {
        let settings = &self.graphviz;
        let dot = Dot::new()
            .program(&settings.program)
            .args(&settings.args)
            .timeout(Duration::from_secs(settings.timeout))
            .header_lines(settings.header_lines);

        Graphviz::new(dot)
            .source_comment(settings.source_comment)
            .parallel(settings.parallel)
    }

    pub fn feed(&self) -> Feed {
        Feed::new().path(&*self.feed.path).limit(self.feed.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.graphviz.program, "dot");
        assert_eq!(config.graphviz.args, ["-Tsvg"]);
        assert_eq!(config.graphviz.timeout, 30);
        assert!(config.feed.enabled);
        assert_eq!(config.feed.path, "feed.xml");
    }

    #[test]
    fn tables_and_globals_are_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::CONFIG_FILE), r#"
            title = "Notes"
            root = "https://example.com"
            theme = "dark"

            [graphviz]
            timeout = 5
            source_comment = false

            [feed]
            enabled = false
        "#).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.graphviz.timeout, 5);
        assert_eq!(config.graphviz.header_lines, 3);
        assert!(!config.graphviz.source_comment);
        assert!(!config.feed.enabled);
        assert_eq!(config.feed.limit, 10);

        let info = config.site_info();
        assert_eq!(info.title.as_deref(), Some("Notes"));
        assert_eq!(info.extra["theme"], "dark");
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::CONFIG_FILE), "title = [").unwrap();
        let error = Config::discover(dir.path()).unwrap_err();
        assert!(error.mentions("invalid configuration"));
    }
}
