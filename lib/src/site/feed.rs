use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use minijinja::value::Value as TemplateValue;
use minijinja::Environment;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Chainable, Result};
use crate::site::{Document, Generator, Page, Priority, Site, SiteInfo};
use crate::util::{escape_xml, minify};

const TEMPLATE: &str = include_str!("templates/feed.xml");

/// Generates an Atom feed of the site's newest posts.
///
/// Skipped entirely when the content root already contains a file at the
/// feed's path, so a site can provide its own.
#[derive(Debug, Clone)]
pub struct Feed {
    path: String,
    limit: usize,
}

#[derive(Serialize)]
struct Context<'a> {
    site: &'a SiteInfo,
    feed_url: String,
    updated: String,
    posts: Vec<Entry<'a>>,
}

#[derive(Serialize)]
struct Entry<'a> {
    title: std::borrow::Cow<'a, str>,
    url: String,
    published: String,
    updated: String,
    content: &'a str,
    tags: Vec<&'a str>,
}

impl Default for Feed {
    fn default() -> Self {
        Feed { path: Feed::PATH.into(), limit: Feed::LIMIT }
    }
}

impl Feed {
    pub const PATH: &'static str = "feed.xml";

    pub const LIMIT: usize = 10;

    pub fn new() -> Self {
        Feed::default()
    }

    pub fn path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Renders the feed document for `site`.
    pub fn render(&self, site: &Site) -> Result<String> {
        let posts = site.published_posts();
        let updated = posts.iter()
            .filter_map(|p| p.date())
            .max()
            .map(timestamp)
            .unwrap_or_else(|| DateTime::<Utc>::from(SystemTime::now()).format(RFC3339).to_string());

        let context = Context {
            site: &site.info,
            feed_url: site.info.url(&self.path),
            updated,
            posts: posts.into_iter().take(self.limit).map(|p| entry(&site.info, p)).collect(),
        };

        let mut env = Environment::new();
        env.add_filter("xml", xml);

        let template = minify(TEMPLATE);
        let xml = env.render_str(&template, TemplateValue::from_serializable(&context))
            .chain_with(|| error! {
                "failed to render feed template",
                "path" => &self.path,
            })?;

        Ok(xml)
    }
}

fn xml(value: &str) -> String {
    escape_xml(value).into_owned()
}

const RFC3339: &str = "%Y-%m-%dT%H:%M:%SZ";

fn timestamp(datetime: NaiveDateTime) -> String {
    datetime.format(RFC3339).to_string()
}

fn entry<'a>(info: &SiteInfo, post: &'a Document) -> Entry<'a> {
    let published = post.date().map(timestamp).unwrap_or_default();
    let updated = post.data.get("updated")
        .and_then(super::document::parse_date_value)
        .map(timestamp)
        .unwrap_or_else(|| published.clone());

    Entry {
        title: post.title(),
        url: info.url(&post.url_path()),
        published,
        updated,
        content: post.output.as_deref().unwrap_or(&post.content),
        tags: post.tags(),
    }
}

impl Generator for Feed {
    fn name(&self) -> &str {
        "feed"
    }

    fn priority(&self) -> Priority {
        Priority::Lowest
    }

    fn generate(&self, site: &mut Site) -> Result<()> {
        let existing = site.in_source_dir(&self.path);
        if existing.exists() {
            tracing::info!(path = %existing.display(), "feed exists in source; skipping generation");
            return Ok(());
        }

        tracing::info!(path = %self.path, "generating feed for posts");
        let content = self.render(site)?;
        let data = json!({
            "layout": null,
            "sitemap": false,
            "xsl": false,
            "collection": "posts",
            "category": null,
            "tags": null,
        });

        let data: Map<String, Value> = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        site.add_page(Page { path: self.path.clone().into(), content, data });
        Ok(())
    }
}
