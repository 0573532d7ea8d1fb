//! A minimal host: documents, lifecycle hooks, and page generators.

mod document;
mod feed;
mod hooks;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Chainable, Result};
use crate::markdown::{AutoHeading, HeadingAnchor, Markdown};

pub use document::{Document, parse_date};
pub use feed::Feed;
pub use hooks::{Event, Hook, Hooks, Owner};

/// Site-wide settings visible to generators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Absolute URL the site is served from.
    #[serde(default)]
    pub root: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl SiteInfo {
    /// Joins `path` onto the site root with exactly one `/` between them.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// A generated output file.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Path relative to the output root.
    pub path: PathBuf,
    pub content: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

/// Produces additional pages once every document has been rendered.
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn generate(&self, site: &mut Site) -> Result<()>;
}

#[derive(Debug)]
pub struct Site {
    /// The content root.
    pub source: PathBuf,
    pub info: SiteInfo,
    pub posts: Vec<Document>,
    pub pages: Vec<Document>,
    pub generated: Vec<Page>,
}

impl Site {
    pub fn new<P: Into<PathBuf>>(source: P, info: SiteInfo) -> Self {
        Site {
            source: source.into(),
            info,
            posts: vec![],
            pages: vec![],
            generated: vec![],
        }
    }

    pub fn in_source_dir<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.source.join(path)
    }

    pub fn add_document(&mut self, doc: Document) {
        match doc.kind {
            Owner::Posts => self.posts.push(doc),
            Owner::Pages => self.pages.push(doc),
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.generated.push(page);
    }

    /// Posts that aren't drafts, newest first.
    pub fn published_posts(&self) -> Vec<&Document> {
        let mut posts: Vec<_> = self.posts.iter().filter(|p| !p.is_draft()).collect();
        posts.sort_by(|a, b| b.date().cmp(&a.date()).then_with(|| a.path.cmp(&b.path)));
        posts
    }

    /// Renders every non-draft document to HTML, in parallel, running the
    /// `pre_render` and `post_render` hooks around the markdown pipeline.
    pub fn render(&mut self, hooks: &Hooks) -> Result<()> {
        self.posts.par_iter_mut()
            .chain(self.pages.par_iter_mut())
            .filter(|doc| !doc.is_draft())
            .try_for_each(|doc| render_document(doc, hooks))
    }

    /// Runs `generators` from highest to lowest priority.
    pub fn generate(&mut self, generators: &[&dyn Generator]) -> Result<()> {
        let mut generators = generators.to_vec();
        generators.sort_by_key(|g| g.priority());
        for generator in generators {
            tracing::info!(generator = generator.name(), "running generator");
            generator.generate(self).chain_with(|| error! {
                "generator failed",
                "generator" => generator.name(),
            })?;
        }

        Ok(())
    }
}

/// Renders one document: `pre_render` hooks, markdown, `post_render` hooks.
pub fn render_document(doc: &mut Document, hooks: &Hooks) -> Result<()> {
    hooks.trigger(doc.kind, Event::PreRender, doc)?;

    let html = Markdown::from(doc.content.as_str())
        .plugin(AutoHeading::default())
        .plugin(HeadingAnchor::default())
        .run()
        .chain_with(|| error! {
            "markdown rendering failed",
            "document" => doc.path.display(),
        })?;

    doc.output = Some(html);
    hooks.trigger(doc.kind, Event::PostRender, doc)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Named(&'static str, Priority, Arc<std::sync::Mutex<Vec<&'static str>>>);

    impl Generator for Named {
        fn name(&self) -> &str { self.0 }

        fn priority(&self) -> Priority { self.1 }

        fn generate(&self, _: &mut Site) -> Result<()> {
            self.2.lock().unwrap().push(self.0);
            Ok(())
        }
    }

    #[test]
    fn generators_run_by_priority() {
        let log = Arc::new(std::sync::Mutex::new(vec![]));
        let low = Named("low", Priority::Lowest, log.clone());
        let high = Named("high", Priority::Highest, log.clone());
        let normal = Named("normal", Priority::Normal, log.clone());

        let mut site = Site::new("content", SiteInfo::default());
        site.generate(&[&low, &high, &normal]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["high", "normal", "low"]);
    }

    #[test]
    fn render_runs_hooks_around_markdown() {
        let post_renders = Arc::new(AtomicUsize::new(0));
        let counter = post_renders.clone();

        let mut hooks = Hooks::new();
        hooks.register(Owner::Posts, Event::PreRender, |d| {
            d.content = d.content.replace("PLACEHOLDER", "*replaced*");
            Ok(())
        });

        hooks.register(Owner::Posts, Event::PostRender, move |d| {
            assert!(d.output.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut site = Site::new("content", SiteInfo::default());
        site.add_document(Document::parse(Owner::Posts, "_posts/2020-01-01-a.md", "PLACEHOLDER").unwrap());
        site.add_document(Document::parse(Owner::Posts, "_posts/2020-01-02-b.md", "+++\ndraft = true\n+++\nx").unwrap());
        site.add_document(Document::parse(Owner::Pages, "about.md", "PLACEHOLDER").unwrap());
        site.render(&hooks).unwrap();

        assert_eq!(site.posts[0].output.as_deref(), Some("<p><em>replaced</em></p>\n"));
        assert_eq!(site.posts[1].output, None);
        assert_eq!(site.pages[0].output.as_deref(), Some("<p>PLACEHOLDER</p>\n"));
        assert_eq!(post_renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn published_posts_are_newest_first() {
        let mut site = Site::new("content", SiteInfo::default());
        for name in ["2020-01-01-old.md", "2022-01-01-new.md", "2021-01-01-mid.md"] {
            site.add_document(Document::parse(Owner::Posts, format!("_posts/{name}"), "").unwrap());
        }

        let slugs: Vec<_> = site.published_posts().iter().map(|p| p.slug()).collect();
        assert_eq!(slugs, ["new", "mid", "old"]);
    }

    #[test]
    fn urls_join_cleanly() {
        let info = SiteInfo { root: "https://example.com/".into(), ..Default::default() };
        assert_eq!(info.url("/feed.xml"), "https://example.com/feed.xml");
        assert_eq!(info.url("posts/a/"), "https://example.com/posts/a/");
    }
}
