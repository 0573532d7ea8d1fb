use std::path::{Component, Path, PathBuf};

use plumage::error::{Chainable, Error, Result};
use plumage::error;
use plumage::site::{Document, Owner, Site};

use crate::{CONTENT_DIR, POSTS_DIR};
use crate::config::Config;
use crate::util::dircheck;

#[derive(Debug)]
pub struct Kestrel {
    pub root: PathBuf,
    pub content: PathBuf,
    pub output: PathBuf,
    pub config: Config,
}

/// What a file under the content root turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Document(Owner),
    Asset,
    Ignored,
}

/// Everything found under the content root.
#[derive(Debug)]
pub struct Discovered {
    pub site: Site,
    /// Asset paths, relative to the content root.
    pub assets: Vec<PathBuf>,
}

impl Kestrel {
    pub fn new<I, O>(input: I, output: O) -> Result<Self>
        where I: AsRef<Path>, O: AsRef<Path>
    {
        let root = input.as_ref().to_path_buf();
        Ok(Kestrel {
            content: dircheck(&root, CONTENT_DIR)?,
            config: Config::discover(&root)?,
            output: output.as_ref().to_path_buf(),
            root,
        })
    }

    pub fn discover(&self) -> Result<Discovered> {
        let mut site = Site::new(&self.content, self.config.site_info());
        let mut assets = vec![];

        for entry in jwalk::WalkDir::new(&self.content).sort(true) {
            let entry = entry.map_err(Error::from_std).chain_with(|| error! {
                "failed to walk content directory",
                "path" => self.content.display(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.content).unwrap_or(&path).to_path_buf();
            match classify(&relative) {
                Kind::Document(owner) => site.add_document(Document::read(owner, &self.content, &relative)?),
                Kind::Asset => assets.push(relative),
                Kind::Ignored => tracing::debug!(path = %relative.display(), "ignoring file"),
            }
        }

        tracing::info!(
            posts = site.posts.len(),
            pages = site.pages.len(),
            assets = assets.len(),
            "discovered content"
        );

        Ok(Discovered { site, assets })
    }
}

/// Markdown under `_posts/` is a post, other markdown is a page. Anything
/// else under a `_`-prefixed directory is ignored; the rest are assets.
pub fn classify(relative: &Path) -> Kind {
    let is_markdown = matches!(
        relative.extension().and_then(|e| e.to_str()),
        Some("md" | "mdown" | "markdown")
    );

    let mut dirs = relative.parent().into_iter().flat_map(|p| p.components());
    let first = dirs.next();
    let underscored = |c: &Component<'_>| c.as_os_str().to_string_lossy().starts_with('_');
    match first {
        Some(c) if c.as_os_str() == POSTS_DIR && is_markdown => Kind::Document(Owner::Posts),
        Some(c) if underscored(&c) => Kind::Ignored,
        _ if dirs.any(|c| underscored(&c)) => Kind::Ignored,
        _ if is_markdown => Kind::Document(Owner::Pages),
        _ => Kind::Asset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_classified_by_location() {
        let kind = |p: &str| classify(Path::new(p));

        assert_eq!(kind("_posts/2024-01-01-hello.md"), Kind::Document(Owner::Posts));
        assert_eq!(kind("_posts/2024/2024-01-01-nested.markdown"), Kind::Document(Owner::Posts));
        assert_eq!(kind("_posts/notes.txt"), Kind::Ignored);
        assert_eq!(kind("_drafts/idea.md"), Kind::Ignored);
        assert_eq!(kind("docs/_partials/x.md"), Kind::Ignored);
        assert_eq!(kind("about.md"), Kind::Document(Owner::Pages));
        assert_eq!(kind("docs/guide.md"), Kind::Document(Owner::Pages));
        assert_eq!(kind("images/logo.png"), Kind::Asset);
        assert_eq!(kind("feed.xml"), Kind::Asset);
    }

    #[test]
    fn discovers_documents_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        std::fs::create_dir_all(content.join("_posts")).unwrap();
        std::fs::write(content.join("_posts/2024-01-01-hello.md"), "hello").unwrap();
        std::fs::write(content.join("about.md"), "about").unwrap();
        std::fs::write(content.join("style.css"), "body {}").unwrap();

        let kestrel = Kestrel::new(dir.path(), dir.path().join("out")).unwrap();
        let discovered = kestrel.discover().unwrap();

        assert_eq!(discovered.site.posts.len(), 1);
        assert_eq!(discovered.site.posts[0].content, "hello");
        assert_eq!(discovered.site.pages[0].path, Path::new("about.md"));
        assert_eq!(discovered.assets, [PathBuf::from("style.css")]);
    }

    #[test]
    fn missing_content_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = Kestrel::new(dir.path(), dir.path().join("out")).unwrap_err();
        assert!(error.mentions("content"));
    }
}
