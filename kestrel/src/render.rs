use std::io::Write;
use std::path::{Path, PathBuf};

use plumage::rayon::prelude::*;
use plumage::error::{Chainable, Result};
use plumage::error;
use plumage::site::{Hooks, Site};

use crate::config::Config;
use crate::discover::{Discovered, Kestrel};
use crate::util::{html_page, write_file};

impl Kestrel {
    /// Renders every document, runs the generators, and writes the site.
    pub fn build(&self, discovered: Discovered) -> Result<()> {
        let Discovered { mut site, assets } = discovered;

        let mut hooks = Hooks::new();
        self.config.graphviz().register(&mut hooks);
        site.render(&hooks)?;

        if self.config.feed.enabled {
            let feed = self.config.feed();
            site.generate(&[&feed])?;
        }

        self.write_site(&site, &assets)
    }

    fn write_site(&self, site: &Site, assets: &[PathBuf]) -> Result<()> {
        let documents = site.posts.par_iter()
            .chain(site.pages.par_iter())
            .filter_map(|doc| doc.output.as_ref().map(|html| (doc, html)))
            .try_for_each(|(doc, html)| {
                let path = self.output.join(doc.output_path());
                write_file(&path, html_page(&doc.title(), html))
            });

        let generated = site.generated.par_iter()
            .try_for_each(|page| write_file(&self.output.join(&page.path), &page.content));

        let copied = assets.par_iter().try_for_each(|asset| {
            let (from, to) = (self.content.join(asset), self.output.join(asset));
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::copy(&from, &to).map(|_| ()).chain_with(|| error! {
                "failed to copy asset",
                "from" => from.display(),
                "to" => to.display(),
            })
        });

        documents.and(generated).and(copied)
    }
}

/// Replaces the diagrams in `file`, writing the result to `output` or stdout.
pub fn embed(config: &Config, file: &Path, output: Option<&Path>, comment: bool) -> Result<()> {
    let mut content = std::fs::read_to_string(file).chain_with(|| error! {
        "failed to read input",
        "path" => file.display(),
    })?;

    let graphviz = config.graphviz().source_comment(comment);
    let count = graphviz.embed(&mut content).chain_with(|| error! {
        "failed to embed diagrams",
        "path" => file.display(),
    })?;

    tracing::info!(path = %file.display(), diagrams = count, "embedded diagrams");
    match output {
        Some(path) => write_file(path, content),
        None => Ok(std::io::stdout().lock().write_all(content.as_bytes())?),
    }
}
