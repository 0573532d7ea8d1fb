use std::fmt;

use derive_more::Debug;
use rustc_hash::FxHashMap;

use crate::error::{Chainable, Result};
use crate::site::Document;

/// The kind of document a hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    Posts,
    Pages,
}

/// A point in a document's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    /// After the document is read, before its content is rendered to HTML.
    PreRender,
    /// After the document's `output` is set.
    PostRender,
}

pub type Hook = Box<dyn Fn(&mut Document) -> Result<()> + Send + Sync>;

/// Callbacks keyed by document kind and lifecycle event.
///
/// Hooks for the same key run in registration order.
#[derive(Default, Debug)]
pub struct Hooks {
    #[debug(ignore)]
    hooks: FxHashMap<(Owner, Event), Vec<Hook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Hooks::default()
    }

    pub fn register<F>(&mut self, owner: Owner, event: Event, hook: F) -> &mut Self
        where F: Fn(&mut Document) -> Result<()> + Send + Sync + 'static
    {
        self.hooks.entry((owner, event)).or_default().push(Box::new(hook));
        self
    }

    pub fn len(&self, owner: Owner, event: Event) -> usize {
        self.hooks.get(&(owner, event)).map_or(0, |hooks| hooks.len())
    }

    /// Runs the hooks for `(owner, event)` on `doc`, stopping at the first
    /// failure.
    pub fn trigger(&self, owner: Owner, event: Event, doc: &mut Document) -> Result<()> {
        let Some(hooks) = self.hooks.get(&(owner, event)) else {
            return Ok(());
        };

        for hook in hooks {
            hook(doc).chain_with(|| error! {
                "document hook failed",
                "event" => event,
                "document" => doc.path.display(),
            })?;
        }

        Ok(())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Posts => f.write_str("posts"),
            Owner::Pages => f.write_str("pages"),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::PreRender => f.write_str("pre_render"),
            Event::PostRender => f.write_str("post_render"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(Owner::Posts, "_posts/2020-02-02-x.md", "body").unwrap()
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let mut hooks = Hooks::new();
        hooks.register(Owner::Posts, Event::PreRender, |d| Ok(d.content.push('1')))
            .register(Owner::Posts, Event::PreRender, |d| Ok(d.content.push('2')))
            .register(Owner::Posts, Event::PostRender, |d| Ok(d.content.push('3')));

        let mut doc = doc();
        hooks.trigger(Owner::Posts, Event::PreRender, &mut doc).unwrap();
        assert_eq!(doc.content, "body12");
        assert_eq!(hooks.len(Owner::Posts, Event::PreRender), 2);
        assert_eq!(hooks.len(Owner::Pages, Event::PreRender), 0);
    }

    #[test]
    fn first_failure_stops_the_chain() {
        let mut hooks = Hooks::new();
        hooks.register(Owner::Posts, Event::PreRender, |_| err!("nope"))
            .register(Owner::Posts, Event::PreRender, |d| Ok(d.content.clear()));

        let mut doc = doc();
        let error = hooks.trigger(Owner::Posts, Event::PreRender, &mut doc).unwrap_err();
        assert_eq!(doc.content, "body");
        assert_eq!(error.message(), "document hook failed");
        assert!(error.mentions("pre_render"));
        assert!(error.mentions("nope"));
    }
}
