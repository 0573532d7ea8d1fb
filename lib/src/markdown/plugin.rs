use std::borrow::Cow;

use pulldown_cmark::Event;

use crate::error::Result;

/// A boxed stream of markdown events.
pub type Events<'a> = Box<dyn Iterator<Item = Event<'a>> + 'a>;

/// A stage in a [`Markdown`](crate::markdown::Markdown) pipeline.
///
/// Every plugin gets three chances to act: on the raw text before parsing
/// (`preprocess`), on the parsed event stream (`remap`), and once the HTML
/// has been produced (`finalize`).
pub trait Plugin {
    #[inline(always)]
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(input))
    }

    #[inline(always)]
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        events
    }

    #[inline(always)]
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
