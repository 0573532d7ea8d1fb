use std::collections::VecDeque;
use std::fmt::Write;

use pulldown_cmark::{Event, HeadingLevel, Tag, TagEnd};
use rustc_hash::FxHashMap;

use crate::markdown::{Events, Plugin};
use crate::util::escape_xml;

/// Gives every heading without an explicit id one derived from its text.
///
/// Repeated ids get a `-1`, `-2`, ... suffix in order of appearance.
#[derive(Default)]
pub struct AutoHeading {
    seen: FxHashMap<String, usize>,
}

struct HeadingIterator<'a, 's> {
    stack: VecDeque<Event<'a>>,
    seen: &'s mut FxHashMap<String, usize>,
    inner: Events<'a>,
}

impl<'a> Iterator for HeadingIterator<'a, '_> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => {
                let mut text = String::new();
                loop {
                    let event = self.inner.next()?;
                    if let Event::Text(ref s) | Event::Code(ref s) = event {
                        text.push_str(s);
                    } else if let Event::End(TagEnd::Heading(..)) = event {
                        break;
                    }

                    self.stack.push_back(event);
                }

                let mut id = crate::util::slugify(&text);
                match self.seen.get_mut(&id) {
                    Some(n) => {
                        let _ = write!(&mut id, "-{n}");
                        *n += 1;
                    }
                    None => {
                        self.seen.insert(id.clone(), 1);
                    }
                }

                let tag = Tag::Heading { level, id: Some(id.into()), classes, attrs };
                self.stack.push_back(Event::End(TagEnd::Heading(level)));
                Some(Event::Start(tag))
            },
            event => Some(event)
        }
    }
}

impl Plugin for AutoHeading {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        self.seen.clear();
        Box::new(HeadingIterator {
            seen: &mut self.seen,
            inner: events,
            stack: VecDeque::with_capacity(4),
        })
    }
}

/// Prepends a link to itself inside every `h1` through `h4` that has an id:
///
/// ```html
/// <h2 id="usage"><a class="link" href="#usage" aria-label="usage">🔗</a>Usage</h2>
/// ```
#[derive(Default)]
pub struct HeadingAnchor;

struct AnchorIterator<'a> {
    pending: Option<String>,
    inner: Events<'a>,
}

impl<'a> Iterator for AnchorIterator<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(id) = self.pending.take() {
            let html = format!(r##"<a class="link" href="#{id}" aria-label="{id}">🔗</a>"##);
            return Some(Event::Html(html.into()));
        }

        let event = self.inner.next()?;
        if let Event::Start(Tag::Heading { level, id: Some(ref id), .. }) = event {
            if level <= HeadingLevel::H4 {
                self.pending = Some(escape_xml(id).into_owned());
            }
        }

        Some(event)
    }
}

impl Plugin for HeadingAnchor {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        Box::new(AnchorIterator { inner: events, pending: None })
    }
}
