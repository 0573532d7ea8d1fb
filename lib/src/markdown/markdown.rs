use std::borrow::Cow;

use pulldown_cmark::{html, Options, Parser};

use crate::markdown::{Events, Plugin};
use crate::error::{Chainable, Result};

/// Renders markdown to HTML through a chain of [`Plugin`]s.
///
/// Plugins run in the order they're added, both when preprocessing the text
/// and when remapping the event stream.
pub struct Markdown<'p> {
    input: &'p str,
    options: Options,
    plugins: Vec<Box<dyn Plugin + Send + 'p>>,
}

impl<'p> Markdown<'p> {
    pub fn from(input: &'p str) -> Self {
        Markdown {
            input,
            options: Options::all().difference(Options::ENABLE_SMART_PUNCTUATION),
            plugins: vec![],
        }
    }

    pub fn plugin<T: Plugin + Send + 'p>(mut self, plugin: T) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn run(mut self) -> Result<String> {
        let mut input = Cow::Borrowed(self.input);
        for plugin in &self.plugins {
            input = match input {
                Cow::Borrowed(input) => plugin.preprocess(input)?,
                Cow::Owned(input) => {
                    let replaced = match plugin.preprocess(&input)? {
                        Cow::Borrowed(s) if s.as_ptr() == input.as_ptr() && s.len() == input.len() => None,
                        output => Some(output.into_owned()),
                    };

                    Cow::Owned(replaced.unwrap_or(input))
                }
            };
        }

        let mut events: Events<'_> = Box::new(Parser::new_ext(&input, self.options));
        for plugin in self.plugins.iter_mut() {
            events = plugin.remap(events);
        }

        let mut output = String::with_capacity(input.len() * 3 / 2);
        html::push_html(&mut output, events);

        for plugin in self.plugins.iter_mut() {
            plugin.finalize().chain(error!("markdown plugin failed"))?;
        }

        Ok(output)
    }
}
