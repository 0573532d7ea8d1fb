//! Inline Graphviz diagrams.
//!
//! [`Graphviz`] finds fenced `dot` blocks, renders each with a
//! [`DiagramRenderer`] (by default [`Dot`], which shells out to Graphviz), and
//! replaces the block with a self-contained `<img>` whose source is a base64
//! `data:` URI. See [`Embed`] for the exact markup.
//!
//! Rendering failures are errors: a missing `dot`, a non-zero exit, a timeout,
//! or an empty image all abort the transformation and leave the content as it
//! was. Blocks that aren't well formed are not errors; they're simply left in
//! place.

mod dot;
mod embed;
mod fence;

use std::borrow::Cow;
use std::sync::Arc;

use rayon::prelude::*;

pub use dot::{DiagramRenderer, Dot, skip_lines};
pub use embed::{Embed, embed_fragment};
pub use fence::{Fence, Fences, fences};

use crate::error::{Chainable, Result};
use crate::markdown::Plugin;
use crate::site::{Document, Event, Hooks, Owner};
use crate::util::line_number;

/// Replaces fenced `dot` blocks with embedded SVG images.
#[derive(Debug, Clone)]
pub struct Graphviz<R = Dot> {
    renderer: R,
    comment: bool,
    parallel: bool,
}

impl Default for Graphviz<Dot> {
    fn default() -> Self {
        Graphviz::new(Dot::default())
    }
}

impl<R: DiagramRenderer> Graphviz<R> {
    pub fn new(renderer: R) -> Self {
        Graphviz { renderer, comment: true, parallel: true }
    }

    /// Whether to keep each diagram's source as an HTML comment next to the
    /// image. Enabled by default.
    pub fn source_comment(mut self, enabled: bool) -> Self {
        self.comment = enabled;
        self
    }

    /// Whether to render the blocks of one input concurrently. Enabled by
    /// default.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn render_fence(&self, input: &str, fence: &Fence<'_>) -> Result<String> {
        let svg = self.renderer.render(fence.source).chain_with(|| error! {
            "failed to render diagram",
            "line" => line_number(input, fence.span.start),
        })?;

        tracing::debug!(line = line_number(input, fence.span.start), bytes = svg.len(), "embedding diagram");
        Ok(embed_fragment(fence.source, &svg, self.comment))
    }

    /// Returns `input` with every diagram block replaced.
    ///
    /// Borrows `input` when it contains no diagram blocks. Blocks are all
    /// rendered before any output is assembled; the first failing block, in
    /// input order, is returned as the error.
    pub fn transform<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        self.splice(input).map(|(output, _)| output)
    }

    /// Replaces every diagram block in `content` in place, returning the
    /// number of blocks embedded. On error, `content` is unchanged.
    pub fn embed(&self, content: &mut String) -> Result<usize> {
        let (output, count) = match self.splice(content)? {
            (Cow::Owned(output), count) => (output, count),
            (Cow::Borrowed(_), _) => return Ok(0),
        };

        *content = output;
        Ok(count)
    }

    fn splice<'a>(&self, input: &'a str) -> Result<(Cow<'a, str>, usize)> {
        let fences: Vec<Fence<'a>> = fences(input).collect();
        if fences.is_empty() {
            return Ok((Cow::Borrowed(input), 0));
        }

        let rendered: Vec<Result<String>> = if self.parallel && fences.len() > 1 {
            fences.par_iter().map(|f| self.render_fence(input, f)).collect()
        } else {
            fences.iter().map(|f| self.render_fence(input, f)).collect()
        };

        let mut output = String::with_capacity(input.len());
        let mut cursor = 0;
        for (fence, fragment) in fences.iter().zip(rendered) {
            output.push_str(&input[cursor..fence.span.start]);
            output.push_str(&fragment?);
            cursor = fence.span.end;
        }

        output.push_str(&input[cursor..]);
        Ok((Cow::Owned(output), fences.len()))
    }
}

impl<R: DiagramRenderer + 'static> Graphviz<R> {
    /// Registers `self` to run on every post before it is rendered.
    pub fn register(self, hooks: &mut Hooks) {
        let graphviz = Arc::new(self);
        hooks.register(Owner::Posts, Event::PreRender, move |doc: &mut Document| {
            let n = graphviz.embed(&mut doc.content)?;
            if n > 0 {
                tracing::debug!(path = %doc.path.display(), diagrams = n, "embedded diagrams");
            }

            Ok(())
        });
    }
}

impl<R: DiagramRenderer> Plugin for Graphviz<R> {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        self.transform(input)
    }
}
