#![doc = svgbobdoc::transform!(
//! Plugins for static site generators.
//!
//! # Overview
//!
//! Plumage is a small collection of content transformations meant to be
//! hooked into a static site generator's build:
//!
//!   * [`diagram`]: replaces fenced `dot` code blocks with inline SVG images
//!     rendered by Graphviz and embedded as base64 data URIs.
//!   * [`markdown`]: a markdown-to-HTML pipeline driven by [`markdown::Plugin`]s,
//!     including automatic heading ids and heading anchor links.
//!   * [`site`]: a minimal host model: documents, lifecycle hooks, generators,
//!     and an Atom feed generator.
//!
//! A post typically flows through the following stages:
//!
//! ```svgbob
//!  +----------+   +-------------+   +------------+   +-------------+
//!  | Document |-->| pre_render  |-->|  Markdown  |-->| post_render |
//!  +----------+   |   hooks     |   |  pipeline  |   |    hooks    |
//!                 +------+------+   +------------+   +-------------+
//!                        |
//!                 +------+------+      +-------+
//!                 |  Graphviz   |----->|  dot  |
//!                 +-------------+      +-------+
//! ```
//!
//! The [`diagram::Graphviz`] embedder is registered against the `pre_render`
//! event for posts. For every block of the form
//!
//! ````text
//! ```dot
//! digraph G { A -> B }
//! ```
//! ````
//!
//! it runs `dot -Tsvg`, strips the XML prologue, and splices in:
//!
//! ```text
//! <div align="center">
//! <!--
//! digraph G { A -> B }
//! -->
//!   <img src="data:image/svg+xml;base64,..." />
//! </div>
//! ```
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod diagram;
pub mod markdown;
pub mod site;

pub use rayon;
