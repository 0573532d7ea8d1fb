//! A pluggable markdown-to-HTML pipeline.

mod plugin;
mod markdown;
mod heading;

pub use plugin::{Events, Plugin};
pub use markdown::Markdown;
pub use heading::{AutoHeading, HeadingAnchor};
