use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// The markup that replaces a fenced diagram.
///
/// Rendered via `Display`. The image is inlined as a `data:` URI using the
/// standard base64 alphabet, padded and unwrapped, so the fragment is self
/// contained.
#[derive(Debug, Clone, Copy)]
pub struct Embed<'a> {
    /// The diagram source, kept as an HTML comment when `comment` is set.
    pub source: &'a str,
    /// The SVG document, without its XML prologue.
    pub svg: &'a [u8],
    pub comment: bool,
}

impl fmt::Display for Embed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = STANDARD.encode(self.svg);
        if !self.comment {
            return write!(f, r#"<div align="center"><img src="data:image/svg+xml;base64,{payload}" /></div>"#);
        }

        writeln!(f, r#"<div align="center">"#)?;
        writeln!(f, "<!--\n{}\n-->", CommentSafe(self.source.trim()))?;
        writeln!(f, r#"  <img src="data:image/svg+xml;base64,{payload}" />"#)?;
        write!(f, "</div>")
    }
}

/// Writes a string such that it can't terminate an HTML comment, dropping
/// blank lines. A blank line would end the enclosing markdown HTML block and
/// leave the comment open.
struct CommentSafe<'a>(&'a str);

impl fmt::Display for CommentSafe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.0.lines().filter(|line| !line.trim().is_empty());
        for (i, mut rest) in lines.enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }

            while let Some(at) = memchr::memmem::find(rest.as_bytes(), b"-->") {
                write!(f, "{}--&gt;", &rest[..at])?;
                rest = &rest[at + 3..];
            }

            f.write_str(rest)?;
        }

        Ok(())
    }
}

/// Renders the replacement markup for `source` given its rendered `svg`.
pub fn embed_fragment(source: &str, svg: &[u8], comment: bool) -> String {
    Embed { source, svg, comment }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_fragment() {
        let html = embed_fragment("digraph G { A -> B }", b"<svg/>", false);
        assert_eq!(html, r#"<div align="center"><img src="data:image/svg+xml;base64,PHN2Zy8+" /></div>"#);
    }

    #[test]
    fn commented_fragment() {
        let html = embed_fragment("\ndigraph G { A -> B }\n", b"<svg/>", true);
        assert_eq!(html, concat!(
            "<div align=\"center\">\n",
            "<!--\n",
            "digraph G { A -> B }\n",
            "-->\n",
            "  <img src=\"data:image/svg+xml;base64,PHN2Zy8+\" />\n",
            "</div>",
        ));
    }

    #[test]
    fn comment_cannot_be_closed_by_source() {
        let html = embed_fragment("a --> b; c -> d", b"<svg/>", true);
        assert!(html.contains("a --&gt; b; c -> d"));
        assert_eq!(html.matches("-->").count(), 1);
    }

    #[test]
    fn comment_has_no_blank_lines() {
        let html = embed_fragment("digraph {\n  a -> b\n\n   \r\n  b -> c\n}", b"<svg/>", true);
        assert!(html.contains("<!--\ndigraph {\n  a -> b\n  b -> c\n}\n-->"));
        assert!(!html.lines().any(|line| line.trim().is_empty()));
    }

    #[test]
    fn payload_is_unwrapped() {
        let svg = vec![b'x'; 4096];
        let html = embed_fragment("graph {}", &svg, false);
        assert!(!html.contains('\n'));

        let payload = html.split("base64,").nth(1).unwrap().split('"').next().unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), svg);
    }
}
