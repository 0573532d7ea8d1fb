use std::ops::Range;

use memchr::memmem::Finder;
use once_cell::sync::Lazy;

const OPEN: &str = "```dot\n";
const CLOSE: &str = "```";

static OPEN_FINDER: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(OPEN));
static CLOSE_FINDER: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(CLOSE));

/// A fenced `dot` block found in some input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence<'a> {
    /// Byte range of the whole block, markers included.
    pub span: Range<usize>,
    /// The diagram source between the markers, verbatim.
    pub source: &'a str,
}

/// Iterator over the fenced `dot` blocks in a string, in order.
#[derive(Debug, Clone)]
pub struct Fences<'a> {
    input: &'a str,
    cursor: usize,
}

/// Finds every well-formed ```` ```dot ```` block in `input`.
///
/// A block opens with ```` ```dot ```` immediately followed by a newline,
/// anywhere in the text, and closes at the first ```` ``` ```` that leaves at
/// least one byte of source. An opener without a closer ends the search: any
/// later opener would need the same missing closer.
pub fn fences(input: &str) -> Fences<'_> {
    Fences { input, cursor: 0 }
}

impl<'a> Iterator for Fences<'a> {
    type Item = Fence<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();
        let start = self.cursor + OPEN_FINDER.find(bytes.get(self.cursor..)?)?;
        let body = start + OPEN.len();

        // The body is never empty, so the closer search starts one byte in.
        let Some(close) = bytes.get(body + 1..).and_then(|rest| CLOSE_FINDER.find(rest)) else {
            self.cursor = bytes.len();
            return None;
        };

        let body_end = body + 1 + close;
        let end = body_end + CLOSE.len();
        self.cursor = end;

        // Both markers are ASCII, so these are char boundaries.
        let source = self.input.get(body..body_end)?;
        Some(Fence { span: start..end, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(input: &str) -> Vec<&str> {
        fences(input).map(|f| f.source).collect()
    }

    #[test]
    fn finds_nothing_in_plain_text() {
        assert!(sources("just some text\n```rust\nfn main() {}\n```\n").is_empty());
        assert!(sources("").is_empty());
    }

    #[test]
    fn extracts_source_verbatim() {
        let input = "before\n```dot\ndigraph G {\n  A -> B\n}\n```\nafter";
        let fence = fences(input).next().unwrap();

        assert_eq!(fence.source, "digraph G {\n  A -> B\n}\n");
        assert_eq!(&input[fence.span.clone()], "```dot\ndigraph G {\n  A -> B\n}\n```");
    }

    #[test]
    fn finds_blocks_in_order() {
        let input = "```dot\none\n```\ntext\n```dot\ntwo\n```\n```dot\nthree\n```";
        assert_eq!(sources(input), ["one\n", "two\n", "three\n"]);
    }

    #[test]
    fn closer_need_not_start_a_line() {
        assert_eq!(sources("```dot\ndigraph { a }```"), ["digraph { a }"]);
    }

    #[test]
    fn unterminated_block_is_not_a_match() {
        assert!(sources("```dot\ndigraph G { A -> B }\n").is_empty());

        let input = "```dot\nfirst\n```\n```dot\nsecond, never closed\n";
        assert_eq!(sources(input), ["first\n"]);
    }

    #[test]
    fn other_markers_are_ignored() {
        assert!(sources("```dot digraph {}\n```").is_empty());
        assert!(sources("```dot\r\ndigraph {}\r\n```").is_empty());
        assert!(sources("~~~dot\ndigraph {}\n~~~").is_empty());
        assert!(sources("```graphviz\ndigraph {}\n```").is_empty());
    }

    #[test]
    fn empty_body_borrows_the_next_closer() {
        // The body must hold at least one byte, so the closer of an empty
        // block can't close it.
        assert!(sources("```dot\n```").is_empty());
        assert_eq!(sources("```dot\n```\nx\n```"), ["```\nx\n"]);
    }
}
