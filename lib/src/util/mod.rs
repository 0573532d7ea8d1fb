use std::borrow::Cow;

/// Convert spaces to hyphens. Remove characters that aren't alphanumerics,
/// underscores, or hyphens. Convert to lowercase. Also strip leading and
/// trailing whitespace.
pub fn slugify(string: &str) -> String {
    let mut output = String::with_capacity(string.len());

    let mut need_dash = false;
    for ch in string.chars() {
        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => {
                    if need_dash {
                        output.push('-');
                        need_dash = false;
                    }

                    output.push(b.to_ascii_lowercase() as char);
                }
                _ => {
                    // All runs of characters that aren't alphanumeric or `_`
                    // collapse into a single `-`.
                    need_dash = !output.is_empty();
                }
            }
        }
    }

    output
}

/// Escapes the five characters that are special in XML and HTML attribute
/// values. Borrows `string` when there is nothing to escape.
pub fn escape_xml(string: &str) -> Cow<'_, str> {
    let special = |c: char| matches!(c, '&' | '<' | '>' | '"' | '\'');
    let Some(first) = string.find(special) else {
        return Cow::Borrowed(string);
    };

    let mut output = String::with_capacity(string.len() + 16);
    output.push_str(&string[..first]);
    for ch in string[first..].chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            _ => output.push(ch),
        }
    }

    Cow::Owned(output)
}

/// The 1-based line number of byte `offset` in `input`.
pub fn line_number(input: &str, offset: usize) -> usize {
    let offset = offset.min(input.len());
    memchr::memchr_iter(b'\n', &input.as_bytes()[..offset]).count() + 1
}

/// Removes all whitespace that directly follows a `>`, which closes an XML
/// tag, or a `}`, which closes a template tag.
///
/// ```
/// use plumage::util::minify;
///
/// assert_eq!(minify("<a>\n  <b>{{ x }}\n</b>\n"), "<a><b>{{ x }}</b>");
/// assert_eq!(minify("a b  c"), "a b  c");
/// ```
pub fn minify(template: &str) -> String {
    let mut output = String::with_capacity(template.len());
    let mut skipping = false;
    for ch in template.chars() {
        if skipping && ch.is_whitespace() {
            continue;
        }

        skipping = ch == '>' || ch == '}';
        output.push(ch);
    }

    output
}
