//! Text sanitization before speech synthesis
//!
//! Model output is written for screens: emphasis markers, heading markers,
//! code fences, link syntax. None of that should be read aloud. This module
//! strips the markup, keeps the prose, and normalizes whitespace so the TTS
//! provider receives clean sentences.

/// Strip markup from model output and normalize whitespace.
///
/// Removed: `**`/`__`/`*`/`_`/`~~` emphasis markers, leading `#` heading
/// markers, fence lines and backticks (code content is kept), `[label](url)`
/// link syntax (the label text is kept, the URL dropped), standalone
/// parenthesized URLs, and double-quotation glyphs (`"`, curly doubles,
/// guillemets). Apostrophes, ordinary punctuation, digits, and non-Latin
/// scripts pass through unchanged. All whitespace runs collapse to a single
/// space and the result is trimmed.
///
/// Total on any input (the empty string maps to itself) and idempotent:
/// `sanitize(sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(text: &str) -> String {
    // Stripping one layer can expose markup underneath it (emphasis around
    // a heading marker, a glyph inside a parenthesized URL), so the pass
    // repeats until the text stops changing. Every pass only deletes, so
    // the loop terminates.
    let mut current = sanitize_pass(text);
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One pass of fence, heading, link, and glyph stripping
fn sanitize_pass(text: &str) -> String {
    let mut prose = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();

        // Fence lines toggle code-block state and are dropped; the code
        // content between them is kept as plain text.
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            prose.push(' ');
            continue;
        }

        let line = if in_fence {
            line
        } else {
            strip_heading_marker(line)
        };

        prose.push_str(&strip_inline(line));
        prose.push(' ');
    }

    collapse_whitespace(&prose)
}

/// Drop a leading `#`-run heading marker, if present
fn strip_heading_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes > 0 {
        match trimmed[hashes..].strip_prefix(' ') {
            Some(rest) => rest,
            None if trimmed.len() == hashes => "",
            None => trimmed,
        }
    } else {
        line
    }
}

/// Strip inline markup from a single line
fn strip_inline(line: &str) -> String {
    let line = strip_links(line);

    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' | '`' | '_' => {}
            '~' if chars.peek() == Some(&'~') => {
                chars.next();
            }
            '"' | '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}'
            | '\u{00BB}' | '\u{2039}' | '\u{203A}' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Replace `[label](url)` with `label`, drop standalone bracketed labels'
/// brackets, and drop standalone parenthesized URLs
fn strip_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut remaining = line;

    loop {
        let bracket = remaining.find('[');
        let paren_url = find_paren_url(remaining);

        match (bracket, paren_url) {
            (Some(b), Some((start, end))) if start < b => {
                out.push_str(&remaining[..start]);
                remaining = &remaining[end..];
            }
            (Some(b), _) => {
                out.push_str(&remaining[..b]);
                let after = &remaining[b + 1..];
                let Some(close) = after.find(']') else {
                    out.push('[');
                    remaining = after;
                    continue;
                };
                out.push_str(&after[..close]);
                let mut rest = &after[close + 1..];
                // Drop a directly attached (url) if present
                if rest.starts_with('(') {
                    if let Some(paren_close) = rest.find(')') {
                        rest = &rest[paren_close + 1..];
                    }
                }
                remaining = rest;
            }
            (None, Some((start, end))) => {
                out.push_str(&remaining[..start]);
                remaining = &remaining[end..];
            }
            (None, None) => {
                out.push_str(remaining);
                return out;
            }
        }
    }
}

/// Locate a `(http...)` parenthetical, returning its byte range
fn find_paren_url(text: &str) -> Option<(usize, usize)> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('(') {
        let start = search_from + rel;
        let inner = &text[start + 1..];
        if inner.starts_with("http://") || inner.starts_with("https://") {
            if let Some(close) = inner.find(')') {
                return Some((start, start + 1 + close + 1));
            }
        }
        search_from = start + 1;
    }
    None
}

/// Collapse whitespace runs to single spaces and trim
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bold_and_italic() {
        assert_eq!(sanitize("**Hello**, *world*!"), "Hello, world!");
        assert_eq!(sanitize("__deep__ and _shallow_"), "deep and shallow");
    }

    #[test]
    fn strips_heading_markers() {
        assert_eq!(sanitize("# Title\nBody text"), "Title Body text");
        assert_eq!(sanitize("### Deep heading"), "Deep heading");
    }

    #[test]
    fn keeps_code_content_drops_fences() {
        assert_eq!(sanitize("```rust\nlet x = 1;\n```"), "let x = 1;");
        assert_eq!(sanitize("run `cargo test` now"), "run cargo test now");
    }

    #[test]
    fn keeps_link_label_drops_url() {
        assert_eq!(
            sanitize("see [the docs](https://example.com/docs) for more"),
            "see the docs for more"
        );
    }

    #[test]
    fn drops_bare_parenthesized_url() {
        assert_eq!(sanitize("source (https://example.com) cited"), "source cited");
    }

    #[test]
    fn keeps_ordinary_parenthetical() {
        assert_eq!(sanitize("a phrase (an aside) here"), "a phrase (an aside) here");
    }

    #[test]
    fn strips_quotation_glyphs() {
        assert_eq!(sanitize("she said \u{201C}hi\u{201D} twice"), "she said hi twice");
        assert_eq!(sanitize("\"quoted\" text"), "quoted text");
    }

    #[test]
    fn keeps_apostrophes_digits_punctuation() {
        assert_eq!(sanitize("don't count 42, okay?"), "don't count 42, okay?");
    }

    #[test]
    fn keeps_non_latin_scripts() {
        assert_eq!(sanitize("**Привіт**, світе!"), "Привіт, світе!");
        assert_eq!(sanitize("こんにちは *世界*"), "こんにちは 世界");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(sanitize("  a \n\n  b\t c  "), "a b c");
    }

    #[test]
    fn empty_input_maps_to_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n  "), "");
    }

    #[test]
    fn strips_markup_layered_under_markup() {
        // Emphasis hiding a heading marker, and a glyph hiding a
        // parenthesized URL, both come off in one call.
        assert_eq!(sanitize("*# hi*"), "hi");
        assert_eq!(sanitize("(*https://a.b)"), "");
        assert_eq!(sanitize("before (*https://a.b) after"), "before after");
    }

    #[test]
    fn idempotent_on_varied_inputs() {
        let inputs = [
            "**Hello**, *world*!",
            "# Heading\n```py\nx = [1](2)\n```",
            "mixed [label](https://a.b) and (https://c.d) and \u{00AB}quotes\u{00BB}",
            "plain text stays plain",
            "unmatched [bracket and *star",
            "*# hi*",
            "(*https://a.b)",
            "[# label](https://a.b)",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn never_longer_than_input() {
        let inputs = ["**a**", "a  b", "# h", "[x](https://y)", "plain"];
        for input in inputs {
            assert!(sanitize(input).chars().count() <= input.chars().count());
        }
    }
}
