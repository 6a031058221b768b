//! Normalization of free-text note content into embeddable markup.
//!
//! Archivists enter notes as a mix of plain text, blank-line separated
//! paragraphs and inline EAD markup. Before a value can be written into the
//! finding aid it goes through three steps:
//!
//! 1. **Cleanup**: `<br>` is made self-closing; the BHL variant also folds
//!    smart quotes to ASCII.
//! 2. **Paragraph handling** per [`ParagraphMode`].
//! 3. **Classification**: content containing any tag is passed through as a
//!    raw fragment, everything else is written as escaped text.
//!
//! Paragraph wrapping is checked with [`check_markup`]; when wrapping would
//! produce markup that is not well formed the unwrapped content is used
//! instead.

mod validate;

pub use validate::{Diagnostic, check_markup, has_bare_ampersand};

use crate::util::is_xml_forbidden;

/// How `<p>` tags are treated for a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphMode {
    /// Split blank-line separated blocks into `<p>` elements.
    Wrap,
    /// Remove `<p>`, `</p>` and `<p/>` substrings.
    Strip,
    /// Leave content untouched (list items).
    Preserve,
}

impl ParagraphMode {
    pub fn wrap_if(include_p: bool) -> Self {
        if include_p {
            ParagraphMode::Wrap
        } else {
            ParagraphMode::Strip
        }
    }
}

/// Result of sanitizing one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanitized {
    /// Content with markup, to be inserted verbatim.
    Markup(String),
    /// Plain text, to be escaped on output.
    Text(String),
    /// Text that cannot be written as a text node.
    CData(String),
}

/// Content sanitizer. Two variants exist: the one the host's stock exporter
/// uses, and the BHL one with quote folding and ampersand repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    fold_smart_quotes: bool,
    repair_ampersands: bool,
    /// Archon exports used `\n\t` as a paragraph break.
    tab_breaks: bool,
}

impl Sanitizer {
    pub const fn standard() -> Self {
        Self {
            fold_smart_quotes: false,
            repair_ampersands: false,
            tab_breaks: false,
        }
    }

    pub const fn bhl() -> Self {
        Self {
            fold_smart_quotes: true,
            repair_ampersands: true,
            tab_breaks: true,
        }
    }

    /// Run all three steps on `content`.
    pub fn sanitize(&self, content: &str, mode: ParagraphMode) -> Sanitized {
        let content = self.paragraphs(content, mode);

        if has_markup(&content) {
            return Sanitized::Markup(content);
        }

        let text = content.replace("&amp;", "&");
        if text.chars().any(is_xml_forbidden) {
            tracing::debug!("content has characters not allowed in text nodes, using CDATA");
            return Sanitized::CData(text);
        }
        Sanitized::Text(text)
    }

    /// Cleanup and paragraph handling, without classification.
    pub fn paragraphs(&self, content: &str, mode: ParagraphMode) -> String {
        let content = if self.fold_smart_quotes {
            fold_smart_quotes(content)
        } else {
            content.to_string()
        };
        let content = self_close_breaks(&content);

        match mode {
            ParagraphMode::Preserve => content,
            ParagraphMode::Strip => strip_paragraphs(&content),
            ParagraphMode::Wrap => self.wrap_paragraphs(content),
        }
    }

    fn wrap_paragraphs(&self, content: String) -> String {
        let content = if self.tab_breaks {
            content.replace("\n\t", "\n\n")
        } else {
            content
        };

        let Some(mut wrapped) = wrap_blocks(&content) else {
            return content;
        };

        if self.repair_ampersands && has_bare_ampersand(&wrapped) {
            wrapped = wrapped.replace("& ", "&amp; ");
        }

        let problems = check_markup(&wrapped);
        if problems.is_empty() {
            wrapped
        } else {
            tracing::debug!(?problems, "paragraph wrapping produced invalid markup, keeping original");
            content
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::bhl()
    }
}

/// Wrap blank-line separated blocks in `<p>` tags.
///
/// Returns `None` when the content is empty or already starts with a
/// paragraph.
fn wrap_blocks(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() || starts_with_paragraph(trimmed) {
        return None;
    }

    let blocks: Vec<&str> = content
        .split("\n\n")
        .filter(|b| !b.trim().is_empty())
        .collect();

    if blocks.len() > 1 {
        let mut out = String::with_capacity(content.len() + blocks.len() * 7);
        for block in blocks {
            out.push_str("<p>");
            out.push_str(chomp(block));
            out.push_str("</p>");
        }
        Some(out)
    } else {
        Some(format!("<p>{trimmed}</p>"))
    }
}

fn starts_with_paragraph(s: &str) -> bool {
    s.strip_prefix("<p")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_whitespace() || c == '/' || c == '>')
}

/// Remove one trailing line ending.
fn chomp(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .or_else(|| s.strip_suffix('\r'))
        .unwrap_or(s)
}

/// Remove paragraph tags by literal substring match.
///
/// This is not tag-aware: `<p>` inside an attribute value is removed too,
/// and `<p class="x">` is left alone.
pub fn strip_paragraphs(content: &str) -> String {
    content.replace("<p>", "").replace("</p>", "").replace("<p/>", "")
}

/// Make line breaks self-closing.
pub fn self_close_breaks(content: &str) -> String {
    content.replace("<br>", "<br/>").replace("</br>", "")
}

/// Replace curly double and single quotes with ASCII quotes.
pub fn fold_smart_quotes(content: &str) -> String {
    content
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            c => c,
        })
        .collect()
}

/// True if the content contains anything that looks like a tag.
pub fn has_markup(content: &str) -> bool {
    let bytes = content.as_bytes();
    memchr::memchr(b'<', bytes)
        .is_some_and(|start| memchr::memchr(b'>', &bytes[start + 1..]).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BHL: Sanitizer = Sanitizer::bhl();
    const STD: Sanitizer = Sanitizer::standard();

    #[test]
    fn test_wrap_multiple_blocks() {
        assert_eq!(
            BHL.paragraphs("First block.\n\nSecond block.", ParagraphMode::Wrap),
            "<p>First block.</p><p>Second block.</p>"
        );
    }

    #[test]
    fn test_wrap_single_block_is_trimmed() {
        assert_eq!(
            BHL.paragraphs("  One paragraph.\n", ParagraphMode::Wrap),
            "<p>One paragraph.</p>"
        );
    }

    #[test]
    fn test_wrap_leaves_existing_paragraphs() {
        let content = "<p>Already</p>\n\n<p>wrapped</p>";
        assert_eq!(BHL.paragraphs(content, ParagraphMode::Wrap), content);
        assert_eq!(
            BHL.paragraphs("<p class=\"x\">a</p>", ParagraphMode::Wrap),
            "<p class=\"x\">a</p>"
        );
    }

    #[test]
    fn test_wrap_empty() {
        assert_eq!(BHL.paragraphs("", ParagraphMode::Wrap), "");
        assert_eq!(BHL.paragraphs("   ", ParagraphMode::Wrap), "   ");
    }

    #[test]
    fn test_wrap_does_not_match_other_p_tags() {
        // <persname> starts with "<p" but is not a paragraph
        assert_eq!(
            BHL.paragraphs("<persname>Smith</persname>", ParagraphMode::Wrap),
            "<p><persname>Smith</persname></p>"
        );
    }

    #[test]
    fn test_wrap_repairs_bare_ampersand() {
        assert_eq!(
            BHL.paragraphs("Smith & Sons", ParagraphMode::Wrap),
            "<p>Smith &amp; Sons</p>"
        );
        // Without repair the wrapped form is invalid, so the original is kept
        assert_eq!(
            STD.paragraphs("Smith & Sons", ParagraphMode::Wrap),
            "Smith & Sons"
        );
    }

    #[test]
    fn test_wrap_falls_back_on_invalid_markup() {
        let content = "Broken <emph>markup";
        assert_eq!(BHL.paragraphs(content, ParagraphMode::Wrap), content);
    }

    #[test]
    fn test_tab_breaks() {
        assert_eq!(
            BHL.paragraphs("One\n\tTwo", ParagraphMode::Wrap),
            "<p>One</p><p>Two</p>"
        );
        assert_eq!(
            STD.paragraphs("One\n\tTwo", ParagraphMode::Wrap),
            "<p>One\n\tTwo</p>"
        );
    }

    #[test]
    fn test_strip_is_literal() {
        assert_eq!(
            strip_paragraphs("<p>One</p><p/>Two"),
            "OneTwo"
        );
        assert_eq!(
            strip_paragraphs("<p class=\"x\">kept</p>"),
            "<p class=\"x\">kept"
        );
    }

    #[test]
    fn test_preserve() {
        assert_eq!(
            BHL.paragraphs("<p>x</p>\n\ny", ParagraphMode::Preserve),
            "<p>x</p>\n\ny"
        );
    }

    #[test]
    fn test_breaks_self_close() {
        assert_eq!(self_close_breaks("a<br>b</br>c"), "a<br/>bc");
    }

    #[test]
    fn test_smart_quotes() {
        assert_eq!(
            BHL.paragraphs("\u{201C}Hail\u{201D} to the Victors\u{2019}", ParagraphMode::Strip),
            "\"Hail\" to the Victors'"
        );
        assert_eq!(
            STD.paragraphs("\u{201C}x\u{201D}", ParagraphMode::Strip),
            "\u{201C}x\u{201D}"
        );
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            BHL.sanitize("Plain", ParagraphMode::Strip),
            Sanitized::Text("Plain".into())
        );
        assert_eq!(
            BHL.sanitize("Letters &amp; diaries", ParagraphMode::Strip),
            Sanitized::Text("Letters & diaries".into())
        );
        assert_eq!(
            BHL.sanitize("Plain", ParagraphMode::Wrap),
            Sanitized::Markup("<p>Plain</p>".into())
        );
        assert_eq!(
            BHL.sanitize("bad\u{1}char", ParagraphMode::Strip),
            Sanitized::CData("bad\u{1}char".into())
        );
    }

    #[test]
    fn test_has_markup() {
        assert!(has_markup("a <emph>b</emph>"));
        assert!(has_markup("<lb/>"));
        assert!(!has_markup("1 < 2"));
        assert!(!has_markup("2 > 1"));
    }
}
