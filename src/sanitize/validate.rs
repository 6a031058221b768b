//! Well-formedness checks for candidate markup fragments.
//!
//! Fragments are checked as the children of a pseudo root element, the same
//! way they will sit inside the element the serializer wraps them in. Entity
//! and character references are checked by a dedicated scan so the
//! sanitizer can react to one specific problem (a bare `&`) without treating
//! every diagnostic the same.

use quick_xml::Reader;
use quick_xml::events::Event;

/// A problem found in a candidate fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `&` not followed by an entity name, e.g. `Smith & Sons`.
    BareAmpersand { offset: usize },
    /// A reference that never reaches its `;`.
    UnterminatedReference { offset: usize },
    /// A well-formed reference to an entity XML does not predefine.
    UndefinedEntity(String),
    /// Tag structure problems reported by the XML reader.
    Malformed(String),
}

const PREDEFINED: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Check `content` and return every problem found.
pub fn check_markup(content: &str) -> Vec<Diagnostic> {
    let mut diagnostics = check_references(content);
    if let Some(problem) = check_structure(content) {
        diagnostics.push(problem);
    }
    diagnostics
}

/// True if `content` contains a bare ampersand.
pub fn has_bare_ampersand(content: &str) -> bool {
    check_references(content)
        .iter()
        .any(|d| matches!(d, Diagnostic::BareAmpersand { .. }))
}

fn check_references(content: &str) -> Vec<Diagnostic> {
    let bytes = content.as_bytes();
    let mut diagnostics = Vec::new();

    for offset in memchr::memchr_iter(b'&', bytes) {
        let rest = &bytes[offset + 1..];
        match rest.first() {
            Some(b'#') => {
                let digits = &rest[1..];
                let (hex, digits) = match digits.first() {
                    Some(b'x') => (true, &digits[1..]),
                    _ => (false, digits),
                };
                let len = digits
                    .iter()
                    .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
                    .count();
                if len == 0 || digits.get(len) != Some(&b';') {
                    diagnostics.push(Diagnostic::UnterminatedReference { offset });
                }
            }
            Some(&b) if is_name_start(b) => {
                let len = rest.iter().take_while(|&&b| is_name_char(b)).count();
                if rest.get(len) != Some(&b';') {
                    diagnostics.push(Diagnostic::UnterminatedReference { offset });
                    continue;
                }
                let name = String::from_utf8_lossy(&rest[..len]);
                if !PREDEFINED.contains(&name.as_ref()) {
                    diagnostics.push(Diagnostic::UndefinedEntity(name.into_owned()));
                }
            }
            _ => diagnostics.push(Diagnostic::BareAmpersand { offset }),
        }
    }

    diagnostics
}

fn check_structure(content: &str) -> Option<Diagnostic> {
    // References were checked above; neutralize them so the reader only
    // reports tag structure.
    let doc = format!("<wrap>{}</wrap>", content.replace('&', "&amp;"));
    let mut reader = Reader::from_str(&doc);
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                for attr in e.attributes() {
                    if let Err(err) = attr {
                        return Some(Diagnostic::Malformed(err.to_string()));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                for attr in e.attributes() {
                    if let Err(err) = attr {
                        return Some(Diagnostic::Malformed(err.to_string()));
                    }
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return Some(Diagnostic::Malformed("unmatched end tag".into()));
                }
                depth -= 1;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Some(Diagnostic::Malformed(err.to_string())),
        }
    }

    if depth != 0 {
        return Some(Diagnostic::Malformed("unclosed element".into()));
    }
    None
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_markup() {
        assert!(check_markup("<p>Letters &amp; diaries</p>").is_empty());
        assert!(check_markup("<p>See <emph render=\"italic\">Ann Arbor</emph>.</p>").is_empty());
        assert!(check_markup("plain text").is_empty());
        assert!(check_markup("caf&#233; &#x2014;").is_empty());
    }

    #[test]
    fn test_bare_ampersand() {
        assert_eq!(
            check_markup("<p>Smith & Sons</p>"),
            vec![Diagnostic::BareAmpersand { offset: 9 }]
        );
        assert!(has_bare_ampersand("A & B"));
        assert!(!has_bare_ampersand("A &amp; B"));
    }

    #[test]
    fn test_reference_problems() {
        assert_eq!(
            check_markup("AT&T"),
            vec![Diagnostic::UnterminatedReference { offset: 2 }]
        );
        assert_eq!(
            check_markup("a&nbsp;b"),
            vec![Diagnostic::UndefinedEntity("nbsp".into())]
        );
        assert_eq!(
            check_markup("&#;"),
            vec![Diagnostic::UnterminatedReference { offset: 0 }]
        );
    }

    #[test]
    fn test_structure_problems() {
        assert!(matches!(
            check_markup("<p>unclosed").as_slice(),
            [Diagnostic::Malformed(_)]
        ));
        assert!(matches!(
            check_markup("<p>a</p></p>").as_slice(),
            [Diagnostic::Malformed(_)]
        ));
        assert!(matches!(
            check_markup("<p><emph>crossed</p></emph>").as_slice(),
            [Diagnostic::Malformed(_)]
        ));
    }
}
