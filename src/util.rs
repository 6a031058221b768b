//! Small helpers shared across the exporter.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A nonce that differs between exports running in the same process, even
/// when they start within the same clock tick.
pub fn export_nonce() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let clock = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    // splitmix64 finalizer
    let mut z = clock ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Decode bytes to a string, handling various encodings.
///
/// Snapshots exported from older hosts are occasionally Windows-1252. This
/// tries UTF-8 first (BOM handled by encoding_rs) and falls back to CP1252.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    tracing::debug!("input is not valid UTF-8, decoding as windows-1252");
    let (result, _encoding, _malformed) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// True for characters that cannot appear in an XML 1.0 document.
pub fn is_xml_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("Smith – Papers".as_bytes()), "Smith – Papers");
    }

    #[test]
    fn test_decode_cp1252_fallback() {
        // 0x93/0x94 are curly quotes in windows-1252 and invalid UTF-8 here
        let bytes = b"\x93quoted\x94";
        assert_eq!(decode_text(bytes), "\u{201C}quoted\u{201D}");
    }

    #[test]
    fn test_nonces_differ() {
        assert_ne!(export_nonce(), export_nonce());
    }

    #[test]
    fn test_forbidden_chars() {
        assert!(is_xml_forbidden('\u{1}'));
        assert!(!is_xml_forbidden('\n'));
        assert!(!is_xml_forbidden('\t'));
        assert!(!is_xml_forbidden('é'));
    }
}
