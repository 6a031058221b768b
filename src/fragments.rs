//! Raw markup fragments and their placeholders.
//!
//! Serializers write escaped text through quick-xml. Content that is already
//! markup must bypass that escaping, so it is parked here and a placeholder
//! token is written in its place. When a chunk is emitted the placeholders
//! are swapped back for the original markup, in the order they were pushed.

use std::collections::VecDeque;

use memchr::memmem;

/// Placeholder tokens look like `:bhl_fragment_<nonce>_<seq>:`.
const PREFIX: &str = ":bhl_fragment_";

/// Append-only store of raw markup strings for one output chunk.
#[derive(Debug)]
pub struct FragmentBuffer {
    nonce: u64,
    next_seq: usize,
    pending: VecDeque<String>,
}

impl FragmentBuffer {
    /// Create an empty buffer. Buffers that will be resolved together must
    /// not share a nonce with unrelated content.
    pub fn new(nonce: u64) -> Self {
        Self {
            nonce,
            next_seq: 0,
            pending: VecDeque::new(),
        }
    }

    /// Store `raw` and return the placeholder to write in its place.
    pub fn push(&mut self, raw: impl Into<String>) -> String {
        let placeholder = placeholder(self.nonce, self.next_seq);
        self.next_seq += 1;
        self.pending.push_back(raw.into());
        placeholder
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Replace every placeholder in `output` with its fragment.
    ///
    /// Fragments are consumed front to back. A token whose sequence number
    /// is not the next expected one is left as literal text.
    pub fn resolve(mut self, output: Vec<u8>) -> Vec<u8> {
        if self.pending.is_empty() {
            return output;
        }

        let token_prefix = format!("{PREFIX}{:016x}_", self.nonce);
        let finder = memmem::Finder::new(token_prefix.as_bytes());
        let mut resolved = Vec::with_capacity(
            output.len() + self.pending.iter().map(String::len).sum::<usize>(),
        );
        let mut expected = 0usize;
        let mut pos = 0usize;

        while let Some(found) = finder.find(&output[pos..]) {
            let start = pos + found;
            let seq_start = start + token_prefix.len();
            let digits = output[seq_start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let seq_end = seq_start + digits;
            let is_token = digits > 0 && output.get(seq_end) == Some(&b':');
            let seq = std::str::from_utf8(&output[seq_start..seq_end])
                .ok()
                .and_then(|s| s.parse::<usize>().ok());

            match (is_token, seq) {
                (true, Some(seq)) if seq == expected => {
                    resolved.extend_from_slice(&output[pos..start]);
                    if let Some(fragment) = self.pending.pop_front() {
                        resolved.extend_from_slice(fragment.as_bytes());
                    }
                    expected += 1;
                    pos = seq_end + 1;
                }
                _ => {
                    let skip = start + token_prefix.len();
                    resolved.extend_from_slice(&output[pos..skip]);
                    pos = skip;
                }
            }
        }

        resolved.extend_from_slice(&output[pos..]);
        if !self.pending.is_empty() {
            tracing::warn!(unresolved = self.pending.len(), "fragments left without placeholders");
        }
        resolved
    }
}

fn placeholder(nonce: u64, seq: usize) -> String {
    format!("{PREFIX}{nonce:016x}_{seq}:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_in_order() {
        let mut buffer = FragmentBuffer::new(42);
        let a = buffer.push("<emph>a</emph>");
        let b = buffer.push("<lb/>");
        let output = format!("<x>{a}</x><y>{b}</y>").into_bytes();
        assert_eq!(buffer.len(), 2);
        assert_eq!(
            String::from_utf8(buffer.resolve(output)).unwrap(),
            "<x><emph>a</emph></x><y><lb/></y>"
        );
    }

    #[test]
    fn test_fragment_is_not_reescaped() {
        let mut buffer = FragmentBuffer::new(1);
        let token = buffer.push("Tom &amp; Jerry <emph>&lt;3</emph>");
        let resolved = buffer.resolve(token.into_bytes());
        assert_eq!(resolved, b"Tom &amp; Jerry <emph>&lt;3</emph>");
    }

    #[test]
    fn test_foreign_nonce_left_alone() {
        let mut buffer = FragmentBuffer::new(7);
        let token = buffer.push("<lb/>");
        let other = placeholder(8, 0);
        let output = format!("{other}|{token}").into_bytes();
        assert_eq!(
            String::from_utf8(buffer.resolve(output)).unwrap(),
            format!("{other}|<lb/>")
        );
    }

    #[test]
    fn test_empty_buffer_passthrough() {
        let buffer = FragmentBuffer::new(3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.resolve(b"<a/>".to_vec()), b"<a/>");
    }
}
