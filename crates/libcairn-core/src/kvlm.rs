//! Key-value-list-with-message codec shared by commit and tag bodies.
//!
//! Body format:
//! - one `<key> <value>` line per field, in order; a key may repeat
//! - values containing newlines continue on the next physical line behind
//!   a single leading space
//! - a blank line, then the free-text message (verbatim to end of input)

use crate::error::CairnError;

/// Parsed commit/tag body: ordered fields plus the trailing message.
///
/// Fields are an ordered sequence of (key, values) pairs; a repeated key
/// appends to the values of its first occurrence, so serialization emits
/// repeated lines in file order. Holds `serialize(parse(b)) == b` for any
/// well-formed body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: Vec<(Vec<u8>, Vec<Vec<u8>>)>,
    message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a body. Each call starts from a fresh state.
    pub fn parse(raw: &[u8]) -> Result<Self, CairnError> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        loop {
            if pos >= raw.len() {
                return Err(CairnError::Malformed(
                    "body ends without a blank line before the message".to_string(),
                ));
            }

            // A blank line separates the fields from the message.
            if raw[pos] == b'\n' {
                kvlm.message = raw[pos + 1..].to_vec();
                return Ok(kvlm);
            }

            let spc = find_byte(&raw[pos..], b' ')
                .map(|i| pos + i)
                .ok_or_else(|| malformed_at(pos))?;
            let nl = find_byte(&raw[pos..], b'\n').map(|i| pos + i);
            if matches!(nl, Some(nl) if nl < spc) {
                // A newline before any space would be a key-less line that
                // is not the blank separator.
                return Err(malformed_at(pos));
            }

            let key = raw[pos..spc].to_vec();

            // The value runs to the first newline not followed by a
            // continuation space.
            let vstart = spc + 1;
            let mut cursor = vstart;
            let vend = loop {
                let nl = find_byte(&raw[cursor..], b'\n')
                    .map(|i| cursor + i)
                    .ok_or_else(|| malformed_at(pos))?;
                if raw.get(nl + 1).copied() != Some(b' ') {
                    break nl;
                }
                cursor = nl + 1;
            };

            kvlm.push(key, unfold(&raw[vstart..vend]));
            pos = vend + 1;
        }
    }

    /// Exact inverse of [`Kvlm::parse`].
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, values) in &self.fields {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                out.extend_from_slice(&fold(value));
                out.push(b'\n');
            }
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// Append a value, promoting a repeated key to a list in first-seen
    /// order.
    pub fn push(&mut self, key: Vec<u8>, value: Vec<u8>) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((key, vec![value])),
        }
    }

    /// All values recorded for `key`, in file order.
    pub fn get(&self, key: &[u8]) -> Option<&[Vec<u8>]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// First value recorded for `key`.
    pub fn first(&self, key: &[u8]) -> Option<&[u8]> {
        self.get(key).and_then(|values| values.first()).map(|v| v.as_slice())
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn set_message(&mut self, message: Vec<u8>) {
        self.message = message;
    }
}

fn malformed_at(pos: usize) -> CairnError {
    CairnError::Malformed(format!("invalid field line at byte {}", pos))
}

fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

/// Strip one leading space from each continuation line.
fn unfold(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        out.push(raw[i]);
        if raw[i] == b'\n' && raw.get(i + 1).copied() == Some(b' ') {
            i += 1;
        }
        i += 1;
    }
    out
}

/// Re-escape embedded newlines as continuation lines.
fn fold(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
    out
}
