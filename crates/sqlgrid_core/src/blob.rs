//! Printable encoding for binary cell content.
//!
//! Plain-text cell editors cannot hold control characters or NUL bytes, so
//! blobs travel through the grid in an escaped form: printable ASCII is kept,
//! backslash and the common whitespace controls use two-character escapes and
//! every other byte becomes `\xNN`.

use crate::ValidationError;

pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());

    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02x}", byte)),
        }
    }

    out
}

/// Reverse of [`escape`].
///
/// Also accepts `\'`, `\"` and `\0`. Characters outside ASCII are stored as
/// their UTF-8 bytes.
pub fn unescape(text: &str) -> Result<Vec<u8>, ValidationError> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let invalid = |sequence: &str| ValidationError::InvalidEscape {
            offset,
            sequence: sequence.to_string(),
        };

        let Some((_, code)) = chars.next() else {
            return Err(invalid("\\"));
        };

        match code {
            '\\' => out.push(b'\\'),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            '0' => out.push(0),
            '\'' => out.push(b'\''),
            '"' => out.push(b'"'),
            'x' => {
                let hi = chars.next().map(|(_, c)| c);
                let lo = chars.next().map(|(_, c)| c);
                let digits: String = hi.into_iter().chain(lo).collect();

                if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid(&format!("\\x{}", digits)));
                }

                let byte = u8::from_str_radix(&digits, 16)
                    .map_err(|_| invalid(&format!("\\x{}", digits)))?;
                out.push(byte);
            }
            other => return Err(invalid(&format!("\\{}", other))),
        }
    }

    Ok(out)
}
