//! Character reference decoding and the matching escapes used on output.
//!
//! Only the references rendered markup actually emits are decoded: the five XML
//! entities, `&nbsp;`, and semicolon-terminated numeric references that name a
//! valid scalar value. Everything else is copied through untouched so that a
//! decode followed by an escape never invents characters.

use memchr::memchr;

const NAMED: &[(&str, char)] = &[
    ("amp;", '&'),
    ("lt;", '<'),
    ("gt;", '>'),
    ("quot;", '"'),
    ("apos;", '\''),
    ("nbsp;", '\u{00A0}'),
];

// 0x10FFFF has 6 hex digits and 1114111 has 7 decimal ones.
const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

pub fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;

    while let Some(rel) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + rel;
        out.push_str(&s[pos..amp]);
        match decode_reference(&s[amp + 1..]) {
            Some((ch, consumed)) => {
                out.push(ch);
                pos = amp + 1 + consumed;
            }
            None => {
                out.push('&');
                pos = amp + 1;
            }
        }
    }
    out.push_str(&s[pos..]);
    out
}

/// Decodes the reference following a `&`. Returns the character and the number
/// of bytes consumed after the ampersand.
fn decode_reference(rest: &str) -> Option<(char, usize)> {
    if let Some(numeric) = rest.strip_prefix('#') {
        let (digits, radix, prefix_len, max) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 2, MAX_HEX_DIGITS),
            None => (numeric, 10, 1, MAX_DEC_DIGITS),
        };
        let end = digits.find(';')?;
        let body = &digits[..end];
        if body.is_empty() || body.len() > max || !body.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        let ch = u32::from_str_radix(body, radix).ok().and_then(char::from_u32)?;
        return Some((ch, prefix_len + end + 1));
    }

    NAMED
        .iter()
        .find(|(name, _)| rest.starts_with(name))
        .map(|(name, ch)| (*ch, name.len()))
}

pub fn escape_text(s: &str) -> String {
    escape(s, false)
}

pub fn escape_attribute(s: &str) -> String {
    escape(s, true)
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}
