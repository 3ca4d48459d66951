//! XML character reference decoding.
//!
//! Only the five predefined XML entities and numeric references are decoded:
//! `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&#123;`, `&#x1F4A9;`.
//! Anything else (unknown names, missing `;`, invalid scalar values) is copied
//! through unchanged.

use std::borrow::Cow;

use memchr::memchr;

const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

/// Decodes character references in `s`.
///
/// Borrows when `s` contains no `&`.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            let next = memchr(b'&', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            out.push_str(&s[i..next]);
            i = next;
            continue;
        }

        match decode_one(&bytes[i..]) {
            Some((ch, consumed)) => {
                out.push(ch);
                i += consumed;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
    }

    Cow::Owned(out)
}

/// Decodes one reference at the start of `bytes`, returning the character and
/// the number of bytes consumed including `&` and `;`.
fn decode_one(bytes: &[u8]) -> Option<(char, usize)> {
    let semi = memchr(b';', &bytes[..bytes.len().min(12)])?;
    let body = &bytes[1..semi];

    let ch = match body {
        b"amp" => '&',
        b"lt" => '<',
        b"gt" => '>',
        b"quot" => '"',
        b"apos" => '\'',
        [b'#', b'x' | b'X', hex @ ..] => numeric(hex, 16, MAX_HEX_DIGITS)?,
        [b'#', dec @ ..] => numeric(dec, 10, MAX_DEC_DIGITS)?,
        _ => return None,
    };

    Some((ch, semi + 1))
}

fn numeric(digits: &[u8], radix: u32, max_digits: usize) -> Option<char> {
    if digits.is_empty() || digits.len() > max_digits {
        return None;
    }
    let mut value = 0u32;
    for &b in digits {
        value = value * radix + char::from(b).to_digit(radix)?;
    }
    char::from_u32(value)
}
