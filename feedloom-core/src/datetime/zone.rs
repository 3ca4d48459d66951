//! Timezone tokens.

const HOUR: i32 = 3600;

/// Named zones and their fixed offsets. No daylight-saving logic beyond the
/// literal name.
const NAMED_ZONES: &[(&[u8], i32)] = &[
    (b"UT", 0),
    (b"GMT", 0),
    (b"Z", 0),
    (b"EST", -5 * HOUR),
    (b"EDT", -4 * HOUR),
    (b"CST", -6 * HOUR),
    (b"CDT", -5 * HOUR),
    (b"MST", -7 * HOUR),
    (b"MDT", -6 * HOUR),
    (b"PST", -8 * HOUR),
    (b"PDT", -7 * HOUR),
];

/// Offset east of UTC in seconds for `+HHMM`, `+HH:MM` or a named zone.
pub(crate) fn resolve(token: &[u8]) -> Option<i32> {
    numeric(token).or_else(|| {
        NAMED_ZONES
            .iter()
            .find(|(name, _)| *name == token)
            .map(|&(_, offset)| offset)
    })
}

fn numeric(token: &[u8]) -> Option<i32> {
    let (sign, digits) = match token {
        [b'+', rest @ ..] => (1, rest),
        [b'-', rest @ ..] => (-1, rest),
        _ => return None,
    };
    let (hh, mm) = match digits {
        [h1, h2, m1, m2] | [h1, h2, b':', m1, m2] => ([*h1, *h2], [*m1, *m2]),
        _ => return None,
    };
    let hours = two_digits(hh)?;
    let minutes = two_digits(mm)?;
    Some(sign * (hours * HOUR + minutes * 60))
}

#[inline]
fn two_digits(pair: [u8; 2]) -> Option<i32> {
    let [a, b] = pair;
    if a.is_ascii_digit() && b.is_ascii_digit() {
        Some(i32::from(a - b'0') * 10 + i32::from(b - b'0'))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_zones() {
        assert_eq!(resolve(b"GMT"), Some(0));
        assert_eq!(resolve(b"Z"), Some(0));
        assert_eq!(resolve(b"EST"), Some(-5 * 3600));
        assert_eq!(resolve(b"PDT"), Some(-7 * 3600));
    }

    #[test]
    fn numeric_offsets() {
        assert_eq!(resolve(b"+0000"), Some(0));
        assert_eq!(resolve(b"-0430"), Some(-(4 * 3600 + 30 * 60)));
        assert_eq!(resolve(b"+05:45"), Some(5 * 3600 + 45 * 60));
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert_eq!(resolve(b"XXX"), None);
        assert_eq!(resolve(b"gmt"), None);
        assert_eq!(resolve(b""), None);
        assert_eq!(resolve(b"+5"), None);
        assert_eq!(resolve(b"+05x00"), None);
    }
}
