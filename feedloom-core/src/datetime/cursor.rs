use feedloom_types::{DateErrorKind, DateGrammar, DateTimeError, ExpandedTime, Timestamp};

use super::calendar;

/// Scanning state for one grammar attempt.
///
/// Only the first error is kept. Recoverable problems (bad names, stray
/// bytes in a number) are recorded and scanning continues, so the cursor
/// shows how far the input matched the grammar's shape.
pub(crate) struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    grammar: DateGrammar,
    error: Option<(DateErrorKind, usize)>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str, grammar: DateGrammar) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            grammar,
            error: None,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn fail_at(&mut self, kind: DateErrorKind, position: usize) {
        if self.error.is_none() {
            self.error = Some((kind, position));
        }
    }

    pub(crate) fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Returns the bytes up to the next of `delimiters` and moves past it.
    ///
    /// A missing delimiter is unrecoverable: the error is recorded and the
    /// cursor stays where it was.
    pub(crate) fn until(&mut self, delimiters: &[u8], field: &'static str) -> Option<&'a [u8]> {
        let rest = &self.input[self.pos..];
        let Some(rel) = rest.iter().position(|b| delimiters.contains(b)) else {
            self.fail_at(
                DateErrorKind::MissingDelimiter {
                    delimiter: char::from(delimiters[0]),
                    field,
                },
                self.input.len(),
            );
            return None;
        };
        let token = &rest[..rel];
        let delimiter = rest[rel];
        self.pos += rel + 1;
        if delimiter == b' ' {
            self.skip_spaces();
        }
        Some(token)
    }

    /// Decimal field terminated by one of `delimiters`.
    pub(crate) fn number_until(&mut self, delimiters: &[u8], field: &'static str) -> Option<u32> {
        let start = self.pos;
        let token = self.until(delimiters, field)?;
        Some(self.decimal(token, start, field))
    }

    /// A bare run of digits, stopping at the first non-digit.
    pub(crate) fn digits(&mut self, field: &'static str) -> u32 {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let token = &self.input[start..self.pos];
        self.decimal(token, start, field)
    }

    /// Everything left in the input.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.input[self.pos..];
        self.pos = self.input.len();
        rest
    }

    fn decimal(&mut self, token: &[u8], start: usize, field: &'static str) -> u32 {
        if token.is_empty() {
            self.fail_at(DateErrorKind::ExpectedDigit { field }, start);
            return 0;
        }
        let mut value = 0u32;
        for (i, &b) in token.iter().enumerate() {
            if !b.is_ascii_digit() {
                self.fail_at(DateErrorKind::ExpectedDigit { field }, start + i);
                return value;
            }
            value = value.saturating_mul(10).saturating_add(u32::from(b - b'0'));
        }
        value
    }

    /// Error for an attempt that had to stop early.
    pub(crate) fn abort(self) -> DateTimeError {
        let (kind, position) = self.error.unwrap_or((DateErrorKind::Empty, self.pos));
        DateTimeError {
            grammar: self.grammar,
            kind,
            position,
            progress: self.pos,
        }
    }

    /// Converts the scanned fields, or reports the first recorded error.
    pub(crate) fn finish(
        self,
        expanded: ExpandedTime,
        offset_seconds: i32,
    ) -> Result<Timestamp, DateTimeError> {
        if self.error.is_some() {
            return Err(self.abort());
        }
        Ok(calendar::timestamp(expanded, offset_seconds))
    }
}
