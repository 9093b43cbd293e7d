//! UTF-8 agnostic line scanning for SSE and JSON Lines framing

use core::str::Utf8Error;

use bytes::{Buf, Bytes, BytesMut};
use bytes_utils::Str;

use crate::constants::{CR, LF};

/// A full physical line from an SSE stream, split but not yet UTF-8 validated.
/// You probably want to [`validate`][RawEventLine::validate] these into [`ValidatedEventLine`]s.
#[derive(Debug, Clone)]
pub enum RawEventLine {
    Comment,
    Empty,
    Field {
        field_name: Bytes,
        field_value: Option<Bytes>,
    },
}

/// Valid field names according to [html.spec.whatwg.org](https://html.spec.whatwg.org/multipage/server-sent-events.html#event-stream-interpretation),
/// anything else lands in [`FieldName::Ignored`]
#[derive(Debug, Clone, Copy)]
pub enum FieldName {
    Event,
    Data,
    Id,
    Retry,
    Ignored,
}

/// Completely parsed SSE event line
#[derive(Debug, Clone)]
pub enum ValidatedEventLine {
    Comment,
    Empty,
    Field {
        field_name: FieldName,
        field_value: Option<Str>,
    },
}

pub(crate) fn validate_bytes(val: Bytes) -> Result<Str, Utf8Error> {
    match str::from_utf8(val.as_ref()) {
        Ok(_) => Ok(unsafe { Str::from_inner_unchecked(val) }),
        Err(e) => Err(e),
    }
}

impl RawEventLine {
    pub fn validate(self) -> Result<ValidatedEventLine, Utf8Error> {
        match self {
            RawEventLine::Comment => Ok(ValidatedEventLine::Comment),
            RawEventLine::Empty => Ok(ValidatedEventLine::Empty),
            RawEventLine::Field {
                field_name,
                field_value,
            } => {
                let field_name = match field_name.as_ref() {
                    b"event" => FieldName::Event,
                    b"data" => FieldName::Data,
                    b"id" => FieldName::Id,
                    b"retry" => FieldName::Retry,
                    _ => FieldName::Ignored,
                };

                let field_value = match field_value {
                    Some(b) => Some(validate_bytes(b)?),
                    None => None,
                };

                Ok(ValidatedEventLine::Field {
                    field_name,
                    field_value,
                })
            }
        }
    }
}

/// Finds the next SSE EOL in `bytes`. Returns `(line_end, rem_start)` where
/// `line_end` is the non-inclusive end of the line and `rem_start` the
/// inclusive start of the remainder. Returns [`None`] if no EOL is present,
/// which includes a slice ending in a lone CR: more data is needed to tell a
/// bare CR apart from the first half of a CRLF.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let first_match = memchr::memchr2(CR, LF, bytes)?;

    match bytes[first_match] {
        LF => Some((first_match, first_match + 1)),
        CR => {
            if first_match + 1 >= bytes.len() {
                return None;
            }
            if bytes[first_match + 1] == LF {
                Some((first_match, first_match + 2))
            } else {
                Some((first_match, first_match + 1))
            }
        }
        _ => unreachable!(),
    }
}

/// Splits an already line-bounded slice of bytes into a [`RawEventLine`] per
/// the SSE field rules: `:` at position 0 is a comment, the value starts
/// after the first `:` with exactly one leading space stripped.
pub(crate) fn classify_line(line: Bytes) -> RawEventLine {
    if line.is_empty() {
        return RawEventLine::Empty;
    }

    match memchr::memchr(b':', &line) {
        Some(0) => RawEventLine::Comment,
        Some(colon_pos) => {
            let value_start = if line.get(colon_pos + 1) == Some(&b' ') {
                colon_pos + 2
            } else {
                colon_pos + 1
            };
            RawEventLine::Field {
                field_name: line.slice(..colon_pos),
                field_value: Some(line.slice(value_start..)),
            }
        }
        None => RawEventLine::Field {
            field_name: line,
            field_value: None,
        },
    }
}

/// Reads the next [`RawEventLine`] from the buffer, then advances the buffer
/// past the corresponding EOL. Returns [`None`] if the buffer holds no
/// complete line, including when it ends in a lone CR (see [`find_eol`]).
pub fn parse_line_from_buffer(buffer: &mut BytesMut) -> Option<RawEventLine> {
    let (line_end, rem_start) = find_eol(buffer)?;

    let line = buffer.split_to(line_end).freeze();
    buffer.advance(rem_start - line_end);

    Some(classify_line(line))
}

/// Splits the next `\n`-terminated JSON Lines record out of the buffer,
/// stripping the terminator and one trailing `\r` (CRLF tolerance per
/// <https://jsonlines.org/>). Returns [`None`] until a `\n` arrives.
pub fn split_line(buffer: &mut BytesMut) -> Option<Bytes> {
    let lf = memchr::memchr(LF, buffer)?;

    let mut line = buffer.split_to(lf).freeze();
    buffer.advance(1);

    if line.last() == Some(&CR) {
        line.truncate(line.len() - 1);
    }
    Some(line)
}

/// Strips one trailing `\r` from an unterminated final JSON Lines record.
pub(crate) fn trim_trailing_cr(mut line: Bytes) -> Bytes {
    if line.last() == Some(&CR) {
        line.truncate(line.len() - 1);
    }
    line
}
