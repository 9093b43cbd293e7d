//! Decoder state machines: pure, I/O-free event accumulation over a shared
//! byte buffer. The stream adapters in [`event_stream`][crate::event_stream]
//! and [`blocking`][crate::blocking] only pump bytes; everything
//! protocol-shaped lives here.

use core::{str::Utf8Error, time::Duration};

use bytes::{Buf, BufMut, BytesMut};
use bytes_utils::{Str, StrMut};

use crate::{
    constants::{BOM, CR, EMPTY_STR, LF, MESSAGE_STR},
    errors::UnsupportedContentType,
    event::{AnyEvent, Event, JsonlEvent},
    parser::{
        FieldName, ValidatedEventLine, classify_line, parse_line_from_buffer, split_line,
        trim_trailing_cr, validate_bytes,
    },
};

/// Incremental event decoder over a shared byte buffer.
///
/// `decode` pulls at most one complete event out of `buffer`, leaving any
/// residue (a partial line, a half-accumulated event) in place for the next
/// call. `finish` runs exactly once, when the byte source is exhausted: it
/// flushes whatever is still buffered, including an unterminated final line,
/// as one last event. Both formats tolerate a missing terminator on the
/// final record, so the flush is an emission, not an error.
pub trait EventDecoder {
    type Event;

    fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<Self::Event>, Utf8Error>;

    fn finish(&mut self, buffer: &mut BytesMut) -> Result<Option<Self::Event>, Utf8Error>;
}

/// `Some(true)`: full BOM. `Some(false)`: definitely no BOM. `None`: the
/// slice is a strict prefix of the BOM, need more bytes to decide.
fn starts_with_bom(bytes: &[u8]) -> Option<bool> {
    if bytes.len() >= BOM.len() {
        Some(bytes.starts_with(BOM))
    } else if BOM.starts_with(bytes) {
        None
    } else {
        Some(false)
    }
}

/// Per-event field accumulator.
///
/// `id` doubles as the last event ID string: it survives [`dispatch`][Self::dispatch]
/// (the WHATWG buffer that "does not get reset"). `dirty` tracks whether any
/// field landed since the previous emission, so a blank line with nothing
/// accumulated emits nothing.
#[derive(Debug, Clone)]
struct EventBuilder {
    event: Str,
    id: Str,
    data: StrMut,
    retry: Option<Duration>,
    dirty: bool,
    is_complete: bool,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self {
            event: EMPTY_STR,
            id: EMPTY_STR,
            data: StrMut::new(),
            retry: None,
            dirty: false,
            is_complete: false,
        }
    }
}

impl EventBuilder {
    fn add(&mut self, line: ValidatedEventLine) {
        match line {
            ValidatedEventLine::Empty => self.is_complete = true,
            ValidatedEventLine::Field {
                field_name: FieldName::Event,
                field_value: Some(field_value),
            } => {
                self.event = field_value;
                self.dirty = true;
            }
            ValidatedEventLine::Field {
                field_name: FieldName::Data,
                field_value,
            } => {
                if let Some(field_value) = field_value {
                    self.data.push_str(&field_value);
                }
                self.data.push('\n');
                self.dirty = true;
            }
            ValidatedEventLine::Field {
                field_name: FieldName::Id,
                field_value,
            } => {
                // an id containing NUL is discarded, the previous id survives
                let no_null_byte = field_value
                    .as_ref()
                    .map(|field_value| memchr::memchr(0, field_value.as_bytes()).is_none())
                    .unwrap_or(true);

                if no_null_byte {
                    self.id = field_value.unwrap_or(EMPTY_STR);
                    self.dirty = true;
                }
            }
            ValidatedEventLine::Field {
                field_name: FieldName::Retry,
                field_value,
            } => {
                // non-integer retry values are silently dropped
                if let Some(Ok(val)) = field_value.map(|val| val.parse()) {
                    self.retry = Some(Duration::from_millis(val));
                    self.dirty = true;
                }
            }
            ValidatedEventLine::Comment
            | ValidatedEventLine::Field {
                field_name: FieldName::Ignored,
                ..
            }
            | ValidatedEventLine::Field {
                field_name: FieldName::Event,
                field_value: None,
            } => (),
        }
    }

    /// Emit the pending event and reset the per-event accumulators. The id
    /// carries over; the trailing LF the data buffer always ends in (one per
    /// `data:` line) is removed, which is what makes `data` the `\n`-joined
    /// list of data values.
    fn dispatch(&mut self) -> Option<Event> {
        let EventBuilder {
            mut event,
            id,
            mut data,
            retry,
            dirty,
            ..
        } = core::mem::take(self);
        self.id = id.clone();

        if !dirty {
            return None;
        }

        if data.as_bytes().last() == Some(&LF) {
            let mut buf = data.into_inner();
            buf.truncate(buf.len() - 1);
            // Safety: the removed byte is an LF, never part of a multi-byte codepoint
            data = unsafe { StrMut::from_inner_unchecked(buf) };
        }

        if event.is_empty() {
            event = MESSAGE_STR;
        }

        Some(Event {
            event,
            data: data.freeze(),
            id,
            retry,
        })
    }
}

/// Server-Sent Events decoder: blank-line-delimited blocks of `field: value`
/// lines, with a leading UTF-8 BOM stripped.
#[derive(Debug, Clone, Default)]
pub struct SseDecoder {
    builder: EventBuilder,
    started: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last event ID string, as of the most recently emitted event.
    pub fn last_event_id(&self) -> &Str {
        &self.builder.id
    }

    /// Seed the last event ID, useful when resuming a stream.
    pub fn set_last_event_id(&mut self, id: impl Into<Str>) {
        self.builder.id = id.into();
    }
}

impl EventDecoder for SseDecoder {
    type Event = Event;

    fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<Event>, Utf8Error> {
        if !self.started {
            match starts_with_bom(buffer) {
                Some(true) => {
                    buffer.advance(BOM.len());
                    self.started = true;
                }
                Some(false) => self.started = true,
                // could still be a BOM split across chunks
                None => return Ok(None),
            }
        }

        while let Some(line) = parse_line_from_buffer(buffer) {
            self.builder.add(line.validate()?);

            if self.builder.is_complete {
                if let Some(event) = self.builder.dispatch() {
                    return Ok(Some(event));
                }
            }
        }
        Ok(None)
    }

    fn finish(&mut self, buffer: &mut BytesMut) -> Result<Option<Event>, Utf8Error> {
        if !self.started {
            if let Some(true) = starts_with_bom(buffer) {
                buffer.advance(BOM.len());
            }
            self.started = true;
        }

        // a line held back waiting to tell CR from CRLF is complete now
        if buffer.last() == Some(&CR) {
            buffer.put_u8(LF);
        }

        if let Some(event) = self.decode(buffer)? {
            return Ok(Some(event));
        }

        // no terminator will ever arrive, take the remainder as the final line
        if !buffer.is_empty() {
            let line = classify_line(buffer.split().freeze());
            self.builder.add(line.validate()?);
        }

        Ok(self.builder.dispatch())
    }
}

/// JSON Lines decoder: one event per `\n`-terminated line. Framing only, the
/// line is never parsed as JSON here.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl EventDecoder for JsonlDecoder {
    type Event = JsonlEvent;

    fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<JsonlEvent>, Utf8Error> {
        match split_line(buffer) {
            Some(line) => Ok(Some(JsonlEvent {
                raw: validate_bytes(line)?,
            })),
            None => Ok(None),
        }
    }

    fn finish(&mut self, buffer: &mut BytesMut) -> Result<Option<JsonlEvent>, Utf8Error> {
        if buffer.is_empty() {
            return Ok(None);
        }
        let line = trim_trailing_cr(buffer.split().freeze());
        Ok(Some(JsonlEvent {
            raw: validate_bytes(line)?,
        }))
    }
}

/// Decoder selected at runtime from a declared content type.
#[derive(Debug, Clone)]
pub enum AnyDecoder {
    Sse(SseDecoder),
    Jsonl(JsonlDecoder),
}

impl AnyDecoder {
    /// Map a media type to a decoder: `text/event-stream` is SSE,
    /// `application/jsonl` (or its de-facto alias `application/x-ndjson`) is
    /// JSON Lines. Parameters are stripped and the essence compared ASCII
    /// case-insensitively. Anything else is an [`UnsupportedContentType`]
    /// configuration error.
    pub fn for_content_type(content_type: &str) -> Result<Self, UnsupportedContentType> {
        let essence = content_type.split(';').next().unwrap_or("").trim();

        if essence.eq_ignore_ascii_case("text/event-stream") {
            Ok(AnyDecoder::Sse(SseDecoder::new()))
        } else if essence.eq_ignore_ascii_case("application/jsonl")
            || essence.eq_ignore_ascii_case("application/x-ndjson")
        {
            Ok(AnyDecoder::Jsonl(JsonlDecoder::new()))
        } else {
            Err(UnsupportedContentType::new(content_type))
        }
    }
}

impl EventDecoder for AnyDecoder {
    type Event = AnyEvent;

    fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<AnyEvent>, Utf8Error> {
        match self {
            AnyDecoder::Sse(decoder) => Ok(decoder.decode(buffer)?.map(AnyEvent::Sse)),
            AnyDecoder::Jsonl(decoder) => Ok(decoder.decode(buffer)?.map(AnyEvent::Jsonl)),
        }
    }

    fn finish(&mut self, buffer: &mut BytesMut) -> Result<Option<AnyEvent>, Utf8Error> {
        match self {
            AnyDecoder::Sse(decoder) => Ok(decoder.finish(buffer)?.map(AnyEvent::Sse)),
            AnyDecoder::Jsonl(decoder) => Ok(decoder.finish(buffer)?.map(AnyEvent::Jsonl)),
        }
    }
}
