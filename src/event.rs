//! Decoded event types, based primarily off <https://html.spec.whatwg.org/multipage/server-sent-events.html>
//! for SSE and <https://jsonlines.org/> for JSON Lines

use core::time::Duration;

use bytes_utils::Str;

/// One Server-Sent Event, as emitted by an SSE stream.
///
/// `data` is the `\n`-joined concatenation of every `data:` field seen since
/// the previous event boundary. `id` is the last event ID string, which
/// persists across events until the server overwrites it (empty = never set).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub event: Str,
    pub data: Str,
    pub id: Str,
    pub retry: Option<Duration>,
}

/// One line of a JSON Lines stream, line terminator stripped.
///
/// Framing only: `raw` is not parsed, let alone validated, as JSON. That
/// happens downstream, e.g. in [`JsonStream`][crate::json_stream::JsonStream].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JsonlEvent {
    pub raw: Str,
}

impl JsonlEvent {
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Event from a runtime-selected decoder, see [`AnyDecoder`][crate::decoder::AnyDecoder]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnyEvent {
    Sse(Event),
    Jsonl(JsonlEvent),
}

/// The textual payload of a decoded event.
///
/// This is the seam shared by the terminal-sentinel check on the stream
/// adapters and by the typed JSON layer: for SSE it is the joined `data`,
/// for JSON Lines the whole line.
pub trait Payload {
    fn payload(&self) -> &str;
}

impl Payload for Event {
    fn payload(&self) -> &str {
        &self.data
    }
}

impl Payload for JsonlEvent {
    fn payload(&self) -> &str {
        &self.raw
    }
}

impl Payload for AnyEvent {
    fn payload(&self) -> &str {
        match self {
            AnyEvent::Sse(event) => event.payload(),
            AnyEvent::Jsonl(event) => event.payload(),
        }
    }
}

/// Does this event's payload match the configured terminal sentinel exactly?
pub(crate) fn is_terminal<Ev: Payload>(event: &Ev, terminator: Option<&Str>) -> bool {
    match terminator {
        Some(sentinel) => {
            let sentinel: &str = sentinel;
            event.payload() == sentinel
        }
        None => false,
    }
}
