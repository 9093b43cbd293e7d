//! Blocking twins of the async stream adapters.
//!
//! Same decoder state machines, same semantics, pulled through a plain
//! [`Iterator`] instead of a [`Stream`][futures_core::Stream]: the only
//! difference between the two adapters is where they suspend waiting for the
//! next byte chunk.

use bytes::BytesMut;
use bytes_utils::Str;

use crate::{
    decoder::{AnyDecoder, EventDecoder, JsonlDecoder, SseDecoder},
    errors::EventStreamError,
    event::{Payload, is_terminal},
};

#[derive(Debug, Clone, Copy)]
enum IterState {
    Active,
    Terminated,
}

impl IterState {
    fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// [`Iterator`] adapter that turns an iterator of byte chunks into decoded
/// events.
///
/// Single-pass, like its async twin [`EventStream`][crate::EventStream]:
/// after the source is exhausted or a terminal sentinel is seen, every
/// further call to [`next`][Iterator::next] returns [`None`]. Dropping the
/// adapter drops the byte source.
#[derive(Debug)]
pub struct EventIter<I, D = SseDecoder> {
    source: I,
    buffer: BytesMut,
    decoder: D,
    terminator: Option<Str>,
    state: IterState,
}

/// [`EventIter`] over JSON Lines framing
pub type JsonlIter<I> = EventIter<I, JsonlDecoder>;

/// [`EventIter`] whose framing was selected at runtime from a content type
pub type AnyIter<I> = EventIter<I, AnyDecoder>;

impl<I, D> EventIter<I, D> {
    /// Create a new [`EventIter`] from an iterator of [`AsRef<[u8]>`][AsRef]
    pub fn new(source: I) -> Self
    where
        D: Default,
    {
        Self::with_decoder(source, D::default())
    }

    /// Create a new [`EventIter`] with an explicit decoder, e.g. one from
    /// [`AnyDecoder::for_content_type`]
    pub fn with_decoder(source: I, decoder: D) -> Self {
        Self {
            source,
            buffer: BytesMut::new(),
            decoder,
            terminator: None,
            state: IterState::Active,
        }
    }

    /// Stop iteration, without yielding, at the first event whose payload
    /// equals `sentinel` exactly
    pub fn with_terminator(mut self, sentinel: impl Into<Str>) -> Self {
        self.terminator = Some(sentinel.into());
        self
    }

    /// Terminate early: every later call to `next` returns [`None`]
    pub fn close(&mut self) {
        self.state = IterState::Terminated;
    }

    /// Take the unconsumed buffer, useful if you want to check for leftovers
    pub fn take_buffer(self) -> BytesMut {
        self.buffer
    }

    /// Release the underlying byte source without dropping it
    pub fn into_inner(self) -> I {
        self.source
    }
}

impl<I> EventIter<I, SseDecoder> {
    /// Set the last event id, useful for resumability
    pub fn set_last_event_id(&mut self, id: impl Into<Str>) {
        self.decoder.set_last_event_id(id)
    }

    /// Reference to the last event id given out by this iterator
    pub fn last_event_id(&self) -> &Str {
        self.decoder.last_event_id()
    }
}

impl<I, D, E, B> Iterator for EventIter<I, D>
where
    I: Iterator<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    D: EventDecoder,
    D::Event: Payload,
{
    type Item = Result<D::Event, EventStreamError<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_terminated() {
            return None;
        }

        loop {
            match self.decoder.decode(&mut self.buffer) {
                Ok(Some(event)) => {
                    if is_terminal(&event, self.terminator.as_ref()) {
                        self.state = IterState::Terminated;
                        return None;
                    }
                    return Some(Ok(event));
                }
                Ok(None) => {}
                Err(e) => return Some(Err(EventStreamError::Utf8Error(e))),
            }

            match self.source.next() {
                Some(Ok(chunk)) => {
                    let chunk = chunk.as_ref();
                    if !chunk.is_empty() {
                        self.buffer.extend_from_slice(chunk);
                    }
                }
                Some(Err(e)) => return Some(Err(EventStreamError::Transport(e))),
                None => {
                    self.state = IterState::Terminated;
                    return match self.decoder.finish(&mut self.buffer) {
                        Ok(Some(event)) if !is_terminal(&event, self.terminator.as_ref()) => {
                            Some(Ok(event))
                        }
                        Ok(_) => None,
                        Err(e) => Some(Err(EventStreamError::Utf8Error(e))),
                    };
                }
            }
        }
    }
}
