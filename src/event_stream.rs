use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::BytesMut;
use bytes_utils::Str;
use futures_core::Stream;

use crate::{
    decoder::{AnyDecoder, EventDecoder, JsonlDecoder, SseDecoder},
    errors::EventStreamError,
    event::{Payload, is_terminal},
};

#[derive(Debug, Clone, Copy)]
enum StreamState {
    Active,
    Terminated,
}

impl StreamState {
    fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

pin_project_lite::pin_project! {
    /// [`Stream`][futures_core::Stream] adapter that turns a stream of byte
    /// chunks into decoded events, one [`EventDecoder`] per framing.
    ///
    /// Single-pass: once the byte source is exhausted (or a terminal sentinel
    /// is seen) the decoder state is flushed exactly once and every further
    /// poll returns [`None`]. The adapter owns the byte source, so dropping
    /// it releases whatever the source holds, e.g. the HTTP response body.
    #[derive(Debug)]
    pub struct EventStream<S, D = SseDecoder> {
        #[pin]
        stream: S,
        buffer: BytesMut,
        decoder: D,
        terminator: Option<Str>,
        state: StreamState,
    }
}

/// [`EventStream`] over JSON Lines framing
pub type JsonlStream<S> = EventStream<S, JsonlDecoder>;

/// [`EventStream`] whose framing was selected at runtime from a content type
pub type AnyStream<S> = EventStream<S, AnyDecoder>;

impl<S, D> EventStream<S, D> {
    /// Create a new [`EventStream`] from a stream of [`AsRef<[u8]>`][AsRef]
    pub fn new(stream: S) -> Self
    where
        D: Default,
    {
        Self::with_decoder(stream, D::default())
    }

    /// Create a new [`EventStream`] with an explicit decoder, e.g. one from
    /// [`AnyDecoder::for_content_type`]
    pub fn with_decoder(stream: S, decoder: D) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            decoder,
            terminator: None,
            state: StreamState::Active,
        }
    }

    /// Stop iteration, without yielding, at the first event whose payload
    /// equals `sentinel` exactly (e.g. the `[DONE]` convention of
    /// OpenAI-style chat streams)
    pub fn with_terminator(mut self, sentinel: impl Into<Str>) -> Self {
        self.terminator = Some(sentinel.into());
        self
    }

    /// Terminate early: every later poll yields [`None`]. The byte source is
    /// released when the stream is dropped, as usual.
    pub fn close(&mut self) {
        self.state = StreamState::Terminated;
    }

    /// Take the unconsumed buffer, useful if you want to check for leftovers
    pub fn take_buffer(self) -> BytesMut {
        self.buffer
    }

    /// Release the underlying byte source without dropping it
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> EventStream<S, SseDecoder> {
    /// Set the last event id, useful for resumability
    pub fn set_last_event_id(&mut self, id: impl Into<Str>) {
        self.decoder.set_last_event_id(id)
    }

    /// Reference to the last event id given out by this stream
    pub fn last_event_id(&self) -> &Str {
        self.decoder.last_event_id()
    }
}

impl<S, D, E, B> Stream for EventStream<S, D>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    D: EventDecoder,
    D::Event: Payload,
{
    type Item = Result<D::Event, EventStreamError<E>>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<<Self as Stream>::Item>> {
        let mut this = self.project();

        if this.state.is_terminated() {
            return Poll::Ready(None);
        }

        loop {
            // events already sitting in the buffer come before the next pull
            match this.decoder.decode(this.buffer) {
                Ok(Some(event)) => {
                    if is_terminal(&event, this.terminator.as_ref()) {
                        *this.state = StreamState::Terminated;
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(event)));
                }
                Ok(None) => {}
                Err(e) => return Poll::Ready(Some(Err(EventStreamError::Utf8Error(e)))),
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    let chunk = chunk.as_ref();
                    if !chunk.is_empty() {
                        this.buffer.extend_from_slice(chunk);
                    }
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(EventStreamError::Transport(e)))),
                None => {
                    *this.state = StreamState::Terminated;
                    return match this.decoder.finish(this.buffer) {
                        Ok(Some(event)) if !is_terminal(&event, this.terminator.as_ref()) => {
                            Poll::Ready(Some(Ok(event)))
                        }
                        Ok(_) => Poll::Ready(None),
                        Err(e) => Poll::Ready(Some(Err(EventStreamError::Utf8Error(e)))),
                    };
                }
            }
        }
    }
}
