//! Typed deserialisation layer: maps each decoded event's payload into a
//! domain type via [`serde_json`].
//!
//! This is the crate's deserialization-callback boundary. Failures are not
//! retried or skipped; the caller sees the error exactly where it occurred
//! in the event sequence and decides what to do.

use crate::event::Payload;
use core::{
    error::Error,
    fmt::Display,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};
use futures_core::Stream;
use serde::de::DeserializeOwned;

pin_project_lite::pin_project! {
    /// [`Stream`] adapter deserialising each event's payload into `T`.
    ///
    /// Works over any event stream whose items implement [`Payload`]: SSE
    /// `data`, JSON Lines records, or negotiated [`AnyEvent`][crate::event::AnyEvent]s.
    #[derive(Debug)]
    pub struct JsonStream<T, S, DeserError = serde_json::Error> {
        #[pin]
        stream_state: JsonStreamState<S>,
        output_marker: PhantomData<fn() -> (T, DeserError)>,
    }
}

pub type DefaultJsonStream<T, S> = JsonStream<T, S, serde_json::Error>;

pub type PathErrorJsonStream<T, S> =
    JsonStream<T, S, serde_path_to_error::Error<serde_json::Error>>;

impl<T, S> DefaultJsonStream<T, S> {
    #[must_use]
    /// Creates a new [`JsonStream`] atop `stream` that yields `T` or a plain [`serde_json::Error`]
    pub fn new_default(stream: S) -> Self {
        JsonStream {
            stream_state: JsonStreamState::Active { stream },
            output_marker: PhantomData,
        }
    }
}

impl<T, S> PathErrorJsonStream<T, S> {
    #[must_use]
    /// Creates a new [`JsonStream`] atop `stream` that yields `T` or an error
    /// with path information via [`serde_path_to_error`]
    pub fn new_path(stream: S) -> Self {
        JsonStream {
            stream_state: JsonStreamState::Active { stream },
            output_marker: PhantomData,
        }
    }
}

pin_project_lite::pin_project! {
    #[derive(Debug)]
    #[project = JsonStreamStateProjection]
    enum JsonStreamState<S> {
        Active {
            #[pin]
            stream: S
        },
        Inactive,
    }
}

#[derive(Debug)]
pub enum JsonStreamError<E, E2> {
    Stream(E),
    Deserialize(E2),
}

impl<E, E2> Display for JsonStreamError<E, E2>
where
    E: Display,
    E2: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            JsonStreamError::Stream(e) => e.fmt(f),
            JsonStreamError::Deserialize(e2) => e2.fmt(f),
        }
    }
}

impl<E, E2> Error for JsonStreamError<E, E2>
where
    E: Error,
    E2: Error,
{
}

impl<T, S, P, E> Stream for JsonStream<T, S, serde_json::Error>
where
    S: Stream<Item = Result<P, E>>,
    P: Payload,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<E, serde_json::Error>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let stream = match this.stream_state.as_mut().project() {
            JsonStreamStateProjection::Active { stream } => stream,
            JsonStreamStateProjection::Inactive => return Poll::Ready(None),
        };

        let Some(next) = core::task::ready!(stream.poll_next(cx)) else {
            this.stream_state.set(JsonStreamState::Inactive);
            return Poll::Ready(None);
        };
        Poll::Ready(Some(next.map_err(JsonStreamError::Stream).and_then(
            |event| serde_json::from_str(event.payload()).map_err(JsonStreamError::Deserialize),
        )))
    }
}

impl<T, S, P, E> Stream for JsonStream<T, S, serde_path_to_error::Error<serde_json::Error>>
where
    S: Stream<Item = Result<P, E>>,
    P: Payload,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<E, serde_path_to_error::Error<serde_json::Error>>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let stream = match this.stream_state.as_mut().project() {
            JsonStreamStateProjection::Active { stream } => stream,
            JsonStreamStateProjection::Inactive => return Poll::Ready(None),
        };

        let Some(next) = core::task::ready!(stream.poll_next(cx)) else {
            this.stream_state.set(JsonStreamState::Inactive);
            return Poll::Ready(None);
        };
        match next {
            Ok(event) => {
                let mut deserializer = serde_json::Deserializer::from_str(event.payload());
                Poll::Ready(Some(
                    serde_path_to_error::deserialize(&mut deserializer)
                        .map_err(JsonStreamError::Deserialize),
                ))
            }
            Err(e) => Poll::Ready(Some(Err(JsonStreamError::Stream(e)))),
        }
    }
}

/// Blocking twin of [`JsonStream`]: deserialises each event from an
/// [`Iterator`] of decoded events, e.g. a [`blocking::EventIter`][crate::blocking::EventIter].
#[derive(Debug)]
pub struct JsonIter<T, I, DeserError = serde_json::Error> {
    source: I,
    output_marker: PhantomData<fn() -> (T, DeserError)>,
}

pub type DefaultJsonIter<T, I> = JsonIter<T, I, serde_json::Error>;

pub type PathErrorJsonIter<T, I> = JsonIter<T, I, serde_path_to_error::Error<serde_json::Error>>;

impl<T, I> DefaultJsonIter<T, I> {
    #[must_use]
    /// Creates a new [`JsonIter`] atop `source` that yields `T` or a plain [`serde_json::Error`]
    pub fn new_default(source: I) -> Self {
        JsonIter {
            source,
            output_marker: PhantomData,
        }
    }
}

impl<T, I> PathErrorJsonIter<T, I> {
    #[must_use]
    /// Creates a new [`JsonIter`] atop `source` that yields `T` or an error
    /// with path information via [`serde_path_to_error`]
    pub fn new_path(source: I) -> Self {
        JsonIter {
            source,
            output_marker: PhantomData,
        }
    }
}

impl<T, I, P, E> Iterator for JsonIter<T, I, serde_json::Error>
where
    I: Iterator<Item = Result<P, E>>,
    P: Payload,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<E, serde_json::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.source.next()?;
        Some(next.map_err(JsonStreamError::Stream).and_then(|event| {
            serde_json::from_str(event.payload()).map_err(JsonStreamError::Deserialize)
        }))
    }
}

impl<T, I, P, E> Iterator for JsonIter<T, I, serde_path_to_error::Error<serde_json::Error>>
where
    I: Iterator<Item = Result<P, E>>,
    P: Payload,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<E, serde_path_to_error::Error<serde_json::Error>>>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.source.next()?;
        match next {
            Ok(event) => {
                let mut deserializer = serde_json::Deserializer::from_str(event.payload());
                Some(
                    serde_path_to_error::deserialize(&mut deserializer)
                        .map_err(JsonStreamError::Deserialize),
                )
            }
            Err(e) => Some(Err(JsonStreamError::Stream(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::JsonlIter;
    use crate::decoder::SseDecoder;
    use crate::event_stream::{EventStream, JsonlStream};
    use bytes::Bytes;
    use futures::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Delta {
        msg: String,
    }

    fn chunked(chunks: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, ()>> {
        futures::stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn typed_events_from_sse() {
        let events = EventStream::<_, SseDecoder>::new(chunked(&[
            b"data: {\"msg\": \"this is a message ",
            b"that got split on multiple data lines\"}\n\ndata: [DONE]\n\n",
        ]))
        .with_terminator("[DONE]");

        let deltas = JsonStream::new_default(events)
            .try_collect::<Vec<Delta>>()
            .await
            .unwrap();
        assert_eq!(
            deltas,
            vec![Delta {
                msg: "this is a message that got split on multiple data lines".into()
            }]
        );
    }

    #[tokio::test]
    async fn typed_events_from_jsonl() {
        let deltas = JsonStream::new_default(JsonlStream::new(chunked(&[
            b"{\"msg\": \"a\"}\n{\"msg\"",
            b": \"b\"}\n",
        ])))
        .try_collect::<Vec<Delta>>()
        .await
        .unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[1].msg, "b");
    }

    #[tokio::test]
    async fn deserialize_failure_is_positioned() {
        let mut stream = JsonStream::<Delta, _>::new_default(JsonlStream::new(chunked(&[
            b"{\"msg\": \"ok\"}\nnot json\n",
        ])));

        assert!(stream.next().await.unwrap().is_ok());
        assert!(matches!(
            stream.next().await.unwrap(),
            Err(JsonStreamError::Deserialize(_))
        ));
    }

    #[tokio::test]
    async fn path_errors_name_the_field() {
        let mut stream = JsonStream::<Delta, _, _>::new_path(JsonlStream::new(chunked(&[
            b"{\"msg\": 42}\n",
        ])));

        match stream.next().await.unwrap() {
            Err(JsonStreamError::Deserialize(e)) => {
                assert_eq!(e.path().to_string(), "msg");
            }
            other => panic!("expected a deserialize error, got {other:?}"),
        }
    }

    #[test]
    fn blocking_typed_events() {
        let lines = JsonlIter::new(
            vec![Ok::<_, ()>(Bytes::from_static(b"{\"msg\": \"a\"}\n{\"msg\": \"b\"}"))]
                .into_iter(),
        );
        let deltas = JsonIter::new_default(lines)
            .collect::<Result<Vec<Delta>, _>>()
            .unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].msg, "a");
    }
}
