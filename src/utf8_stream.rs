//! Incremental UTF-8 decoding over arbitrarily chunked byte input.
//!
//! Chunk boundaries can fall anywhere, including inside a multi-byte
//! codepoint; [`Utf8Decoder`] buffers the incomplete trailing bytes so the
//! concatenation of its outputs always equals the decoding of the whole byte
//! stream, however it was split.

use bytes::BytesMut;
use bytes_utils::Str;
use core::pin::Pin;
use core::str::Utf8Error;
use core::task::ready;
use futures_core::stream::Stream;
use futures_core::task::{Context, Poll};
use pin_project_lite::pin_project;

pub use crate::errors::Utf8StreamError;

/// Stateful incremental UTF-8 codec.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: BytesMut,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, buffering a trailing incomplete codepoint for the
    /// next call. With `last = true` the buffer must come out empty: bytes
    /// that still do not form a complete codepoint are a decode error, as is
    /// any outright invalid sequence at any point.
    pub fn decode(&mut self, chunk: &[u8], last: bool) -> Result<Str, Utf8Error> {
        self.pending.extend_from_slice(chunk);

        match str::from_utf8(&self.pending) {
            Ok(_) => {
                let text = self.pending.split().freeze();
                // Safety: we just checked the buffer is valid utf8
                Ok(unsafe { Str::from_inner_unchecked(text) })
            }
            Err(e) => {
                // error_len() is None for a sequence that is merely cut off
                // at the end of the buffer; that only stays recoverable while
                // more input can arrive
                if e.error_len().is_some() || last {
                    Err(e)
                } else {
                    let valid = self.pending.split_to(e.valid_up_to()).freeze();
                    // Safety: split at the validated prefix boundary
                    Ok(unsafe { Str::from_inner_unchecked(valid) })
                }
            }
        }
    }
}

pin_project! {
    /// [`Stream`] adapter validating a byte stream into UTF-8 [`Str`]s via
    /// [`Utf8Decoder`].
    #[derive(Debug)]
    pub struct Utf8Stream<S> {
        #[pin]
        stream: S,
        decoder: Utf8Decoder,
        done: bool,
    }
}

impl<S> Utf8Stream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: Utf8Decoder::new(),
            done: false,
        }
    }
}

impl<S, E, B> Stream for Utf8Stream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    type Item = Result<Str, Utf8StreamError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        match ready!(this.stream.poll_next(cx)) {
            Some(Ok(bytes)) => match this.decoder.decode(bytes.as_ref(), false) {
                Ok(text) => Poll::Ready(Some(Ok(text))),
                Err(e) => {
                    // mid-codepoint corruption is not recoverable
                    *this.done = true;
                    Poll::Ready(Some(Err(Utf8StreamError::Utf8Error(e))))
                }
            },
            Some(Err(err)) => Poll::Ready(Some(Err(Utf8StreamError::Transport(err)))),
            None => {
                *this.done = true;
                match this.decoder.decode(&[], true) {
                    Ok(text) if text.is_empty() => Poll::Ready(None),
                    Ok(text) => Poll::Ready(Some(Ok(text))),
                    Err(e) => Poll::Ready(Some(Err(Utf8StreamError::Utf8Error(e)))),
                }
            }
        }
    }
}

#[cfg(test)]
#[cfg(feature = "std")]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::prelude::*;

    #[test]
    fn chunk_boundary_invariance() {
        // "aé👍z" covers 1-, 2- and 4-byte codepoints
        let input = "a\u{e9}\u{1F44D}z".as_bytes();

        for split in 0..=input.len() {
            let (head, tail) = input.split_at(split);
            let mut decoder = Utf8Decoder::new();
            let mut out = String::new();
            out.push_str(&decoder.decode(head, false).unwrap());
            out.push_str(&decoder.decode(tail, true).unwrap());
            assert_eq!(out, "a\u{e9}\u{1F44D}z", "split at byte {split}");
        }
    }

    #[test]
    fn one_byte_at_a_time() {
        let input = "\u{1F431}\u{1F431}".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for &b in input {
            out.push_str(&decoder.decode(&[b], false).unwrap());
        }
        out.push_str(&decoder.decode(&[], true).unwrap());
        assert_eq!(out, "\u{1F431}\u{1F431}");
    }

    #[test]
    fn incomplete_sequence_at_end_is_an_error() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[240, 159], false).unwrap(), Str::from(""));
        assert!(decoder.decode(&[], true).is_err());
    }

    #[test]
    fn invalid_byte_fails_immediately() {
        let mut decoder = Utf8Decoder::new();
        assert!(decoder.decode(&[b'h', b'i', 0xFF], false).is_err());
    }

    #[tokio::test]
    async fn valid_streams() {
        assert_eq!(
            Utf8Stream::new(futures::stream::iter(vec![Ok::<_, ()>(Bytes::from(
                "Hello, world!"
            ))]))
            .try_collect::<Vec<_>>()
            .await
            .unwrap(),
            vec![Str::from("Hello, world!")]
        );

        assert_eq!(
            Utf8Stream::new(futures::stream::iter(vec![
                Ok::<_, ()>(Bytes::from("Hello")),
                Ok::<_, ()>(Bytes::from(", world!"))
            ]))
            .try_collect::<Vec<_>>()
            .await
            .unwrap(),
            vec![Str::from("Hello"), Str::from(", world!")]
        );

        // Emoji split across two chunks: the first chunk decodes to nothing,
        // the second completes the codepoint
        assert_eq!(
            Utf8Stream::new(futures::stream::iter(vec![
                Ok::<_, ()>(Bytes::from(vec![240, 159])),
                Ok::<_, ()>(Bytes::from(vec![145, 141]))
            ]))
            .try_collect::<Vec<_>>()
            .await
            .unwrap(),
            vec![Str::from(""), Str::from("\u{1F44D}")]
        );

        assert_eq!(
            Utf8Stream::new(futures::stream::iter(vec![
                Ok::<_, ()>(Bytes::from("Hello ")),
                Ok::<_, ()>(Bytes::from(vec![240, 159])),
                Ok::<_, ()>(Bytes::from(vec![145, 141])),
                Ok::<_, ()>(Bytes::from(" world!"))
            ]))
            .try_collect::<Vec<_>>()
            .await
            .unwrap(),
            vec![
                Str::from("Hello "),
                Str::from(""),
                Str::from("\u{1F44D}"),
                Str::from(" world!")
            ]
        );
    }

    #[tokio::test]
    async fn incomplete_at_stream_end() {
        let results = Utf8Stream::new(futures::stream::iter(vec![Ok::<_, ()>(Bytes::from(
            vec![240, 159],
        ))]))
        .collect::<Vec<_>>()
        .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok(Str::from("")));
        assert!(matches!(results[1], Err(Utf8StreamError::Utf8Error(_))));
    }

    #[tokio::test]
    async fn invalid_byte_mid_stream_terminates() {
        let results = Utf8Stream::new(futures::stream::iter(vec![
            Ok::<_, ()>(Bytes::from("Hello ")),
            Ok::<_, ()>(Bytes::from(vec![0xFF])),
            Ok::<_, ()>(Bytes::from("world")),
        ]))
        .collect::<Vec<_>>()
        .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Ok(Str::from("Hello ")));
        assert!(matches!(results[1], Err(Utf8StreamError::Utf8Error(_))));
    }

    #[tokio::test]
    async fn transport_errors_do_not_terminate() {
        let results = Utf8Stream::new(futures::stream::iter(vec![
            Ok::<_, &str>(Bytes::from("Hello")),
            Err("transport error"),
            Ok::<_, &str>(Bytes::from("world")),
        ]))
        .collect::<Vec<_>>()
        .await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(Str::from("Hello")));
        assert!(matches!(
            results[1],
            Err(Utf8StreamError::Transport("transport error"))
        ));
        assert_eq!(results[2], Ok(Str::from("world")));
    }
}
