//! High-performance, `no_std`-compatible decoding of incremental event
//! streams: [Server-Sent Events](https://html.spec.whatwg.org/multipage/server-sent-events.html)
//! and [JSON Lines](https://jsonlines.org/), the two framings AI-style
//! streaming APIs send chat-completion deltas, log lines and the like over.
//!
//! A chunked HTTP body arrives as arbitrary byte slices: chunk boundaries fall
//! inside multi-byte UTF-8 codepoints and inside logical events. `evstream`
//! reassembles those chunks into discrete, typed events lazily, one event per
//! pull, without ever buffering the whole response.
//!
//! The crate is layered:
//!
//! - [`EventStream`] / [`JsonlStream`] - generic [`Stream`][futures_core::Stream]
//!   adapters converting any `Stream<Item = Result<impl AsRef<[u8]>, E>>`
//!   into parsed [`Event`][event::Event]s or [`JsonlEvent`][event::JsonlEvent]s.
//! - [`blocking::EventIter`] / [`blocking::JsonlIter`] - the same adapters
//!   over a plain [`Iterator`] of byte chunks, for synchronous callers.
//! - [`decoder`] - the underlying I/O-free state machines
//!   ([`SseDecoder`][decoder::SseDecoder], [`JsonlDecoder`][decoder::JsonlDecoder]),
//!   plus [`AnyDecoder`][decoder::AnyDecoder] for selecting a framing from a
//!   declared content type.
//! - [`JsonStream`][json_stream::JsonStream] (requires `json` feature) -
//!   deserialises each event's payload into a typed value via [`serde_json`].
//! - [`Utf8Stream`][utf8_stream::Utf8Stream] and the
//!   [`Utf8Decoder`][utf8_stream::Utf8Decoder] codec - incremental UTF-8
//!   validation that buffers incomplete multi-byte sequences across chunks.
//! - Low-level line parsing via [`parser`] for custom integrations.
//!
//! # Consuming an OpenAI-style chat stream
//!
//! Streams of chat deltas conventionally end with a `[DONE]` sentinel event;
//! [`EventStream::with_terminator`] stops iteration there without yielding
//! the sentinel:
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let response = reqwest::Client::new()
//!     .post("https://api.example.com/v1/chat/completions")
//!     .send()
//!     .await?;
//!
//! let mut stream = evstream::response_to_stream(response).with_terminator("[DONE]");
//!
//! while let Some(event) = stream.next().await {
//!     println!("{}", event?.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Using `EventStream` directly
//!
//! If you already have a byte stream (from any HTTP client, WebSocket, file,
//! etc.) you can use [`EventStream`] without the `reqwest` feature:
//!
//! ```rust
//! use bytes::Bytes;
//! use futures::StreamExt;
//! use evstream::{EventStream, SseDecoder};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(Bytes::from("data: hello\n\ndata: world\n\n")),
//! ];
//! let mut stream = EventStream::<_, SseDecoder>::new(futures::stream::iter(chunks));
//!
//! while let Some(Ok(event)) = stream.next().await {
//!     println!("{}", event.data);
//! }
//! # }
//! ```
//!
//! # Blocking callers
//!
//! ```rust
//! use bytes::Bytes;
//! use evstream::blocking::JsonlIter;
//!
//! let chunks = vec![Ok::<_, std::io::Error>(Bytes::from("{\"n\":1}\n{\"n\":2}\n"))];
//!
//! for line in JsonlIter::new(chunks.into_iter()) {
//!     println!("{}", line.unwrap().raw);
//! }
//! ```
//!
//! # Feature flags
//!
//! | Feature | Default | Description | no std? |
//! | --- | --- | --- | --- |
//! | `serde` | off | Derives [`Serialize`][::serde::Serialize] and [`Deserialize`][::serde::Deserialize] on the event types. | false |
//! | `std` | off | Enables standard library support in core dependencies (`bytes`, `memchr`, `futures-core`, etc.). Notably enables runtime SIMD for memchr. Turned on automatically by `reqwest` and `json`. | false |
//! | `reqwest` | off | Adapters from a [`reqwest::Response`][::reqwest::Response] to event streams, including Content-Type negotiation. | false |
//! | `json` | off | Provides [`JsonStream`][json_stream::JsonStream]/[`JsonIter`][json_stream::JsonIter] for deserialising event payloads into typed values via [`serde_json`], with plain or [`serde_path_to_error`] errors. | false |
//!
//! Without any features enabled, the crate is fully `no_std` compatible and
//! provides the stream adapters, blocking iterators, decoders and the
//! low-level parser.

#![cfg_attr(not(feature = "std"), no_std)]

pub(crate) mod constants;

pub mod blocking;
pub mod decoder;
pub mod errors;
pub mod event;
pub mod event_stream;
pub mod parser;
#[cfg(feature = "reqwest")]
pub mod reqwest;
pub mod utf8_stream;

#[cfg(feature = "json")]
pub mod json_stream;

pub use decoder::{AnyDecoder, EventDecoder, JsonlDecoder, SseDecoder};
pub use event::{AnyEvent, Event, JsonlEvent, Payload};
pub use event_stream::{AnyStream, EventStream, JsonlStream};

#[cfg(feature = "reqwest")]
pub use reqwest::{response_to_any_stream, response_to_jsonl_stream, response_to_stream};
