//! Adapters from a [`reqwest::Response`] body to event streams.
//!
//! The stream owns the response body, so dropping the stream (or letting it
//! fall out of scope after a break or an error) releases the connection.
//! Reconnection and retry are deliberately not handled here; if a dropped
//! stream can be resumed at all, that is the caller's transport policy.

use core::fmt::{Display, Formatter};

use http_body_util::BodyDataStream;
use reqwest::{Body, Response, header::CONTENT_TYPE};

use crate::{
    decoder::AnyDecoder,
    errors::UnsupportedContentType,
    event_stream::{AnyStream, EventStream, JsonlStream},
};

/// No decoder could be selected for a response at stream construction
#[derive(Debug)]
pub enum NegotiationError {
    /// The response declared no content type at all
    MissingContentType,
    /// The Content-Type header was not visible ASCII
    OpaqueContentType,
    /// The declared content type maps to no known decoder
    Unsupported(UnsupportedContentType),
}

impl Display for NegotiationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            NegotiationError::MissingContentType => f.write_str("response has no content type"),
            NegotiationError::OpaqueContentType => {
                f.write_str("response content type is not visible ascii")
            }
            NegotiationError::Unsupported(e) => e.fmt(f),
        }
    }
}

impl core::error::Error for NegotiationError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            NegotiationError::Unsupported(e) => Some(e),
            _ => None,
        }
    }
}

/// Convert a [`Response`] into an SSE [`EventStream`] via a similar mechanism
/// to [`Response::bytes_stream`]
pub fn response_to_stream(response: Response) -> EventStream<BodyDataStream<Body>> {
    EventStream::new(BodyDataStream::new(Body::from(response)))
}

/// Convert a [`Response`] into a [`JsonlStream`] of JSON Lines records
pub fn response_to_jsonl_stream(response: Response) -> JsonlStream<BodyDataStream<Body>> {
    JsonlStream::new(BodyDataStream::new(Body::from(response)))
}

/// Convert a [`Response`] into an [`AnyStream`], selecting the decoder from
/// the response's `Content-Type`. Fails fast at construction when no decoder
/// matches; nothing is read from the body in that case.
pub fn response_to_any_stream(
    response: Response,
) -> Result<AnyStream<BodyDataStream<Body>>, NegotiationError> {
    let decoder = match response.headers().get(CONTENT_TYPE) {
        None => return Err(NegotiationError::MissingContentType),
        Some(value) => {
            let content_type = value
                .to_str()
                .map_err(|_| NegotiationError::OpaqueContentType)?;
            AnyDecoder::for_content_type(content_type).map_err(NegotiationError::Unsupported)?
        }
    };

    Ok(EventStream::with_decoder(
        BodyDataStream::new(Body::from(response)),
        decoder,
    ))
}
