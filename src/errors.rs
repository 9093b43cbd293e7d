//! [`Error`][core::error::Error] implementations used across the crate

use core::{
    fmt::{Display, Formatter},
    str::Utf8Error,
};

use bytes_utils::Str;

macro_rules! impl_samey_error {
    ($vis:vis enum $name:ident) => {
        #[derive(Debug, PartialEq)]
        $vis enum $name<E> {
            /// Something went wrong with the underlying stream
            Transport(E),
            /// The stream had invalid utf8
            Utf8Error(Utf8Error),
        }

        impl<E> From<Utf8Error> for $name<E> {
            fn from(value: Utf8Error) -> Self {
                Self::Utf8Error(value)
            }
        }

        impl<E> Display for $name<E>
        where
            E: Display,
        {
            fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
                match self {
                    $name::Transport(e) => e.fmt(f),
                    $name::Utf8Error(e) => e.fmt(f),
                }
            }
        }

        impl<E> core::error::Error for $name<E> where E: core::error::Error {}
    };
}

impl_samey_error!(pub enum EventStreamError);
impl_samey_error!(pub enum Utf8StreamError);

/// The declared content type maps to no known decoder.
///
/// Returned by [`AnyDecoder::for_content_type`][crate::decoder::AnyDecoder::for_content_type].
/// Decoder selection fails fast rather than guessing a framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedContentType {
    content_type: Str,
}

impl UnsupportedContentType {
    pub(crate) fn new(content_type: impl Into<Str>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }

    /// The content type as it was declared, parameters included
    pub fn content_type(&self) -> &Str {
        &self.content_type
    }
}

impl Display for UnsupportedContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "unsupported content type: {}", self.content_type)
    }
}

impl core::error::Error for UnsupportedContentType {}
