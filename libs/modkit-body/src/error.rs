use crate::decoders::DecodeError;
use http::{Method, StatusCode, Uri};
use thiserror::Error;

/// Boxed error yielded by a raw chunk source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Programming mistakes made by the caller of a [`Response`](crate::Response).
///
/// These are never transient: retrying the same call on the same response
/// fails the same way. They are kept apart from the recoverable
/// [`HttpError`] variants so callers can match on them as a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UsageError {
    /// A blocking operation was invoked on a body fed by an async source
    #[error("Attempted to call a blocking operation on an async response body")]
    BlockingOnAsyncSource,

    /// An async operation was invoked on a body fed by a blocking source
    #[error("Attempted to call an async operation on a blocking response body")]
    AsyncOnBlockingSource,

    /// `elapsed()` was read before the body reached the closed state
    #[error("Elapsed time is only available once the response body is closed")]
    ElapsedUnavailable,

    /// The response carries no request back-reference
    #[error("The request instance has not been set on this response")]
    RequestNotSet,

    /// The encoding was reassigned after text decoding had begun
    #[error("Cannot change the encoding once the response body is being streamed")]
    EncodingFrozen,
}

/// Response body error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// Content could not be decoded and no request is attached for context
    #[error("Invalid response content: {source}")]
    InvalidContent {
        #[source]
        source: DecodeError,
    },

    /// Content could not be decoded for the attached request
    #[error("Failed to decode response to {method} {uri}: {source}")]
    Decoding {
        method: Method,
        uri: Uri,
        #[source]
        source: DecodeError,
    },

    /// The raw chunk source failed
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// Decompressed body exceeded the configured size limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// The raw stream was already pulled by an earlier read or iteration
    #[error("Attempted to read or stream response content, but the content has already been streamed")]
    StreamConsumed,

    /// The response was closed before its content was read
    #[error("Attempted to read or stream response content, but the response has been closed")]
    ResponseClosed,

    /// Materialized content was accessed before `read()`/`aread()`
    #[error("Attempted to access response content without having called read()")]
    ResponseNotRead,

    /// An explicit encoding label that no codec recognizes
    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),

    /// HTTP 4xx/5xx status on a response with an attached request
    #[error("HTTP {status} for {method} {uri}")]
    HttpStatus {
        status: StatusCode,
        method: Method,
        uri: Uri,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Caller misuse; see [`UsageError`]
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl HttpError {
    /// Returns `true` when the error signals a programming mistake rather
    /// than a property of the content or the transport.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, HttpError::Usage(_))
    }

    /// Returns `true` for the content decoding failures, with or without
    /// request context.
    #[must_use]
    pub fn is_decoding_error(&self) -> bool {
        matches!(
            self,
            HttpError::InvalidContent { .. } | HttpError::Decoding { .. }
        )
    }
}
