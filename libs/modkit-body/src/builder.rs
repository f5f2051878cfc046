use crate::body::{BlockingStream, ResponseBody, Source, body_from_stream};
use crate::config::ResponseConfig;
use crate::decoders::DecoderChain;
use crate::error::{BoxError, HttpError};
use crate::request::RequestHead;
use crate::response::{Response, decoding_error};
use bytes::Bytes;
use futures::Stream;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::sync::Arc;

/// Where the body of the response being built comes from.
enum Content {
    Empty,
    Bytes(Bytes),
    Blocking(BlockingStream),
    Async(ResponseBody),
}

/// Builder for a [`Response`].
///
/// In-memory content is decoded during [`build`](Self::build), so the
/// built response is already read and closed. Streamed content is left
/// unread until the caller consumes it.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    request: Option<Arc<RequestHead>>,
    config: ResponseConfig,
    content: Content,
}

impl ResponseBuilder {
    /// Create a builder for an empty `200 OK` response
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            request: None,
            config: ResponseConfig::default(),
            content: Content::Empty,
        }
    }

    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Append a header value, keeping earlier values for the same name
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace all headers
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach the originating request for error context
    #[must_use]
    pub fn request(mut self, request: impl Into<Arc<RequestHead>>) -> Self {
        self.request = Some(request.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: ResponseConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the limit on decompressed body bytes
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// In-memory body, decoded eagerly by [`build`](Self::build)
    #[must_use]
    pub fn content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = Content::Bytes(content.into());
        self
    }

    /// Blocking chunk source
    #[must_use]
    pub fn blocking_stream(mut self, stream: BlockingStream) -> Self {
        self.content = Content::Blocking(stream);
        self
    }

    /// Async body source
    #[must_use]
    pub fn async_body(mut self, body: ResponseBody) -> Self {
        self.content = Content::Async(body);
        self
    }

    /// Async chunk source from a stream
    #[must_use]
    pub fn async_stream<S, B, E>(self, stream: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<Bytes>,
        E: Into<BoxError>,
    {
        self.async_body(body_from_stream(stream))
    }

    /// Build the response.
    ///
    /// # Errors
    /// Returns [`HttpError::Decoding`] (with a request) or
    /// [`HttpError::InvalidContent`] (without one) when `Content-Encoding`
    /// cannot be decoded, including corrupt in-memory content, and
    /// [`HttpError::BodyTooLarge`] when in-memory content decodes past the
    /// size limit.
    pub fn build(self) -> Result<Response, HttpError> {
        let decoder = DecoderChain::from_headers(&self.headers)
            .map_err(|err| decoding_error(self.request.as_deref(), err))?;

        let (source, eager) = match self.content {
            Content::Empty => (Source::Blocking(BlockingStream::empty()), true),
            Content::Bytes(bytes) => (
                Source::Blocking(BlockingStream::from_chunks(std::iter::once(bytes))),
                true,
            ),
            Content::Blocking(stream) => (Source::Blocking(stream), false),
            Content::Async(body) => (Source::Async(body), false),
        };

        let mut response = Response::new(
            self.status,
            self.headers,
            self.request,
            self.config,
            source,
            decoder,
        );
        if eager {
            response.read()?;
        }
        Ok(response)
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
