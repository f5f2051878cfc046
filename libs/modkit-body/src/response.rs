use crate::body::Source;
use crate::builder::ResponseBuilder;
use crate::charset::{apparent_encoding, declared_encoding, encoding_for_label};
use crate::config::ResponseConfig;
use crate::decoders::{DecodeError, DecoderChain, TextDecoder};
use crate::error::{BoxError, HttpError, UsageError};
use crate::iter::{ByteChunks, Feed, Lines, RawChunks, TextChunks};
use crate::request::RequestHead;
use bytes::{Bytes, BytesMut};
use encoding_rs::Encoding;
use futures::Stream;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Consumption state of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Nothing has been pulled from the source yet
    Unread,
    /// At least one chunk has been pulled and the source is still open
    Streaming,
    /// The source was exhausted, failed, or was closed
    Closed,
}

#[derive(Clone, Copy)]
enum Model {
    Blocking,
    Async,
}

/// Map a content decoding failure to the error the caller sees.
///
/// With a request attached the error cites its method and URI; without one
/// it is reported as invalid content.
pub fn decoding_error(request: Option<&RequestHead>, source: DecodeError) -> HttpError {
    match request {
        Some(request) => HttpError::Decoding {
            method: request.method().clone(),
            uri: request.uri().clone(),
            source,
        },
        None => HttpError::InvalidContent { source },
    }
}

/// An HTTP response whose body is pulled on demand.
///
/// The body comes from exactly one source, either blocking or async, and
/// can be consumed once: by [`read`](Self::read) / [`aread`](Self::aread),
/// which materialize the decoded content, or by one of the iterators.
/// Blocking operations on an async source, and the reverse, fail with a
/// [`UsageError`] instead of being adapted.
///
/// # Example
///
/// ```ignore
/// use modkit_body::Response;
///
/// let mut response = Response::builder()
///     .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
///     .blocking_stream(BlockingStream::from_chunks(chunks))
///     .build()?;
///
/// for line in response.iter_lines()? {
///     handle(line?);
/// }
/// response.close()?;
/// ```
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    request: Option<Arc<RequestHead>>,
    config: ResponseConfig,
    source: Source,
    decoder: DecoderChain,
    state: StreamState,
    stream_consumed: bool,
    closed_explicitly: bool,
    decoder_finished: bool,
    content: Option<Bytes>,
    text: Option<String>,
    explicit_encoding: Option<&'static Encoding>,
    num_bytes_downloaded: usize,
    decoded_bytes: usize,
    started: Instant,
    elapsed: Option<Duration>,
}

impl Response {
    /// Start building a response
    #[must_use]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    pub(crate) fn new(
        status: StatusCode,
        headers: HeaderMap,
        request: Option<Arc<RequestHead>>,
        config: ResponseConfig,
        source: Source,
        decoder: DecoderChain,
    ) -> Self {
        Self {
            status,
            headers,
            request,
            config,
            source,
            decoder,
            state: StreamState::Unread,
            stream_consumed: false,
            closed_explicitly: false,
            decoder_finished: false,
            content: None,
            text: None,
            explicit_encoding: None,
            num_bytes_downloaded: 0,
            decoded_bytes: 0,
            started: Instant::now(),
            elapsed: None,
        }
    }

    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Canonical reason phrase, empty for codes without one
    #[must_use]
    pub fn reason_phrase(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or_default()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `true` for 4xx and 5xx statuses
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    #[must_use]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// The originating request.
    ///
    /// # Errors
    /// Returns [`UsageError::RequestNotSet`] when no request was attached.
    pub fn request(&self) -> Result<&RequestHead, HttpError> {
        self.request
            .as_deref()
            .ok_or(HttpError::Usage(UsageError::RequestNotSet))
    }

    /// Attach the originating request, replacing any previous one
    pub fn set_request(&mut self, request: impl Into<Arc<RequestHead>>) {
        self.request = Some(request.into());
    }

    /// Raw (still encoded) bytes pulled from the source so far
    #[must_use]
    pub fn num_bytes_downloaded(&self) -> usize {
        self.num_bytes_downloaded
    }

    #[must_use]
    pub fn stream_state(&self) -> StreamState {
        self.state
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// `true` once anything has been pulled from the source
    #[must_use]
    pub fn is_stream_consumed(&self) -> bool {
        self.stream_consumed
    }

    /// Time from construction until the body was closed.
    ///
    /// # Errors
    /// Returns [`UsageError::ElapsedUnavailable`] while the body is open.
    pub fn elapsed(&self) -> Result<Duration, HttpError> {
        self.elapsed
            .ok_or(HttpError::Usage(UsageError::ElapsedUnavailable))
    }

    /// The text encoding set explicitly, or else the one declared by
    /// `Content-Type`. A guessed encoding is not reported here; see
    /// [`apparent_encoding`](Self::apparent_encoding).
    #[must_use]
    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.explicit_encoding
            .or_else(|| declared_encoding(&self.headers))
    }

    /// Override the text encoding.
    ///
    /// Allowed before anything was pulled, or once the content is
    /// materialized, in which case cached text is decoded again.
    ///
    /// # Errors
    /// Returns [`UsageError::EncodingFrozen`] while the body is streaming
    /// or after it was closed without being read.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) -> Result<(), HttpError> {
        if self.content.is_none() && self.state != StreamState::Unread {
            return Err(UsageError::EncodingFrozen.into());
        }
        self.explicit_encoding = Some(encoding);
        self.text = None;
        Ok(())
    }

    /// Override the text encoding by label, e.g. `"latin-1"`.
    ///
    /// # Errors
    /// Returns [`HttpError::UnknownEncoding`] for an unrecognized label, or
    /// the errors of [`set_encoding`](Self::set_encoding).
    pub fn set_encoding_label(&mut self, label: &str) -> Result<(), HttpError> {
        let encoding = encoding_for_label(label)
            .ok_or_else(|| HttpError::UnknownEncoding(label.to_owned()))?;
        self.set_encoding(encoding)
    }

    /// Best-effort guess of the content's encoding.
    ///
    /// # Errors
    /// Returns [`HttpError::ResponseNotRead`] before the content is
    /// materialized.
    pub fn apparent_encoding(&self) -> Result<&'static Encoding, HttpError> {
        let content = self.content()?;
        let window = content.len().min(self.config.detection_window);
        Ok(apparent_encoding(
            &content[..window],
            self.config.default_encoding,
        ))
    }

    /// The materialized, decoded content.
    ///
    /// # Errors
    /// Returns [`HttpError::ResponseNotRead`] before `read()`/`aread()`.
    pub fn content(&self) -> Result<&Bytes, HttpError> {
        self.content.as_ref().ok_or(HttpError::ResponseNotRead)
    }

    /// The materialized content decoded as text. Decoded once and cached.
    ///
    /// # Errors
    /// Returns [`HttpError::ResponseNotRead`] before `read()`/`aread()`.
    pub fn text(&mut self) -> Result<&str, HttpError> {
        let content = self.content.as_ref().ok_or(HttpError::ResponseNotRead)?;
        let text = match self.text.take() {
            Some(text) => text,
            None => {
                let mut decoder = self.text_decoder();
                let mut text = decoder.decode(content);
                text.push_str(&decoder.flush());
                text
            }
        };
        Ok(self.text.insert(text).as_str())
    }

    /// Deserialize the materialized text as JSON.
    ///
    /// # Errors
    /// Returns [`HttpError::ResponseNotRead`] before `read()`/`aread()` and
    /// [`HttpError::Json`] when parsing fails.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, HttpError> {
        let value = serde_json::from_str(self.text()?)?;
        Ok(value)
    }

    /// Check the status against the attached request.
    ///
    /// # Errors
    /// Returns [`UsageError::RequestNotSet`] without a request and
    /// [`HttpError::HttpStatus`] for 4xx/5xx statuses.
    pub fn error_for_status(&self) -> Result<&Self, HttpError> {
        let request = self.request()?;
        if self.is_error() {
            return Err(HttpError::HttpStatus {
                status: self.status,
                method: request.method().clone(),
                uri: request.uri().clone(),
            });
        }
        Ok(self)
    }

    /// Read the whole body through the content decoders and cache it.
    ///
    /// Returns the cached content when called again.
    ///
    /// # Errors
    /// - [`HttpError::StreamConsumed`] after iteration has begun
    /// - [`HttpError::ResponseClosed`] after `close()`
    /// - [`UsageError::BlockingOnAsyncSource`] for an async source
    /// - decoding, transport and size-limit errors from the body itself
    pub fn read(&mut self) -> Result<Bytes, HttpError> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        self.check_readable()?;
        self.check_model(Model::Blocking)?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_decoded_blocking()? {
            buf.extend_from_slice(&chunk);
        }
        Ok(self.materialize(buf))
    }

    /// Async form of [`read`](Self::read).
    ///
    /// # Errors
    /// As [`read`](Self::read), with [`UsageError::AsyncOnBlockingSource`]
    /// for a blocking source.
    pub async fn aread(&mut self) -> Result<Bytes, HttpError> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        self.check_readable()?;
        self.check_model(Model::Async)?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_decoded_async().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(self.materialize(buf))
    }

    /// Iterate over raw chunks exactly as the source delivers them.
    ///
    /// # Errors
    /// [`HttpError::StreamConsumed`] once anything was pulled (including by
    /// `read()`), [`HttpError::ResponseClosed`] after `close()`, or a
    /// [`UsageError`] for an async source.
    pub fn iter_raw(&mut self) -> Result<RawChunks<'_>, HttpError> {
        self.begin_raw(Model::Blocking)?;
        Ok(RawChunks::new(self))
    }

    /// Async form of [`iter_raw`](Self::iter_raw).
    ///
    /// # Errors
    /// As [`iter_raw`](Self::iter_raw).
    pub fn aiter_raw(
        &mut self,
    ) -> Result<impl Stream<Item = Result<Bytes, HttpError>> + Send + '_, HttpError> {
        self.begin_raw(Model::Async)?;
        Ok(RawChunks::new(self).into_stream())
    }

    /// Iterate over decoded chunks. A materialized body yields its content.
    ///
    /// # Errors
    /// As [`iter_raw`](Self::iter_raw), except on a materialized body.
    pub fn iter_bytes(&mut self) -> Result<ByteChunks<'_>, HttpError> {
        let feed = self.begin_decoded(Model::Blocking)?;
        Ok(ByteChunks::new(self, feed))
    }

    /// Async form of [`iter_bytes`](Self::iter_bytes).
    ///
    /// # Errors
    /// As [`iter_bytes`](Self::iter_bytes).
    pub fn aiter_bytes(
        &mut self,
    ) -> Result<impl Stream<Item = Result<Bytes, HttpError>> + Send + '_, HttpError> {
        let feed = self.begin_decoded(Model::Async)?;
        Ok(ByteChunks::new(self, feed).into_stream())
    }

    /// Iterate over decoded text fragments.
    ///
    /// # Errors
    /// As [`iter_bytes`](Self::iter_bytes).
    pub fn iter_text(&mut self) -> Result<TextChunks<'_>, HttpError> {
        let feed = self.begin_decoded(Model::Blocking)?;
        let decoder = self.text_decoder();
        Ok(TextChunks::new(self, feed, decoder))
    }

    /// Async form of [`iter_text`](Self::iter_text).
    ///
    /// # Errors
    /// As [`iter_bytes`](Self::iter_bytes).
    pub fn aiter_text(
        &mut self,
    ) -> Result<impl Stream<Item = Result<String, HttpError>> + Send + '_, HttpError> {
        let feed = self.begin_decoded(Model::Async)?;
        let decoder = self.text_decoder();
        Ok(TextChunks::new(self, feed, decoder).into_stream())
    }

    /// Iterate over lines, each ending in `\n` except possibly the last.
    ///
    /// # Errors
    /// As [`iter_bytes`](Self::iter_bytes).
    pub fn iter_lines(&mut self) -> Result<Lines<'_>, HttpError> {
        let feed = self.begin_decoded(Model::Blocking)?;
        let decoder = self.text_decoder();
        Ok(Lines::new(self, feed, decoder))
    }

    /// Async form of [`iter_lines`](Self::iter_lines).
    ///
    /// # Errors
    /// As [`iter_bytes`](Self::iter_bytes).
    pub fn aiter_lines(
        &mut self,
    ) -> Result<impl Stream<Item = Result<String, HttpError>> + Send + '_, HttpError> {
        let feed = self.begin_decoded(Model::Async)?;
        let decoder = self.text_decoder();
        Ok(Lines::new(self, feed, decoder).into_stream())
    }

    /// Close the body, dropping the source without reading the rest.
    ///
    /// Does nothing on a body that is already closed.
    ///
    /// # Errors
    /// Returns [`UsageError::BlockingOnAsyncSource`] while an async source
    /// is still held.
    pub fn close(&mut self) -> Result<(), HttpError> {
        if self.source.is_async() {
            return Err(UsageError::BlockingOnAsyncSource.into());
        }
        self.release();
        Ok(())
    }

    /// Async form of [`close`](Self::close).
    ///
    /// # Errors
    /// Returns [`UsageError::AsyncOnBlockingSource`] while a blocking
    /// source is still held.
    #[allow(clippy::unused_async)]
    pub async fn aclose(&mut self) -> Result<(), HttpError> {
        if self.source.is_blocking() {
            return Err(UsageError::AsyncOnBlockingSource.into());
        }
        self.release();
        Ok(())
    }

    pub(crate) fn text_decoder(&self) -> TextDecoder {
        TextDecoder::new(
            self.encoding(),
            self.config.detection_window,
            self.config.default_encoding,
        )
    }

    fn check_readable(&self) -> Result<(), HttpError> {
        if self.closed_explicitly {
            return Err(HttpError::ResponseClosed);
        }
        if self.stream_consumed {
            return Err(HttpError::StreamConsumed);
        }
        Ok(())
    }

    fn check_model(&self, model: Model) -> Result<(), UsageError> {
        match (model, &self.source) {
            (Model::Blocking, Source::Async(_)) => Err(UsageError::BlockingOnAsyncSource),
            (Model::Async, Source::Blocking(_)) => Err(UsageError::AsyncOnBlockingSource),
            _ => Ok(()),
        }
    }

    fn begin_raw(&self, model: Model) -> Result<(), HttpError> {
        if self.content.is_some() {
            return Err(HttpError::StreamConsumed);
        }
        self.check_readable()?;
        self.check_model(model)?;
        Ok(())
    }

    fn begin_decoded(&self, model: Model) -> Result<Feed, HttpError> {
        if let Some(content) = &self.content {
            return Ok(Feed::Cached(Some(content.clone())));
        }
        self.check_readable()?;
        self.check_model(model)?;
        Ok(Feed::Live)
    }

    fn materialize(&mut self, buf: BytesMut) -> Bytes {
        let content = buf.freeze();
        self.content = Some(content.clone());
        self.text = None;
        content
    }

    /// Pull the next non-empty raw chunk from a blocking source.
    pub(crate) fn next_raw_blocking(&mut self) -> Result<Option<Bytes>, HttpError> {
        loop {
            let next = match &mut self.source {
                Source::Blocking(stream) => stream.next(),
                Source::Async(_) => return Err(UsageError::BlockingOnAsyncSource.into()),
                Source::Released => None,
            };
            match self.on_raw(next)? {
                Some(chunk) if chunk.is_empty() => {}
                chunk => return Ok(chunk),
            }
        }
    }

    /// Pull the next non-empty raw chunk from an async source. Trailer
    /// frames are skipped.
    pub(crate) async fn next_raw_async(&mut self) -> Result<Option<Bytes>, HttpError> {
        loop {
            let next = match &mut self.source {
                Source::Async(body) => match body.frame().await {
                    Some(Ok(frame)) => match frame.into_data() {
                        Ok(chunk) => Some(Ok(chunk)),
                        Err(_trailers) => continue,
                    },
                    Some(Err(err)) => Some(Err(err)),
                    None => None,
                },
                Source::Blocking(_) => return Err(UsageError::AsyncOnBlockingSource.into()),
                Source::Released => None,
            };
            match self.on_raw(next)? {
                Some(chunk) if chunk.is_empty() => {}
                chunk => return Ok(chunk),
            }
        }
    }

    fn on_raw(
        &mut self,
        next: Option<Result<Bytes, BoxError>>,
    ) -> Result<Option<Bytes>, HttpError> {
        self.stream_consumed = true;
        if self.state == StreamState::Unread {
            self.state = StreamState::Streaming;
        }
        match next {
            Some(Ok(chunk)) => {
                self.num_bytes_downloaded += chunk.len();
                tracing::trace!(
                    len = chunk.len(),
                    total = self.num_bytes_downloaded,
                    "received raw chunk"
                );
                Ok(Some(chunk))
            }
            Some(Err(err)) => {
                self.finish();
                Err(HttpError::Transport(err))
            }
            None => {
                self.finish();
                Ok(None)
            }
        }
    }

    /// Pull raw chunks until the decoders produce output or the body ends.
    pub(crate) fn next_decoded_blocking(&mut self) -> Result<Option<Bytes>, HttpError> {
        while !self.decoder_finished {
            let raw = self
                .next_raw_blocking()
                .inspect_err(|_| self.decoder_finished = true)?;
            let decoded = self.decode_step(raw)?;
            if !decoded.is_empty() {
                return Ok(Some(decoded));
            }
        }
        Ok(None)
    }

    pub(crate) async fn next_decoded_async(&mut self) -> Result<Option<Bytes>, HttpError> {
        while !self.decoder_finished {
            let raw = self
                .next_raw_async()
                .await
                .inspect_err(|_| self.decoder_finished = true)?;
            let decoded = self.decode_step(raw)?;
            if !decoded.is_empty() {
                return Ok(Some(decoded));
            }
        }
        Ok(None)
    }

    /// Run one raw chunk (or, at the end, the flush) through the decoder
    /// chain and enforce the size limit on the output.
    fn decode_step(&mut self, raw: Option<Bytes>) -> Result<Bytes, HttpError> {
        let limit = self.config.max_body_size;
        let remaining = limit.saturating_sub(self.decoded_bytes);
        let decoded = match raw {
            Some(chunk) => self.decoder.decode(chunk, remaining),
            None => {
                self.decoder_finished = true;
                self.decoder.flush(remaining)
            }
        };
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(DecodeError::TooLarge { codec, produced }) => {
                tracing::debug!(codec, limit, "decoded body exceeds the size limit");
                self.abort();
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: self.decoded_bytes.saturating_add(produced),
                });
            }
            Err(err) => {
                self.abort();
                return Err(decoding_error(self.request.as_deref(), err));
            }
        };

        self.decoded_bytes += decoded.len();
        if self.decoded_bytes > self.config.max_body_size {
            self.abort();
            return Err(HttpError::BodyTooLarge {
                limit: self.config.max_body_size,
                actual: self.decoded_bytes,
            });
        }
        Ok(decoded)
    }

    fn abort(&mut self) {
        self.decoder_finished = true;
        self.finish();
    }

    /// Drop the source and enter the terminal state.
    fn finish(&mut self) {
        self.source = Source::Released;
        if self.state != StreamState::Closed {
            self.state = StreamState::Closed;
            self.elapsed = Some(self.started.elapsed());
        }
    }

    fn release(&mut self) {
        if self.state == StreamState::Closed {
            return;
        }
        if self.state == StreamState::Streaming {
            tracing::debug!(
                num_bytes_downloaded = self.num_bytes_downloaded,
                "closing partially consumed response body"
            );
        }
        self.closed_explicitly = true;
        self.finish();
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Response [{} {}]>",
            self.status.as_u16(),
            self.reason_phrase()
        )
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("state", &self.state)
            .field("source", &self.source)
            .field("decoder", &self.decoder)
            .field("num_bytes_downloaded", &self.num_bytes_downloaded)
            .finish_non_exhaustive()
    }
}
