//! Raw chunk sources a [`Response`](crate::Response) can be fed from.
//!
//! A source is either blocking ([`BlockingStream`]) or async
//! ([`ResponseBody`]). Releasing a source means dropping it, so whatever a
//! transport attaches to the stream (a pooled connection, a file handle)
//! is returned when the response closes.

use crate::error::BoxError;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use std::fmt;

/// Type alias for the boxed async body a response reads from.
///
/// The body is type-erased so any `http_body::Body` (a hyper `Incoming`,
/// a `StreamBody`, a test fixture) can back a response. It is `Send` but
/// not `Sync`: a response is a single-owner resource.
pub type ResponseBody = http_body_util::combinators::UnsyncBoxBody<Bytes, BoxError>;

/// Box any `http_body::Body` as a [`ResponseBody`].
pub fn body_from<B>(body: B) -> ResponseBody
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(|err| -> BoxError { err.into() }).boxed_unsync()
}

/// Wrap a stream of byte chunks as a [`ResponseBody`].
pub fn body_from_stream<S, B, E>(stream: S) -> ResponseBody
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: Into<Bytes>,
    E: Into<BoxError>,
{
    let frames = stream
        .map_ok(|chunk| Frame::data(chunk.into()))
        .map_err(|err| -> BoxError { err.into() });
    StreamBody::new(frames).boxed_unsync()
}

/// Blocking raw chunk source: a boxed iterator of byte chunks.
pub struct BlockingStream {
    inner: Box<dyn Iterator<Item = Result<Bytes, BoxError>> + Send>,
}

impl BlockingStream {
    /// Wrap a fallible chunk iterator.
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Result<Bytes, BoxError>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(chunks.into_iter()),
        }
    }

    /// Wrap an infallible chunk iterator.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: Send + 'static,
        B: Into<Bytes>,
    {
        Self::new(chunks.into_iter().map(|chunk| Ok(chunk.into())))
    }

    /// A source that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for BlockingStream {
    type Item = Result<Bytes, BoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for BlockingStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingStream").finish_non_exhaustive()
    }
}

/// The source currently owned by a response.
pub enum Source {
    Blocking(BlockingStream),
    Async(ResponseBody),
    /// Exhausted, closed, or never present
    Released,
}

impl Source {
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Source::Async(_))
    }

    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Source::Blocking(_))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Blocking(_) => "Blocking",
            Source::Async(_) => "Async",
            Source::Released => "Released",
        })
    }
}
