//! Pull-based iterators and streams over a [`Response`] body.
//!
//! Every view borrows the response mutably, so nothing else can touch the
//! body while it is being iterated. Dropping a view part-way leaves the
//! response open; call `close()`/`aclose()` to release the source.

use crate::decoders::{LineDecoder, TextDecoder};
use crate::error::HttpError;
use crate::response::Response;
use bytes::Bytes;
use futures::Stream;
use std::collections::VecDeque;

/// Where decoded chunks come from.
pub enum Feed {
    /// The content was already materialized; yield it once
    Cached(Option<Bytes>),
    /// Pull from the response's source
    Live,
}

/// The transformation applied to each decoded chunk.
pub trait Stage {
    type Item;

    fn push(&mut self, chunk: &Bytes, out: &mut VecDeque<Self::Item>);

    fn finish(&mut self, out: &mut VecDeque<Self::Item>);
}

pub struct BytesStage;

impl Stage for BytesStage {
    type Item = Bytes;

    fn push(&mut self, chunk: &Bytes, out: &mut VecDeque<Bytes>) {
        if !chunk.is_empty() {
            out.push_back(chunk.clone());
        }
    }

    fn finish(&mut self, _out: &mut VecDeque<Bytes>) {}
}

pub struct TextStage {
    decoder: TextDecoder,
}

impl Stage for TextStage {
    type Item = String;

    fn push(&mut self, chunk: &Bytes, out: &mut VecDeque<String>) {
        let text = self.decoder.decode(chunk);
        if !text.is_empty() {
            out.push_back(text);
        }
    }

    fn finish(&mut self, out: &mut VecDeque<String>) {
        let text = self.decoder.flush();
        if !text.is_empty() {
            out.push_back(text);
        }
    }
}

pub struct LineStage {
    text: TextDecoder,
    lines: LineDecoder,
}

impl Stage for LineStage {
    type Item = String;

    fn push(&mut self, chunk: &Bytes, out: &mut VecDeque<String>) {
        let text = self.text.decode(chunk);
        out.extend(self.lines.decode(&text));
    }

    fn finish(&mut self, out: &mut VecDeque<String>) {
        let tail = self.text.flush();
        out.extend(self.lines.decode(&tail));
        out.extend(self.lines.flush());
    }
}

/// Decoded chunks pushed through a [`Stage`], buffered until pulled.
pub struct Chunks<'a, S: Stage> {
    response: &'a mut Response,
    feed: Feed,
    stage: S,
    ready: VecDeque<S::Item>,
    done: bool,
}

impl<'a, S: Stage> Chunks<'a, S> {
    fn new(response: &'a mut Response, feed: Feed, stage: S) -> Self {
        Self {
            response,
            feed,
            stage,
            ready: VecDeque::new(),
            done: false,
        }
    }

    fn next_blocking(&mut self) -> Option<Result<S::Item, HttpError>> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            let next = match &mut self.feed {
                Feed::Cached(content) => Ok(content.take()),
                Feed::Live => self.response.next_decoded_blocking(),
            };
            if let Err(err) = self.advance(next) {
                return Some(Err(err));
            }
        }
    }

    async fn next_async(&mut self) -> Option<Result<S::Item, HttpError>> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            let next = match &mut self.feed {
                Feed::Cached(content) => Ok(content.take()),
                Feed::Live => self.response.next_decoded_async().await,
            };
            if let Err(err) = self.advance(next) {
                return Some(Err(err));
            }
        }
    }

    fn num_bytes_downloaded(&self) -> usize {
        self.response.num_bytes_downloaded()
    }

    fn advance(&mut self, next: Result<Option<Bytes>, HttpError>) -> Result<(), HttpError> {
        match next {
            Ok(Some(chunk)) => self.stage.push(&chunk, &mut self.ready),
            Ok(None) => {
                self.done = true;
                self.stage.finish(&mut self.ready);
            }
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        }
        Ok(())
    }

    fn into_stream(self) -> impl Stream<Item = Result<S::Item, HttpError>> + Send + 'a
    where
        S: Send + 'a,
        S::Item: Send + 'a,
    {
        futures::stream::unfold(self, |mut chunks| async move {
            let item = chunks.next_async().await?;
            Some((item, chunks))
        })
    }
}

/// Raw chunks as delivered by the source. Created by
/// [`Response::iter_raw`].
pub struct RawChunks<'a> {
    response: &'a mut Response,
    done: bool,
}

impl<'a> RawChunks<'a> {
    pub(crate) fn new(response: &'a mut Response) -> Self {
        Self {
            response,
            done: false,
        }
    }

    /// Raw bytes received from the source so far.
    #[must_use]
    pub fn num_bytes_downloaded(&self) -> usize {
        self.response.num_bytes_downloaded()
    }

    async fn next_async(&mut self) -> Option<Result<Bytes, HttpError>> {
        if self.done {
            return None;
        }
        let next = self.response.next_raw_async().await.transpose();
        self.done = !matches!(next, Some(Ok(_)));
        next
    }

    pub(crate) fn into_stream(self) -> impl Stream<Item = Result<Bytes, HttpError>> + Send + 'a {
        futures::stream::unfold(self, |mut chunks| async move {
            let item = chunks.next_async().await?;
            Some((item, chunks))
        })
    }
}

impl Iterator for RawChunks<'_> {
    type Item = Result<Bytes, HttpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.response.next_raw_blocking().transpose();
        self.done = !matches!(next, Some(Ok(_)));
        next
    }
}

/// Decoded byte chunks. Created by [`Response::iter_bytes`].
pub struct ByteChunks<'a>(Chunks<'a, BytesStage>);

impl<'a> ByteChunks<'a> {
    pub(crate) fn new(response: &'a mut Response, feed: Feed) -> Self {
        Self(Chunks::new(response, feed, BytesStage))
    }

    /// Raw bytes received from the source so far, before any decoding.
    #[must_use]
    pub fn num_bytes_downloaded(&self) -> usize {
        self.0.num_bytes_downloaded()
    }

    pub(crate) fn into_stream(self) -> impl Stream<Item = Result<Bytes, HttpError>> + Send + 'a {
        self.0.into_stream()
    }
}

impl Iterator for ByteChunks<'_> {
    type Item = Result<Bytes, HttpError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_blocking()
    }
}

/// Decoded text fragments. Created by [`Response::iter_text`].
pub struct TextChunks<'a>(Chunks<'a, TextStage>);

impl<'a> TextChunks<'a> {
    pub(crate) fn new(response: &'a mut Response, feed: Feed, decoder: TextDecoder) -> Self {
        Self(Chunks::new(response, feed, TextStage { decoder }))
    }

    /// Raw bytes received from the source so far, before any decoding.
    #[must_use]
    pub fn num_bytes_downloaded(&self) -> usize {
        self.0.num_bytes_downloaded()
    }

    pub(crate) fn into_stream(self) -> impl Stream<Item = Result<String, HttpError>> + Send + 'a {
        self.0.into_stream()
    }
}

impl Iterator for TextChunks<'_> {
    type Item = Result<String, HttpError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_blocking()
    }
}

/// Decoded lines. Created by [`Response::iter_lines`].
pub struct Lines<'a>(Chunks<'a, LineStage>);

impl<'a> Lines<'a> {
    pub(crate) fn new(response: &'a mut Response, feed: Feed, decoder: TextDecoder) -> Self {
        Self(Chunks::new(
            response,
            feed,
            LineStage {
                text: decoder,
                lines: LineDecoder::new(),
            },
        ))
    }

    /// Raw bytes received from the source so far, before any decoding.
    #[must_use]
    pub fn num_bytes_downloaded(&self) -> usize {
        self.0.num_bytes_downloaded()
    }

    pub(crate) fn into_stream(self) -> impl Stream<Item = Result<String, HttpError>> + Send + 'a {
        self.0.into_stream()
    }
}

impl Iterator for Lines<'_> {
    type Item = Result<String, HttpError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_blocking()
    }
}
