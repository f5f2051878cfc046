#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end behavior of responses fed by blocking chunk sources

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use http::{HeaderValue, Method, Uri};
use modkit_body::{BlockingStream, BoxError, HttpError, RequestHead, Response, StreamState};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Chunk source that records how many chunks were pulled and when it is dropped
struct TrackedSource {
    chunks: std::vec::IntoIter<Bytes>,
    pulled: Arc<AtomicUsize>,
    dropped: Arc<AtomicBool>,
}

impl Iterator for TrackedSource {
    type Item = Result<Bytes, BoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        self.pulled.fetch_add(1, Ordering::SeqCst);
        Some(Ok(chunk))
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

struct Tracking {
    pulled: Arc<AtomicUsize>,
    dropped: Arc<AtomicBool>,
}

fn tracked(chunks: Vec<&'static [u8]>) -> (BlockingStream, Tracking) {
    let pulled = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(AtomicBool::new(false));
    let source = TrackedSource {
        chunks: chunks
            .into_iter()
            .map(Bytes::from_static)
            .collect::<Vec<_>>()
            .into_iter(),
        pulled: Arc::clone(&pulled),
        dropped: Arc::clone(&dropped),
    };
    (BlockingStream::new(source), Tracking { pulled, dropped })
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_close_releases_source_without_draining() {
    let (stream, tracking) = tracked(vec![b"one\n", b"two\n", b"three\n"]);
    let mut response = Response::builder().blocking_stream(stream).build().unwrap();

    let first = response.iter_lines().unwrap().next().unwrap().unwrap();
    assert_eq!(first, "one\n");
    assert!(!tracking.dropped.load(Ordering::SeqCst));

    response.close().unwrap();
    assert!(tracking.dropped.load(Ordering::SeqCst));
    assert_eq!(tracking.pulled.load(Ordering::SeqCst), 1);
    assert_eq!(response.stream_state(), StreamState::Closed);
    assert_eq!(response.num_bytes_downloaded(), 4);
}

#[test]
fn test_exhausted_source_is_released() {
    let (stream, tracking) = tracked(vec![b"abc", b"def"]);
    let mut response = Response::builder().blocking_stream(stream).build().unwrap();

    assert_eq!(response.read().unwrap(), Bytes::from_static(b"abcdef"));
    assert!(tracking.dropped.load(Ordering::SeqCst));
    assert!(response.is_closed());
    assert!(response.elapsed().is_ok());
}

#[test]
fn test_streamed_gzip_text() {
    let compressed = gzip("caf\u{e9}\nna\u{ef}ve\n".as_bytes());
    let chunks: Vec<Vec<u8>> = compressed.chunks(4).map(<[u8]>::to_vec).collect();
    let mut response = Response::builder()
        .header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
        .header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
        .blocking_stream(BlockingStream::from_chunks(chunks))
        .build()
        .unwrap();

    let lines: Vec<String> = response.iter_lines().unwrap().map(Result::unwrap).collect();
    assert_eq!(lines, ["caf\u{e9}\n", "na\u{ef}ve\n"]);
    assert_eq!(response.num_bytes_downloaded(), compressed.len());
    assert!(response.is_closed());
}

#[test]
fn test_stacked_encodings() {
    let twice = gzip(&gzip(b"layered"));
    let mut response = Response::builder()
        .header(CONTENT_ENCODING, HeaderValue::from_static("gzip, gzip"))
        .blocking_stream(BlockingStream::from_chunks(vec![twice]))
        .build()
        .unwrap();
    assert_eq!(response.read().unwrap(), Bytes::from_static(b"layered"));
}

#[test]
fn test_truncated_stream_is_a_decoding_error() {
    let mut compressed = gzip(b"this body is cut short by the transport");
    compressed.truncate(compressed.len() / 2);
    let mut response = Response::builder()
        .header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
        .request(RequestHead::new(
            Method::POST,
            Uri::from_static("https://example.org/upload"),
        ))
        .blocking_stream(BlockingStream::from_chunks(vec![compressed]))
        .build()
        .unwrap();

    let err = response.read().unwrap_err();
    assert!(err.is_decoding_error());
    assert!(matches!(err, HttpError::Decoding { ref method, .. } if *method == Method::POST));
    assert!(response.is_closed());
    assert!(matches!(response.read(), Err(HttpError::StreamConsumed)));
}

#[test]
fn test_one_shot_stream() {
    let (stream, _tracking) = tracked(vec![b"a", b"b"]);
    let mut response = Response::builder().blocking_stream(stream).build().unwrap();

    let raw: Vec<Bytes> = response.iter_raw().unwrap().map(Result::unwrap).collect();
    assert_eq!(raw.len(), 2);

    assert!(matches!(response.iter_raw().err(), Some(HttpError::StreamConsumed)));
    assert!(matches!(response.iter_text().err(), Some(HttpError::StreamConsumed)));
    assert!(matches!(response.read(), Err(HttpError::StreamConsumed)));
}
