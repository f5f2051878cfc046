//! Stateful decompression adapters for the `Content-Encoding` tokens the
//! crate understands.
//!
//! Every codec takes an output limit per call and fails with
//! [`DecodeError::TooLarge`] as soon as its output passes it, so a small
//! compressed chunk cannot inflate into an unbounded allocation. Bytes that
//! follow a codec's end-of-stream marker are dropped.

use super::DecodeError;
use bytes::Bytes;
use flate2::{Crc, Decompress, FlushDecompress, Status};
use std::fmt;
use std::io::{self, Write};

/// Output buffer growth step for inflate and brotli.
const DECODE_BUFFER: usize = 16 * 1024;

/// Longest gzip header (with `FEXTRA`/`FNAME`/`FCOMMENT`) buffered before
/// the stream is rejected.
const MAX_GZIP_HEADER: usize = 64 * 1024;

const GZIP_TRAILER: usize = 8;

/// One decompression stage of a [`DecoderChain`](super::DecoderChain).
///
/// Every instance carries the partial state of a single body and must not
/// be reused for another one. `decode` on no input followed by `flush`
/// yields empty output for every variant.
pub enum Codec {
    /// Pass-through, used for `identity` and for an empty chain
    Identity,
    /// `deflate`, either raw or zlib-wrapped
    Deflate(DeflateDecoder),
    /// `gzip` / `x-gzip`
    Gzip(GzipDecoder),
    /// `br`
    Brotli(BrotliDecoder),
}

impl Codec {
    /// Map a lower-cased, trimmed `Content-Encoding` token to a codec.
    #[must_use]
    pub fn for_token(token: &str) -> Option<Self> {
        match token {
            "identity" => Some(Codec::Identity),
            "deflate" => Some(Codec::Deflate(DeflateDecoder::new())),
            "gzip" | "x-gzip" => Some(Codec::Gzip(GzipDecoder::new())),
            "br" => Some(Codec::Brotli(BrotliDecoder::new())),
            _ => None,
        }
    }

    /// Token name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Identity => "identity",
            Codec::Deflate(_) => "deflate",
            Codec::Gzip(_) => "gzip",
            Codec::Brotli(_) => "br",
        }
    }

    /// Decode one chunk, producing at most `limit` bytes. May return empty
    /// bytes while the codec buffers.
    ///
    /// # Errors
    /// Returns [`DecodeError::Corrupt`] when the compressed stream is invalid
    /// and [`DecodeError::TooLarge`] when the output would pass `limit`.
    pub fn decode(&mut self, chunk: Bytes, limit: usize) -> Result<Bytes, DecodeError> {
        match self {
            Codec::Identity => Ok(chunk),
            Codec::Deflate(decoder) => decoder.decode(&chunk, limit).map(Bytes::from),
            Codec::Gzip(decoder) => decoder.decode(&chunk, limit).map(Bytes::from),
            Codec::Brotli(decoder) => decoder.decode(&chunk, limit).map(Bytes::from),
        }
    }

    /// Finalize the stream and return any output still held back.
    ///
    /// # Errors
    /// Returns [`DecodeError::Truncated`] when input was seen but the stream
    /// never reached its end marker, and [`DecodeError::TooLarge`] when the
    /// remaining output would pass `limit`.
    pub fn flush(&mut self, limit: usize) -> Result<Bytes, DecodeError> {
        match self {
            Codec::Identity => Ok(Bytes::new()),
            Codec::Deflate(decoder) => decoder.flush().map(Bytes::from),
            Codec::Gzip(decoder) => decoder.flush().map(Bytes::from),
            Codec::Brotli(decoder) => decoder.flush(limit).map(Bytes::from),
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Codec").field(&self.name()).finish()
    }
}

/// Returns `true` when the two leading bytes form a valid zlib header
/// (RFC 1950: CM = 8, CINFO <= 7, FCHECK makes the pair divisible by 31).
#[must_use]
pub fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    cmf & 0x0F == 8 && cmf >> 4 <= 7 && ((u16::from(cmf) << 8) | u16::from(flg)) % 31 == 0
}

enum DeflateState {
    /// Waiting for the two bytes that tell zlib from raw deflate
    Sniffing(Vec<u8>),
    Inflating {
        inner: Decompress,
        finished: bool,
    },
}

/// `deflate` decoder that accepts both zlib-wrapped and raw streams.
pub struct DeflateDecoder {
    state: DeflateState,
}

impl DeflateDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DeflateState::Sniffing(Vec::with_capacity(2)),
        }
    }

    fn decode(&mut self, chunk: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        match &mut self.state {
            DeflateState::Sniffing(header) => {
                header.extend_from_slice(chunk);
                if header.len() < 2 {
                    return Ok(out);
                }
                let pending = std::mem::take(header);
                let zlib = is_zlib_header(pending[0], pending[1]);
                tracing::trace!(zlib, "deflate framing detected");
                let mut inner = Decompress::new(zlib);
                let mut finished = false;
                inflate(&mut inner, &pending, &mut finished, &mut out, limit, "deflate")?;
                self.state = DeflateState::Inflating { inner, finished };
            }
            DeflateState::Inflating { inner, finished } => {
                inflate(inner, chunk, finished, &mut out, limit, "deflate")?;
            }
        }
        Ok(out)
    }

    fn flush(&self) -> Result<Vec<u8>, DecodeError> {
        let complete = match &self.state {
            DeflateState::Sniffing(header) => header.is_empty(),
            DeflateState::Inflating { finished, .. } => *finished,
        };
        if complete {
            Ok(Vec::new())
        } else {
            Err(DecodeError::Truncated { codec: "deflate" })
        }
    }
}

impl Default for DeflateDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `input` through the inflater into `out` until the input is used up
/// or the stream ends, and return how many input bytes were consumed.
/// Output grows in bounded steps and is checked against `limit` after each.
fn inflate(
    inner: &mut Decompress,
    input: &[u8],
    finished: &mut bool,
    out: &mut Vec<u8>,
    limit: usize,
    codec: &'static str,
) -> Result<usize, DecodeError> {
    if *finished {
        return Ok(0);
    }
    let mut rest = input;
    out.reserve_exact(
        input
            .len()
            .saturating_mul(4)
            .max(DECODE_BUFFER)
            .min(limit.saturating_add(1)),
    );
    while !*finished {
        if out.len() == out.capacity() {
            out.reserve_exact(DECODE_BUFFER);
        }
        let before_in = inner.total_in();
        let before_out = inner.total_out();
        let status = inner
            .decompress_vec(rest, out, FlushDecompress::None)
            .map_err(|e| DecodeError::corrupt(codec, e.into()))?;
        let consumed = usize::try_from(inner.total_in() - before_in).unwrap_or(rest.len());
        rest = &rest[consumed.min(rest.len())..];
        if out.len() > limit {
            return Err(DecodeError::TooLarge {
                codec,
                produced: out.len(),
            });
        }
        let progressed = consumed > 0 || inner.total_out() != before_out;

        match status {
            Status::StreamEnd => *finished = true,
            Status::Ok | Status::BufError => {
                let has_room = out.len() < out.capacity();
                if has_room && (rest.is_empty() || !progressed) {
                    break;
                }
            }
        }
    }
    Ok(input.len() - rest.len())
}

/// `gzip` decoder (RFC 1952, single member).
///
/// The header and trailer are handled here and the deflate body goes
/// through the same bounded inflater as `deflate`, so a checksum mismatch
/// is told apart from a stream that was cut short.
pub struct GzipDecoder {
    /// Header bytes collected so far; `None` once the header is parsed
    header: Option<Vec<u8>>,
    inner: Decompress,
    crc: Crc,
    inflated: bool,
    trailer: Vec<u8>,
    seen_input: bool,
}

impl GzipDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: Some(Vec::new()),
            inner: Decompress::new(false),
            crc: Crc::new(),
            inflated: false,
            trailer: Vec::with_capacity(GZIP_TRAILER),
            seen_input: false,
        }
    }

    fn decode(&mut self, chunk: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }
        self.seen_input = true;

        let after_header: Vec<u8>;
        let mut input = chunk;
        if let Some(header) = self.header.as_mut() {
            header.extend_from_slice(chunk);
            let Some(len) = gzip_header_len(header)? else {
                return Ok(Vec::new());
            };
            after_header = header.split_off(len);
            self.header = None;
            input = &after_header;
        }

        let mut out = Vec::new();
        if !self.inflated {
            let consumed = inflate(
                &mut self.inner,
                input,
                &mut self.inflated,
                &mut out,
                limit,
                "gzip",
            )?;
            self.crc.update(&out);
            input = &input[consumed..];
        }
        if self.inflated && self.trailer.len() < GZIP_TRAILER {
            let take = (GZIP_TRAILER - self.trailer.len()).min(input.len());
            self.trailer.extend_from_slice(&input[..take]);
            if self.trailer.len() == GZIP_TRAILER {
                self.check_trailer()?;
            }
        }
        Ok(out)
    }

    fn check_trailer(&self) -> Result<(), DecodeError> {
        let t = &self.trailer;
        let crc = u32::from_le_bytes([t[0], t[1], t[2], t[3]]);
        let size = u32::from_le_bytes([t[4], t[5], t[6], t[7]]);
        if crc != self.crc.sum() {
            return Err(DecodeError::corrupt(
                "gzip",
                io::Error::new(io::ErrorKind::InvalidData, "CRC32 mismatch"),
            ));
        }
        if size != self.crc.amount() {
            return Err(DecodeError::corrupt(
                "gzip",
                io::Error::new(io::ErrorKind::InvalidData, "length mismatch"),
            ));
        }
        Ok(())
    }

    fn flush(&self) -> Result<Vec<u8>, DecodeError> {
        if self.seen_input && self.trailer.len() < GZIP_TRAILER {
            return Err(DecodeError::Truncated { codec: "gzip" });
        }
        Ok(Vec::new())
    }
}

impl Default for GzipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

const GZIP_FHCRC: u8 = 0x02;
const GZIP_FEXTRA: u8 = 0x04;
const GZIP_FNAME: u8 = 0x08;
const GZIP_FCOMMENT: u8 = 0x10;
const GZIP_RESERVED: u8 = 0xE0;

fn invalid_gzip_header(reason: &'static str) -> DecodeError {
    DecodeError::corrupt("gzip", io::Error::new(io::ErrorKind::InvalidData, reason))
}

/// Length of the gzip header at the start of `buf`, or `None` while it is
/// still incomplete.
fn gzip_header_len(buf: &[u8]) -> Result<Option<usize>, DecodeError> {
    if buf.first().is_some_and(|b| *b != 0x1F) || buf.get(1).is_some_and(|b| *b != 0x8B) {
        return Err(invalid_gzip_header("invalid gzip magic"));
    }
    if buf.len() > MAX_GZIP_HEADER {
        return Err(invalid_gzip_header("gzip header too long"));
    }
    if buf.len() < 10 {
        return Ok(None);
    }
    if buf[2] != 8 {
        return Err(invalid_gzip_header("unsupported gzip compression method"));
    }
    let flags = buf[3];
    if flags & GZIP_RESERVED != 0 {
        return Err(invalid_gzip_header("reserved gzip flags set"));
    }

    let mut pos = 10;
    if flags & GZIP_FEXTRA != 0 {
        let Some(len) = buf.get(pos..pos + 2) else {
            return Ok(None);
        };
        pos += 2 + usize::from(u16::from_le_bytes([len[0], len[1]]));
        if buf.len() < pos {
            return Ok(None);
        }
    }
    for flag in [GZIP_FNAME, GZIP_FCOMMENT] {
        if flags & flag != 0 {
            let Some(end) = buf[pos..].iter().position(|b| *b == 0) else {
                return Ok(None);
            };
            pos += end + 1;
        }
    }
    if flags & GZIP_FHCRC != 0 {
        pos += 2;
        if buf.len() < pos {
            return Ok(None);
        }
    }
    Ok(Some(pos))
}

/// Write sink for the brotli decoder that refuses to grow past `limit`.
struct BoundedSink {
    buf: Vec<u8>,
    limit: usize,
    /// Output size that was refused
    exceeded: Option<usize>,
}

impl Write for BoundedSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let wanted = self.buf.len().saturating_add(data.len());
        if wanted > self.limit {
            self.exceeded = Some(wanted);
            return Err(io::Error::other("decoded output limit exceeded"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `br` decoder.
pub struct BrotliDecoder {
    inner: Option<brotli::DecompressorWriter<BoundedSink>>,
    seen_input: bool,
    finished: bool,
}

impl BrotliDecoder {
    #[must_use]
    pub fn new() -> Self {
        let sink = BoundedSink {
            buf: Vec::new(),
            limit: usize::MAX,
            exceeded: None,
        };
        Self {
            inner: Some(brotli::DecompressorWriter::new(sink, DECODE_BUFFER)),
            seen_input: false,
            finished: false,
        }
    }

    fn decode(&mut self, chunk: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
        if chunk.is_empty() || self.finished {
            return Ok(Vec::new());
        }
        let Some(inner) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };
        self.seen_input = true;
        inner.get_mut().limit = limit;

        let mut input = chunk;
        while !input.is_empty() {
            match inner.write(input) {
                // The decoder takes nothing once the stream has ended
                Ok(0) => {
                    self.finished = true;
                    break;
                }
                Ok(n) => input = &input[n..],
                Err(err) => {
                    return Err(match inner.get_mut().exceeded.take() {
                        Some(produced) => DecodeError::TooLarge {
                            codec: "br",
                            produced,
                        },
                        None => DecodeError::corrupt("br", err),
                    });
                }
            }
        }
        Ok(std::mem::take(&mut inner.get_mut().buf))
    }

    fn flush(&mut self, limit: usize) -> Result<Vec<u8>, DecodeError> {
        let Some(mut inner) = self.inner.take() else {
            return Ok(Vec::new());
        };
        if !self.seen_input {
            return Ok(Vec::new());
        }
        inner.get_mut().limit = limit;
        match inner.into_inner() {
            Ok(sink) => Ok(sink.buf),
            Err(sink) => Err(match sink.exceeded {
                Some(produced) => DecodeError::TooLarge {
                    codec: "br",
                    produced,
                },
                None => DecodeError::Truncated { codec: "br" },
            }),
        }
    }
}

impl Default for BrotliDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::decoders::test_support::{compress_brotli, compress_deflate, compress_gzip, compress_zlib};

    const BODY: &[u8] = b"test 123";

    fn decode_all(codec: &mut Codec, chunks: &[&[u8]]) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend_from_slice(&codec.decode(Bytes::copy_from_slice(chunk), usize::MAX)?);
        }
        out.extend_from_slice(&codec.flush(usize::MAX)?);
        Ok(out)
    }

    fn byte_by_byte(data: &[u8]) -> Vec<&[u8]> {
        data.chunks(1).collect()
    }

    #[test]
    fn test_for_token() {
        assert_eq!(Codec::for_token("identity").unwrap().name(), "identity");
        assert_eq!(Codec::for_token("deflate").unwrap().name(), "deflate");
        assert_eq!(Codec::for_token("gzip").unwrap().name(), "gzip");
        assert_eq!(Codec::for_token("x-gzip").unwrap().name(), "gzip");
        assert_eq!(Codec::for_token("br").unwrap().name(), "br");
        assert!(Codec::for_token("zstd").is_none());
        assert!(Codec::for_token("GZIP").is_none(), "tokens arrive lower-cased");
    }

    #[test]
    fn test_empty_input_flushes_empty() {
        for token in ["identity", "deflate", "gzip", "br"] {
            let mut codec = Codec::for_token(token).unwrap();
            assert!(codec.decode(Bytes::new(), 0).unwrap().is_empty(), "{token}");
            assert!(codec.flush(0).unwrap().is_empty(), "{token}");
        }
    }

    #[test]
    fn test_identity_passes_through() {
        let mut codec = Codec::Identity;
        assert_eq!(decode_all(&mut codec, &[b"test ", b"123"]).unwrap(), BODY);
    }

    #[test]
    fn test_deflate_raw() {
        let compressed = compress_deflate(BODY);
        let mut codec = Codec::for_token("deflate").unwrap();
        assert_eq!(decode_all(&mut codec, &[&compressed]).unwrap(), BODY);
    }

    #[test]
    fn test_deflate_zlib_wrapped() {
        let compressed = compress_zlib(BODY);
        let mut codec = Codec::for_token("deflate").unwrap();
        assert_eq!(decode_all(&mut codec, &[&compressed]).unwrap(), BODY);
    }

    #[test]
    fn test_deflate_header_split_across_chunks() {
        let compressed = compress_zlib(BODY);
        let mut codec = Codec::for_token("deflate").unwrap();
        let chunks = byte_by_byte(&compressed);
        assert_eq!(decode_all(&mut codec, &chunks).unwrap(), BODY);
    }

    #[test]
    fn test_gzip_byte_by_byte() {
        let compressed = compress_gzip(BODY);
        let mut codec = Codec::for_token("gzip").unwrap();
        let chunks = byte_by_byte(&compressed);
        assert_eq!(decode_all(&mut codec, &chunks).unwrap(), BODY);
    }

    #[test]
    fn test_brotli_byte_by_byte() {
        let compressed = compress_brotli(BODY);
        let mut codec = Codec::for_token("br").unwrap();
        let chunks = byte_by_byte(&compressed);
        assert_eq!(decode_all(&mut codec, &chunks).unwrap(), BODY);
    }

    #[test]
    fn test_large_payload_round_trips() {
        let body: Vec<u8> = (0..200_000u32).flat_map(|i| i.to_le_bytes()).collect();
        for (token, compressed) in [
            ("deflate", compress_deflate(&body)),
            ("deflate", compress_zlib(&body)),
            ("gzip", compress_gzip(&body)),
            ("br", compress_brotli(&body)),
        ] {
            let mut codec = Codec::for_token(token).unwrap();
            let chunks: Vec<&[u8]> = compressed.chunks(1000).collect();
            assert_eq!(decode_all(&mut codec, &chunks).unwrap(), body, "{token}");
        }
    }

    #[test]
    fn test_truncated_gzip_fails_on_flush() {
        let compressed = compress_gzip(BODY);
        let mut codec = Codec::for_token("gzip").unwrap();
        let result = decode_all(&mut codec, &[&compressed[..compressed.len() - 4]]);
        assert!(matches!(
            result,
            Err(DecodeError::Truncated { codec: "gzip" })
        ));
    }

    #[test]
    fn test_truncated_deflate_fails_on_flush() {
        let body: Vec<u8> = (0..4096u32).flat_map(|i| i.to_be_bytes()).collect();
        let compressed = compress_zlib(&body);
        let mut codec = Codec::for_token("deflate").unwrap();
        let result = decode_all(&mut codec, &[&compressed[..compressed.len() / 2]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_byte_deflate_is_truncated() {
        let mut codec = Codec::for_token("deflate").unwrap();
        assert!(codec.decode(Bytes::from_static(b"x"), usize::MAX).unwrap().is_empty());
        assert!(matches!(
            codec.flush(usize::MAX),
            Err(DecodeError::Truncated { codec: "deflate" })
        ));
    }

    #[test]
    fn test_corrupt_streams_fail() {
        let corrupt = compress_brotli(BODY)[3..].to_vec();
        for token in ["deflate", "gzip", "br"] {
            let mut codec = Codec::for_token(token).unwrap();
            assert!(
                decode_all(&mut codec, &[&corrupt]).is_err(),
                "{token} should reject corrupt input"
            );
        }
    }

    #[test]
    fn test_bytes_after_stream_end_are_dropped() {
        for (token, mut compressed) in [
            ("deflate", compress_deflate(BODY)),
            ("deflate", compress_zlib(BODY)),
            ("gzip", compress_gzip(BODY)),
            ("br", compress_brotli(BODY)),
        ] {
            compressed.extend_from_slice(b"\0\0");
            let mut codec = Codec::for_token(token).unwrap();
            assert_eq!(decode_all(&mut codec, &[&compressed]).unwrap(), BODY, "{token}");

            let mut codec = Codec::for_token(token).unwrap();
            let chunks: Vec<&[u8]> = vec![&compressed, b"more garbage"];
            assert_eq!(decode_all(&mut codec, &chunks).unwrap(), BODY, "{token}");
        }
    }

    #[test]
    fn test_output_limit_stops_single_chunk() {
        let zeros = vec![0u8; 8 * 1024 * 1024];
        for (token, compressed) in [
            ("deflate", compress_deflate(&zeros)),
            ("gzip", compress_gzip(&zeros)),
            ("br", compress_brotli(&zeros)),
        ] {
            let mut codec = Codec::for_token(token).unwrap();
            let err = codec
                .decode(Bytes::from(compressed), 1024)
                .expect_err("output should be capped");
            match err {
                DecodeError::TooLarge { codec, produced } => {
                    assert_eq!(codec, token);
                    assert!(produced > 1024, "{token}: {produced}");
                    assert!(produced <= 1024 + 2 * DECODE_BUFFER, "{token}: {produced}");
                }
                other => panic!("{token}: unexpected error {other}"),
            }
        }
    }

    #[test]
    fn test_output_within_limit_passes() {
        let compressed = compress_gzip(BODY);
        let mut codec = Codec::for_token("gzip").unwrap();
        let out = codec.decode(Bytes::from(compressed), BODY.len()).unwrap();
        assert_eq!(&out[..], BODY);
        assert!(codec.flush(0).unwrap().is_empty());
    }

    #[test]
    fn test_gzip_checksum_mismatch_is_corrupt() {
        let mut compressed = compress_gzip(BODY);
        let crc_at = compressed.len() - 8;
        compressed[crc_at] ^= 0xFF;
        let mut codec = Codec::for_token("gzip").unwrap();
        let err = decode_all(&mut codec, &[&compressed]).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { codec: "gzip", .. }), "{err}");

        let mut compressed = compress_gzip(BODY);
        let size_at = compressed.len() - 4;
        compressed[size_at] ^= 0xFF;
        let mut codec = Codec::for_token("gzip").unwrap();
        let err = decode_all(&mut codec, &[&compressed]).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { codec: "gzip", .. }), "{err}");
    }

    #[test]
    fn test_gzip_optional_header_fields() {
        let mut encoder = flate2::GzBuilder::new()
            .filename("body.txt")
            .comment("fixture")
            .extra(vec![1, 2, 3])
            .write(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, BODY).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut codec = Codec::for_token("gzip").unwrap();
        let chunks = byte_by_byte(&compressed);
        assert_eq!(decode_all(&mut codec, &chunks).unwrap(), BODY);
    }

    #[test]
    fn test_gzip_bad_magic_is_corrupt() {
        let mut codec = Codec::for_token("gzip").unwrap();
        let err = codec
            .decode(Bytes::from_static(b"\x1f\x00rest"), usize::MAX)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { codec: "gzip", .. }));
    }

    #[test]
    fn test_zlib_header_detection() {
        assert!(is_zlib_header(0x78, 0x9C));
        assert!(is_zlib_header(0x78, 0x01));
        assert!(is_zlib_header(0x78, 0xDA));
        assert!(!is_zlib_header(0x78, 0x00));
        assert!(!is_zlib_header(0x1F, 0x8B), "gzip magic is not zlib");
    }
}
