//! Incremental transformations applied to a response body.
//!
//! - [`DecoderChain`] - undoes the `Content-Encoding` codecs (bytes -> bytes)
//! - [`TextDecoder`] - resolves a charset and decodes bytes -> text
//! - [`LineDecoder`] - splits text into `\n`-terminated lines
//!
//! None of these know anything about HTTP state; they only keep the partial
//! data a chunk boundary can leave behind.

mod chain;
mod codec;
mod line;
mod text;

pub use chain::DecoderChain;
pub use codec::{BrotliDecoder, Codec, DeflateDecoder, GzipDecoder, is_zlib_header};
pub use line::LineDecoder;
pub use text::TextDecoder;

use thiserror::Error;

/// Failure to undo a `Content-Encoding`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The header lists a codec this crate cannot decode
    #[error("Unsupported content encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The compressed stream is structurally invalid
    #[error("{codec} stream is corrupt: {source}")]
    Corrupt {
        codec: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Input ended before the codec saw its end-of-stream marker
    #[error("{codec} stream ended unexpectedly")]
    Truncated { codec: &'static str },

    /// Decoded output passed the limit given to the codec
    #[error("{codec} output exceeds the size limit ({produced} bytes decoded)")]
    TooLarge { codec: &'static str, produced: usize },
}

impl DecodeError {
    pub(crate) fn corrupt(codec: &'static str, source: std::io::Error) -> Self {
        DecodeError::Corrupt { codec, source }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod test_support {
    use flate2::Compression;
    use std::io::Write;

    pub fn compress_deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub fn compress_zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub fn compress_gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub fn compress_brotli(data: &[u8]) -> Vec<u8> {
        let mut compressed = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, 5, 22);
            writer.write_all(data).unwrap();
            writer.flush().unwrap();
        }
        compressed
    }
}
