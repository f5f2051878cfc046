use super::{Codec, DecodeError};
use bytes::{Bytes, BytesMut};
use http::HeaderMap;
use http::header::CONTENT_ENCODING;

/// The codecs named by a `Content-Encoding` header, stored in decode order.
///
/// The rightmost token of the header is the outermost encoding applied by
/// the server, so it is undone first. An empty chain behaves as identity.
/// A chain holds per-body state and is built once per body.
#[derive(Debug, Default)]
pub struct DecoderChain {
    codecs: Vec<Codec>,
}

impl DecoderChain {
    /// Build the chain from every `Content-Encoding` value in `headers`.
    ///
    /// Multiple header lines are treated as one comma-separated list in the
    /// order they appear.
    ///
    /// # Errors
    /// Returns [`DecodeError::UnsupportedEncoding`] for an unknown token in a
    /// list of several, or for a value that is not visible ASCII.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        let mut joined = String::new();
        for value in headers.get_all(CONTENT_ENCODING) {
            let value = value
                .to_str()
                .map_err(|_| {
                    DecodeError::UnsupportedEncoding(
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })?;
            if !joined.is_empty() {
                joined.push(',');
            }
            joined.push_str(value);
        }
        Self::from_header_value(&joined)
    }

    /// Build the chain from a single `Content-Encoding` header value.
    ///
    /// A value holding exactly one unrecognized token is passed through
    /// untouched; servers that mislabel a plain body this way are common.
    ///
    /// # Errors
    /// Returns [`DecodeError::UnsupportedEncoding`] when one of several
    /// listed tokens is unknown.
    pub fn from_header_value(value: &str) -> Result<Self, DecodeError> {
        let tokens: Vec<String> = value
            .split(',')
            .map(|token| token.trim().to_ascii_lowercase())
            .filter(|token| !token.is_empty())
            .collect();

        let mut codecs = Vec::with_capacity(tokens.len());
        for token in tokens.iter().rev() {
            match Codec::for_token(token) {
                Some(Codec::Identity) => {}
                Some(codec) => codecs.push(codec),
                None if tokens.len() == 1 => {
                    tracing::debug!(
                        content_encoding = %token,
                        "unknown content encoding, passing body through"
                    );
                }
                None => return Err(DecodeError::UnsupportedEncoding(token.clone())),
            }
        }

        if !codecs.is_empty() {
            tracing::debug!(
                codecs = ?codecs.iter().map(Codec::name).collect::<Vec<_>>(),
                "built content decoder chain"
            );
        }
        Ok(Self { codecs })
    }

    /// Returns `true` when decoding is a no-op.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Codec names in decode order.
    #[must_use]
    pub fn codec_names(&self) -> Vec<&'static str> {
        self.codecs.iter().map(Codec::name).collect()
    }

    /// Pass one raw chunk through every codec in decode order.
    ///
    /// `limit` caps the output of each stage, so an intermediate stage
    /// cannot inflate past it either.
    ///
    /// # Errors
    /// Propagates the first codec failure, including
    /// [`DecodeError::TooLarge`] from a stage that passed `limit`.
    pub fn decode(&mut self, chunk: Bytes, limit: usize) -> Result<Bytes, DecodeError> {
        let mut data = chunk;
        for codec in &mut self.codecs {
            if data.is_empty() {
                break;
            }
            data = codec.decode(data, limit)?;
        }
        Ok(data)
    }

    /// Finalize every codec. Output flushed by an inner stage still has to
    /// go through the stages after it, so each codec first decodes what the
    /// previous one flushed and then flushes itself.
    ///
    /// # Errors
    /// Propagates the first codec failure, including truncated streams.
    pub fn flush(&mut self, limit: usize) -> Result<Bytes, DecodeError> {
        let mut data = Bytes::new();
        for codec in &mut self.codecs {
            let decoded = codec.decode(data, limit)?;
            let flushed = codec.flush(limit.saturating_sub(decoded.len()))?;
            data = if flushed.is_empty() {
                decoded
            } else if decoded.is_empty() {
                flushed
            } else {
                let mut joined = BytesMut::with_capacity(decoded.len() + flushed.len());
                joined.extend_from_slice(&decoded);
                joined.extend_from_slice(&flushed);
                joined.freeze()
            };
        }
        Ok(data)
    }
}
