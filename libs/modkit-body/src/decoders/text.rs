use crate::charset::apparent_encoding;
use encoding_rs::{CoderResult, Decoder, Encoding};

/// Incremental bytes -> text decoder.
///
/// The encoding is either fixed up front (explicit or declared charset) or
/// guessed from the first `detection_window` bytes. Until a guess is made
/// the decoder holds input back; only a leading run of plain ASCII may be
/// released early, and only when `default_encoding` is ASCII-compatible.
///
/// Incomplete multi-byte sequences are carried across calls. Malformed
/// input is replaced with U+FFFD, never rejected.
pub struct TextDecoder {
    state: State,
    encoding: Option<&'static Encoding>,
    detection_window: usize,
    default_encoding: &'static Encoding,
}

enum State {
    Sniffing { sample: Vec<u8>, emitted: usize },
    Decoding(Decoder),
    Finished,
}

impl TextDecoder {
    /// Create a decoder. `resolved` skips detection entirely.
    #[must_use]
    pub fn new(
        resolved: Option<&'static Encoding>,
        detection_window: usize,
        default_encoding: &'static Encoding,
    ) -> Self {
        let state = match resolved {
            Some(encoding) => State::Decoding(encoding.new_decoder_with_bom_removal()),
            None => State::Sniffing {
                sample: Vec::new(),
                emitted: 0,
            },
        };
        Self {
            state,
            encoding: resolved,
            detection_window: detection_window.max(1),
            default_encoding,
        }
    }

    /// The encoding in use, once it has been fixed or guessed.
    #[must_use]
    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }

    /// Decode the next chunk, returning whatever text is complete.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut out = String::new();
        match &mut self.state {
            State::Decoding(decoder) => decode_into(decoder, chunk, false, &mut out),
            State::Sniffing { sample, emitted } => {
                sample.extend_from_slice(chunk);
                if sample.len() >= self.detection_window {
                    let window = &sample[..self.detection_window];
                    let encoding = apparent_encoding(window, self.default_encoding);
                    let mut decoder = start_decoder(encoding, *emitted);
                    decode_into(&mut decoder, &sample[*emitted..], false, &mut out);
                    self.resolve(encoding, State::Decoding(decoder));
                } else if self.default_encoding.is_ascii_compatible() {
                    let start = *emitted;
                    let run = sample[start..]
                        .iter()
                        .take_while(|b| b.is_ascii() && **b != 0)
                        .count();
                    // ASCII is valid in every candidate the guess can pick.
                    out.extend(sample[start..start + run].iter().map(|b| char::from(*b)));
                    *emitted += run;
                }
            }
            State::Finished => {}
        }
        out
    }

    /// Decode whatever is still buffered, replacing a trailing incomplete
    /// sequence. Later calls return an empty string.
    pub fn flush(&mut self) -> String {
        let mut out = String::new();
        match std::mem::replace(&mut self.state, State::Finished) {
            State::Decoding(mut decoder) => decode_into(&mut decoder, &[], true, &mut out),
            State::Sniffing { sample, emitted } => {
                let encoding = apparent_encoding(&sample, self.default_encoding);
                let mut decoder = start_decoder(encoding, emitted);
                decode_into(&mut decoder, &sample[emitted..], true, &mut out);
                self.resolve(encoding, State::Finished);
            }
            State::Finished => {}
        }
        out
    }

    fn resolve(&mut self, encoding: &'static Encoding, state: State) {
        tracing::debug!(encoding = encoding.name(), "guessed apparent text encoding");
        self.encoding = Some(encoding);
        self.state = state;
    }
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Sniffing { .. } => "sniffing",
            State::Decoding(_) => "decoding",
            State::Finished => "finished",
        };
        f.debug_struct("TextDecoder")
            .field("state", &state)
            .field("encoding", &self.encoding.map(Encoding::name))
            .field("detection_window", &self.detection_window)
            .finish_non_exhaustive()
    }
}

/// A BOM only counts at offset zero.
fn start_decoder(encoding: &'static Encoding, emitted: usize) -> Decoder {
    if emitted == 0 {
        encoding.new_decoder_with_bom_removal()
    } else {
        encoding.new_decoder_without_bom_handling()
    }
}

fn decode_into(decoder: &mut Decoder, mut input: &[u8], last: bool, out: &mut String) {
    loop {
        let needed = decoder
            .max_utf8_buffer_length(input.len())
            .unwrap_or(input.len());
        out.reserve(needed);
        let (result, read, _replaced) = decoder.decode_to_string(input, out, last);
        input = &input[read..];
        match result {
            CoderResult::InputEmpty => break,
            CoderResult::OutputFull => {}
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_8, WINDOWS_1252};

    fn detecting() -> TextDecoder {
        TextDecoder::new(None, 4096, UTF_8)
    }

    fn decode_chunks(decoder: &mut TextDecoder, chunks: &[&[u8]]) -> String {
        let mut text = String::new();
        for chunk in chunks {
            text.push_str(&decoder.decode(chunk));
        }
        text.push_str(&decoder.flush());
        text
    }

    #[test]
    fn test_empty_cases() {
        let mut decoder = detecting();
        assert_eq!(decoder.flush(), "");

        let mut decoder = detecting();
        assert_eq!(decoder.decode(b""), "");
        assert_eq!(decoder.flush(), "");
    }

    #[test]
    fn test_ascii_chunks() {
        let mut decoder = detecting();
        assert_eq!(decode_chunks(&mut decoder, &[b"Hello,", b" world!"]), "Hello, world!");
        assert_eq!(decoder.encoding(), Some(UTF_8));
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = detecting();
        let chunks: &[&[u8]] = &[
            b"\xe3\x83",
            b"\x88\xe3\x83\xa9",
            b"\xe3",
            b"\x83\x99\xe3\x83\xab",
        ];
        assert_eq!(decode_chunks(&mut decoder, chunks), "\u{30c8}\u{30e9}\u{30d9}\u{30eb}");
    }

    #[test]
    fn test_cp1252_guess() {
        let mut decoder = detecting();
        assert_eq!(
            decode_chunks(&mut decoder, &[b"Euro character: \x88!", b""]),
            "Euro character: \u{2c6}!"
        );
        assert_eq!(decoder.encoding(), Some(WINDOWS_1252));
    }

    #[test]
    fn test_latin1_guess() {
        let mut decoder = detecting();
        assert_eq!(
            decode_chunks(&mut decoder, &[b"Accented: \xd6sterreich", b""]),
            "Accented: \u{d6}sterreich"
        );
    }

    #[test]
    fn test_known_encoding() {
        let mut decoder = TextDecoder::new(Some(SHIFT_JIS), 4096, UTF_8);
        assert_eq!(
            decode_chunks(&mut decoder, &[b"\x83g", b"\x83", b"\x89\x83x\x83\x8b"]),
            "\u{30c8}\u{30e9}\u{30d9}\u{30eb}"
        );
    }

    #[test]
    fn test_declared_latin1() {
        let mut decoder = TextDecoder::new(Some(WINDOWS_1252), 4096, UTF_8);
        assert_eq!(decode_chunks(&mut decoder, &[b"\xff"]), "\u{ff}");
    }

    #[test]
    fn test_ascii_prefix_is_released_before_guess() {
        let mut decoder = detecting();
        assert_eq!(decoder.decode(b"abc"), "abc");
        assert_eq!(decoder.decode(b"d\xd6e"), "d");
        assert_eq!(decoder.flush(), "\u{d6}e");
    }

    #[test]
    fn test_nothing_released_for_non_ascii_default() {
        let mut decoder = TextDecoder::new(None, 4096, encoding_rs::UTF_16LE);
        assert_eq!(decoder.decode(b"abc"), "");
        assert_eq!(decoder.flush(), "abc");
    }

    #[test]
    fn test_guess_made_once_window_fills() {
        let mut decoder = TextDecoder::new(None, 4, UTF_8);
        assert_eq!(decoder.decode(b"ab"), "ab");
        assert_eq!(decoder.encoding(), None);
        assert_eq!(decoder.decode(b"cd\xe3\x83"), "cd");
        assert_eq!(decoder.encoding(), Some(UTF_8));
        assert_eq!(decoder.decode(b"\x88"), "\u{30c8}");
    }

    #[test]
    fn test_bom_is_removed() {
        let mut decoder = detecting();
        assert_eq!(decode_chunks(&mut decoder, &[b"\xef\xbb", b"\xbfhi"]), "hi");

        let mut decoder = detecting();
        assert_eq!(decode_chunks(&mut decoder, &[b"\xff\xfeh\x00i\x00"]), "hi");
    }

    #[test]
    fn test_truncated_sequence_is_replaced() {
        let mut decoder = TextDecoder::new(Some(UTF_8), 4096, UTF_8);
        assert_eq!(decoder.decode(b"ok\xe3\x83"), "ok");
        assert_eq!(decoder.flush(), "\u{fffd}");
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let body = "na\u{ef}ve caf\u{e9}, \u{6771}\u{4eac} and ASCII tail".as_bytes();
        let whole = decode_chunks(&mut TextDecoder::new(None, 8, UTF_8), &[body]);
        assert_eq!(whole, "na\u{ef}ve caf\u{e9}, \u{6771}\u{4eac} and ASCII tail");

        for size in 1..body.len() {
            let chunks: Vec<&[u8]> = body.chunks(size).collect();
            let mut decoder = TextDecoder::new(None, 8, UTF_8);
            assert_eq!(decode_chunks(&mut decoder, &chunks), whole, "chunk size {size}");
        }
    }

    #[test]
    fn test_decode_after_flush_is_empty() {
        let mut decoder = detecting();
        assert_eq!(decoder.decode(b"x"), "x");
        assert_eq!(decoder.flush(), "");
        assert_eq!(decoder.decode(b"y"), "");
        assert_eq!(decoder.flush(), "");
    }
}
