//! Charset lookup and the apparent-encoding heuristic.
//!
//! Everything here is a pure function of its input; no detection state is
//! shared between bodies.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use http::HeaderMap;
use http::header::CONTENT_TYPE;

/// Look up an encoding by label.
///
/// Accepts the WHATWG labels (`utf-8`, `iso-8859-1`, `shift_jis`, ...) and
/// the common spellings that differ only in `-`/`_` placement such as
/// `latin-1` or `utf_16`. ISO-8859-1 labels resolve to windows-1252.
#[must_use]
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().trim_matches('"').trim();
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label.as_bytes())
        .or_else(|| Encoding::for_label(label.replace('_', "-").as_bytes()))
        .or_else(|| {
            let squashed: String = label.chars().filter(|c| !matches!(c, '-' | '_')).collect();
            Encoding::for_label(squashed.as_bytes())
        })
}

/// Extract the raw `charset` parameter from a `Content-Type` value.
///
/// Well-formed media types go through `mime`; anything it rejects is
/// scanned as `;`-separated parameters so that sloppy values such as
/// `text-plain; charset=latin-1` still yield their charset.
#[must_use]
pub fn charset_param(content_type: &str) -> Option<String> {
    if let Ok(mime) = content_type.parse::<mime::Mime>() {
        return mime
            .get_param(mime::CHARSET)
            .map(|charset| charset.as_str().trim_matches('"').to_owned());
    }
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_owned())
    })
}

/// The encoding declared by the `Content-Type` header, if it names one
/// this crate can decode. Unknown charset names are ignored.
#[must_use]
pub fn declared_encoding(headers: &HeaderMap) -> Option<&'static Encoding> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let charset = charset_param(content_type)?;
    let encoding = encoding_for_label(&charset);
    if encoding.is_none() {
        tracing::debug!(%charset, "ignoring unknown charset in content-type");
    }
    encoding
}

/// Best-effort guess of the encoding of `sample`.
///
/// In order: a byte-order mark wins; valid UTF-8 (an incomplete multi-byte
/// sequence cut off at the end of the sample still counts) gives UTF-8;
/// NUL bytes mark the sample as binary and give `default`; anything else
/// is taken as windows-1252. An empty sample gives `default`.
#[must_use]
pub fn apparent_encoding(sample: &[u8], default: &'static Encoding) -> &'static Encoding {
    if sample.is_empty() {
        return default;
    }
    if let Some((encoding, _bom_len)) = Encoding::for_bom(sample) {
        return encoding;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => UTF_8,
        Err(err) if err.error_len().is_none() => UTF_8,
        Err(_) if sample.contains(&0) => default,
        Err(_) => WINDOWS_1252,
    }
}
