use http::{Method, Uri};
use std::fmt;

/// The parts of the originating request a response needs for error context.
///
/// Shared with the response through an `Arc`; the response never owns the
/// request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    uri: Uri,
}

impl RequestHead {
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self { method, uri }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl<B> From<&http::Request<B>> for RequestHead {
    fn from(request: &http::Request<B>) -> Self {
        Self::new(request.method().clone(), request.uri().clone())
    }
}

impl fmt::Display for RequestHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_request() {
        let request = http::Request::post("https://example.org/upload")
            .body(())
            .unwrap();
        let head = RequestHead::from(&request);
        assert_eq!(head.method(), Method::POST);
        assert_eq!(head.uri(), "https://example.org/upload");
        assert_eq!(head.to_string(), "POST https://example.org/upload");
    }
}
