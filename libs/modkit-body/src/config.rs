use encoding_rs::{Encoding, UTF_8};

/// Default limit on decompressed body bytes (10 MB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default number of leading bytes fed to the apparent-encoding guess
pub const DEFAULT_DETECTION_WINDOW: usize = 4096;

/// Per-response body processing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseConfig {
    /// Maximum decompressed body size in bytes (default: 10 MB)
    ///
    /// Applies to bytes materialized by `read()`/`aread()` and to bytes
    /// yielded by decoded iteration. Raw iteration is not limited.
    pub max_body_size: usize,

    /// Number of leading decoded bytes used to guess a text encoding when
    /// no charset is known (default: 4096)
    ///
    /// The guess only looks at these bytes, so it does not depend on how
    /// the body was split into chunks.
    pub detection_window: usize,

    /// Encoding used when the guess has nothing to go on, such as an
    /// empty or binary sample (default: UTF-8)
    pub default_encoding: &'static Encoding,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            detection_window: DEFAULT_DETECTION_WINDOW,
            default_encoding: UTF_8,
        }
    }
}

impl ResponseConfig {
    /// Create minimal configuration (small body limit, short detection window)
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1 MB
            detection_window: 1024,
            default_encoding: UTF_8,
        }
    }

    /// Create configuration without a body size limit
    ///
    /// Only use this for trusted peers; a compressed body can expand far
    /// beyond its transfer size.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_body_size: usize::MAX,
            ..Self::default()
        }
    }
}
