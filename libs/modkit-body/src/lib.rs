#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Response body processing for `ModKit` HTTP clients
//!
//! This crate turns the raw chunks a transport delivers into content:
//! - **Content decoding** of `Content-Encoding` chains (gzip, brotli, deflate)
//! - **Text decoding** with charset resolution and a bounded encoding guess
//! - **Line splitting** over `\n`, `\r\n` and `\r`
//! - A one-shot **body state machine** with blocking and async forms of
//!   every read and iteration operation
//!
//! Body size limits apply to **decompressed** bytes and are enforced while a
//! chunk inflates, so a small compressed chunk cannot expand past them.
//!
//! # Example
//!
//! ```ignore
//! use modkit_body::{BlockingStream, Response};
//!
//! let mut response = Response::builder()
//!     .header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
//!     .blocking_stream(BlockingStream::from_chunks(chunks))
//!     .build()?;
//!
//! let body = response.read()?;
//! let text = response.text()?;
//! ```

mod body;
mod builder;
pub mod charset;
mod config;
pub mod decoders;
mod error;
mod iter;
mod request;
mod response;

pub use body::{BlockingStream, ResponseBody, body_from, body_from_stream};
pub use builder::ResponseBuilder;
pub use config::{DEFAULT_DETECTION_WINDOW, DEFAULT_MAX_BODY_SIZE, ResponseConfig};
pub use error::{BoxError, HttpError, UsageError};
pub use iter::{ByteChunks, Lines, RawChunks, TextChunks};
pub use request::RequestHead;
pub use response::{Response, StreamState};
