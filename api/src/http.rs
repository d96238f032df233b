pub const LINE_DELIMITER: &[u8] = b"\r\n";
pub const REQUEST_DELIMITER: &[u8] = b"\r\n\r\n";

/// Person payloads are tiny; anything bigger is refused before buffering.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

pub mod codec;
mod response;

pub type Request = http::Request<Option<bytes::Bytes>>;
pub use response::{content_type, Html, IntoResponse, Json, Response};
