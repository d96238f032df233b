use std::{io, num::ParseIntError, str::Utf8Error};

use http::header::ToStrError;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid request: {0}")]
    HttpError(#[from] http::Error),
    #[error("request head is not valid utf-8: {0}")]
    Utf8(#[from] Utf8Error),
    #[error("invalid header value: {0}")]
    HeaderValue(#[from] ToStrError),
    #[error("invalid content length: {0}")]
    ContentLength(#[from] ParseIntError),
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),
    #[error("malformed request")]
    InvalidFormat,
    #[error("unsupported http version")]
    UnsupportedVersion,
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write response: {0}")]
    Fmt(#[from] std::fmt::Error),
    #[error("invalid header value: {0}")]
    HeaderValue(#[from] ToStrError),
}
