use bytes::Bytes;
use http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderValue, StatusCode,
};

pub type Response = http::Response<Option<Bytes>>;

/// Mime strings are always valid header values, the fallback is never hit.
pub fn content_type(mime: &mime::Mime) -> HeaderValue {
    HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        let mut response = http::Response::new(None);
        *response.status_mut() = self;
        response.headers_mut().insert(CONTENT_LENGTH, 0.into());

        response
    }
}

impl IntoResponse for Bytes {
    fn into_response(self) -> Response {
        let body_len = self.len();
        let mut response = http::Response::new(Some(self));

        response.headers_mut().insert(
            CONTENT_TYPE,
            content_type(&mime::APPLICATION_OCTET_STREAM),
        );
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, body_len.into());

        response
    }
}

pub struct Json<T>(pub T);
impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        let json = match serde_json::to_vec(&self.0) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(%err, "failed to serialize response body");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut response = http::Response::new(Some(json.into()));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, content_type(&mime::APPLICATION_JSON));

        response
    }
}

pub struct Html<T>(pub T);
impl<T> IntoResponse for Html<T>
where
    T: Into<Bytes>,
{
    fn into_response(self) -> Response {
        let mut response = http::Response::new(Some(self.0.into()));
        response.headers_mut().insert(
            CONTENT_TYPE,
            content_type(&mime::TEXT_HTML_UTF_8),
        );

        response
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        let mut response = http::Response::new(Some(Bytes::from(self)));

        response.headers_mut().insert(
            CONTENT_TYPE,
            content_type(&mime::TEXT_PLAIN_UTF_8),
        );

        response
    }
}

impl<B: IntoResponse> IntoResponse for (StatusCode, B) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;

        response
    }
}
