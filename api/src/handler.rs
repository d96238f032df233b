use http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        CONTENT_LENGTH, LOCATION,
    },
    HeaderValue, Method, StatusCode,
};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::{
    assets,
    directory::DirectoryError,
    http::{Html, IntoResponse, Json, Request, Response},
    AppState,
};

use self::payload::{ErrorBody, PersonPayload};

pub async fn route_request(mut request: Request, app_state: AppState) -> Response {
    // HEAD is answered like GET, minus the body
    let is_head = request.method() == Method::HEAD;
    if is_head {
        *request.method_mut() = Method::GET;
    }

    let mut response = dispatch(request, app_state).await;
    if is_head {
        if let Some(body) = response.body_mut().take() {
            response.headers_mut().insert(CONTENT_LENGTH, body.len().into());
        }
    }

    response.headers_mut().insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );

    response
}

async fn dispatch(request: Request, app_state: AppState) -> Response {
    macro_rules! routes {
        (@matches $rest:ident) => { $rest.is_empty() };
        (@matches $rest:ident $v:ident) => { !$rest.is_empty() && !$rest.contains('/') };
        (
            $($m:ident $p:literal $($v:ident)? => $f:expr),*
            $(, _ => $wc:expr)?
        ) => {
            $(if request.method() == Method::$m {
                let path = request.uri().path();
                let path = path.strip_suffix('/').unwrap_or(path);
                if let Some(_rest) = path.strip_prefix($p) {
                    if routes!(@matches _rest $($v)?) {
                        $(let $v = _rest.to_owned();)?
                        return $f;
                    }
                }
            })*
            $(return $wc;)?
        };
    }

    if request.method() == Method::OPTIONS {
        return preflight();
    }

    routes!(
        GET "/api/persons/" id => get_person(app_state, &id).await,
        PUT "/api/persons/" id => update_person(app_state, &id, request).await,
        DELETE "/api/persons/" id => delete_person(app_state, &id).await,
        GET "/api/persons" => list_people(app_state).await,
        POST "/api/persons" => create_person(app_state, request).await,
        GET "/info" => info(app_state).await,
        _ => fallback(app_state, request).await
    );
}

async fn list_people(app_state: AppState) -> Response {
    match app_state.directory.list().await {
        Ok(people) => (StatusCode::OK, Json(people)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_person(app_state: AppState, id: &str) -> Response {
    match app_state.directory.get_by_id(id).await {
        Ok(person) => (StatusCode::OK, Json(person)).into_response(),
        Err(DirectoryError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_person(app_state: AppState, request: Request) -> Response {
    let payload = match PersonPayload::from_request(request) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    let person = match app_state
        .directory
        .create(payload.name, payload.number)
        .await
    {
        Ok(person) => person,
        Err(err) => return err.into_response(),
    };

    let mut response = (StatusCode::CREATED, Json(&person)).into_response();
    if let Ok(location) = HeaderValue::try_from(format!("/api/persons/{}", person.id)) {
        response.headers_mut().insert(LOCATION, location);
    }

    response
}

async fn update_person(app_state: AppState, id: &str, request: Request) -> Response {
    let payload = match PersonPayload::from_request(request) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match app_state
        .directory
        .update(id, payload.name, payload.number)
        .await
    {
        Ok(person) => (StatusCode::OK, Json(person)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_person(app_state: AppState, id: &str) -> Response {
    match app_state.directory.delete(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(DirectoryError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn info(app_state: AppState) -> Response {
    let count = match app_state.directory.count().await {
        Ok(count) => count,
        Err(err) => return err.into_response(),
    };

    let now = OffsetDateTime::now_utc();
    let now = now.format(&Rfc2822).unwrap_or_else(|_| now.to_string());

    let page = format!("<p>Phonebook has info for {count} people</p>\n<p>{now}</p>\n");
    (StatusCode::OK, Html(page)).into_response()
}

async fn fallback(app_state: AppState, request: Request) -> Response {
    let path = request.uri().path();
    let is_api = path == "/api" || path.starts_with("/api/");

    if !is_api && request.method() == Method::GET {
        return assets::serve(&app_state.static_dir, path).await;
    }

    tracing::debug!(method = %request.method(), path, "unknown route");
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("unknown endpoint"))).into_response()
}

fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,HEAD,PUT,POST,DELETE"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );

    response
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let status = match &self {
            DirectoryError::MalformedId | DirectoryError::Validation(_) => StatusCode::BAD_REQUEST,
            DirectoryError::NotFound => StatusCode::NOT_FOUND,
            DirectoryError::DuplicateName => StatusCode::CONFLICT,
            DirectoryError::StorageUnavailable(err) => {
                tracing::error!(error = ?err, "storage failure");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new("internal server error")),
                )
                    .into_response();
            }
        };

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

mod payload {
    use super::*;

    #[derive(Debug, serde::Serialize)]
    pub(super) struct ErrorBody {
        pub error: String,
    }

    impl ErrorBody {
        pub fn new(error: impl Into<String>) -> Self {
            Self {
                error: error.into(),
            }
        }
    }

    /// Both fields are optional so a missing one is reported by the
    /// validator instead of as a JSON error.
    #[derive(Debug, Default, serde::Deserialize)]
    pub(super) struct PersonPayload {
        pub name: Option<String>,
        pub number: Option<String>,
    }

    impl PersonPayload {
        pub fn from_request(request: Request) -> Result<Self, Response> {
            let Some(body) = request.into_body().filter(|body| !body.is_empty()) else {
                return Ok(Self::default());
            };

            serde_json::from_slice(&body).map_err(|err| {
                tracing::debug!(%err, "rejected request body");
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new("malformatted json"))).into_response()
            })
        }
    }
}
