use std::path::{Component, Path, PathBuf};

use http::{header::CONTENT_TYPE, StatusCode};
use mime::Mime;

use crate::http::{content_type, IntoResponse, Response};

const INDEX: &str = "index.html";

/// Serves the front-end build. Unknown paths fall back to `index.html` so the
/// client-side router can handle them.
pub async fn serve(static_dir: &Path, path: &str) -> Response {
    let Some(relative) = sanitize(path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let file = static_dir.join(relative);
    let (file, body) = match read_file(&file).await {
        Some(body) => (file, body),
        None => {
            let index = static_dir.join(INDEX);
            match read_file(&index).await {
                Some(body) => (index, body),
                None => {
                    tracing::debug!(?static_dir, path, "no front-end build to serve");
                    return StatusCode::NOT_FOUND.into_response();
                }
            }
        }
    };

    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, content_type(&guess_mime(&file)));

    response
}

async fn read_file(path: &Path) -> Option<bytes::Bytes> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }

    match tokio::fs::read(path).await {
        Ok(contents) => Some(contents.into()),
        Err(err) => {
            tracing::warn!(%err, ?path, "failed to read static file");
            None
        }
    }
}

/// Maps a request path onto a relative file path, refusing anything that
/// could escape the static directory.
fn sanitize(path: &str) -> Option<PathBuf> {
    let path = path.trim_start_matches('/');
    if path.contains('\\') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        relative.push(INDEX);
    }

    Some(relative)
}

fn guess_mime(path: &Path) -> Mime {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json" | "map") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        Some("ico") => "image/x-icon"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
