//! Placeholder image handler

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::web::AppState;

const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000";

static PLACEHOLDER_NAME: OnceLock<Regex> = OnceLock::new();

/// Extract `(width, height)` from `placeholder-{width}x{height}.svg`.
/// Values that do not fit in `u32` are rejected.
pub fn parse_placeholder_name(name: &str) -> Option<(u32, u32)> {
    let pattern = PLACEHOLDER_NAME.get_or_init(|| {
        Regex::new(r"^placeholder-(\d+)x(\d+)\.svg$").expect("placeholder name pattern is valid")
    });
    let captures = pattern.captures(name)?;
    let width = captures.get(1)?.as_str().parse().ok()?;
    let height = captures.get(2)?.as_str().parse().ok()?;
    Some((width, height))
}

/// Serve a rendered placeholder
pub async fn serve_placeholder(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    let Some((width, height)) = parse_placeholder_name(&file) else {
        debug!("Not a placeholder request: {}", file);
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let Some(service) = state.placeholder() else {
        error!(
            "Placeholder renderer unavailable: {}",
            state.startup_error().unwrap_or("not initialized")
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, "Placeholder renderer unavailable")
            .into_response();
    };

    match service.render(width, height) {
        Ok(svg) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(SVG_CONTENT_TYPE));
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
            );
            (headers, svg.to_string()).into_response()
        }
        Err(AppError::Validation { message }) => {
            debug!("Rejected placeholder {}: {}", file, message);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(e) => {
            error!("Failed to render {}: {}", file, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render placeholder").into_response()
        }
    }
}
