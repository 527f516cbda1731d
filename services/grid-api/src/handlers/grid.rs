//! Grid record and grid availability handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
};
use bytes::Bytes;
use grid_common::GridName;
use tracing::{debug, error, instrument, warn};

use super::common::{error_response, json_response, JSON_CONTENT_TYPE};
use crate::encoding::{accepts_gzip, gzip};
use crate::metrics::{record_bytes_sent, record_grid_request};
use crate::state::AppState;

/// GET /api/grid-status - Which grids have a persisted record
pub async fn grid_status_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let status = state.cache.status().await;
    json_response(StatusCode::OK, &status)
}

/// GET /api/grid/:name - Canonical record bytes, gzip when accepted
#[instrument(skip(state, headers))]
pub async fn grid_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let label = name.parse::<GridName>().map_or("unknown", |g| g.as_str());
    let wants_gzip = accepts_gzip(&headers);

    let raw = match state.cache.fetch_named(&name).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.is_not_found() {
                debug!(error = %e, "Grid not found");
            } else {
                error!(error = %e, "Failed to load grid");
            }
            record_grid_request(label, e.http_status_code(), false);
            return error_response(&e);
        }
    };

    let (body, encoding) = if wants_gzip {
        match gzip(&raw) {
            Ok(compressed) => (Bytes::from(compressed), Some("gzip")),
            Err(e) => {
                warn!(error = %e, "Compression failed, sending identity");
                (raw, None)
            }
        }
    } else {
        (raw, None)
    };

    record_grid_request(label, 200, encoding.is_some());
    record_bytes_sent(label, body.len());

    let mut response_headers = vec![
        (header::CONTENT_TYPE, JSON_CONTENT_TYPE.to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (header::VARY, "Accept-Encoding".to_string()),
        (header::CONTENT_LENGTH, body.len().to_string()),
    ];
    if let Some(encoding) = encoding {
        response_headers.push((header::CONTENT_ENCODING, encoding.to_string()));
    }

    (StatusCode::OK, AppendHeaders(response_headers), body).into_response()
}
