//! Response helpers shared across handlers.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use grid_common::GridError;
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

/// Serialize `body` as a JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(json) => (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], json).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to serialize response: {}", e),
        )
            .into_response(),
    }
}

/// JSON error response with the status mapped from the error.
pub fn error_response(err: &GridError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(
        status,
        &ErrorBody {
            error: err.to_string(),
            status: status.as_u16(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_common::GridName;

    #[test]
    fn test_error_status_mapping() {
        let not_found = error_response(&GridError::NotAvailable(GridName::Current));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            not_found.headers()[header::CONTENT_TYPE],
            JSON_CONTENT_TYPE
        );

        let timeout = error_response(&GridError::Timeout(GridName::Wind));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let storage = error_response(&GridError::StorageError("disk".into()));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
