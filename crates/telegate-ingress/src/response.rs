//! Response envelope and error mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use telegate_core::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

/// The single terminal response produced for a telemetry request
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryResponse {
    pub status: StatusCode,
    pub body: Option<ResponseBody>,
}

impl TelemetryResponse {
    pub fn ok() -> Self {
        Self::empty(StatusCode::OK)
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// 200 with `payload` as JSON body.
    pub fn json<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self {
                status: StatusCode::OK,
                body: Some(ResponseBody::Json(value)),
            },
            Err(e) => handle_error(Some(&Error::from(e)), StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Map a failure, or the lack of an explicit success, to a response.
///
/// - [`Error::Api`] keeps its own status and body.
/// - Validation-class errors become 400 with the message as body.
/// - Anything else, including `None`, becomes `default_status` with no body.
pub fn handle_error(error: Option<&Error>, default_status: StatusCode) -> TelemetryResponse {
    match error {
        Some(Error::Api { status, body }) => TelemetryResponse {
            status: StatusCode::from_u16(*status).unwrap_or(default_status),
            body: body.clone().map(ResponseBody::Json),
        },
        Some(e) if e.is_validation() => TelemetryResponse {
            status: StatusCode::BAD_REQUEST,
            body: Some(ResponseBody::Text(e.to_string())),
        },
        Some(e) => {
            tracing::debug!(error = %e, status = %default_status, "Telemetry request failed");
            TelemetryResponse::empty(default_status)
        }
        None => TelemetryResponse::empty(default_status),
    }
}

impl IntoResponse for TelemetryResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(ResponseBody::Json(value)) => (self.status, Json(value)).into_response(),
            Some(ResponseBody::Text(text)) => (self.status, text).into_response(),
            None => self.status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_used_verbatim() {
        let error = Error::Api {
            status: 404,
            body: Some(serde_json::json!({"message": "Entity not found"})),
        };
        let response = handle_error(Some(&error), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.body,
            Some(ResponseBody::Json(serde_json::json!({"message": "Entity not found"})))
        );
    }

    #[test]
    fn test_validation_error_is_400_with_message() {
        let error = Error::validation("incomplete time range");
        let response = handle_error(Some(&error), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            Some(ResponseBody::Text("incomplete time range".into()))
        );
    }

    #[test]
    fn test_other_errors_use_default_status() {
        let store = Error::Store("connection reset".into());
        assert_eq!(
            handle_error(Some(&store), StatusCode::INTERNAL_SERVER_ERROR),
            TelemetryResponse::empty(StatusCode::INTERNAL_SERVER_ERROR)
        );

        let malformed = Error::malformed("bad path");
        assert_eq!(
            handle_error(Some(&malformed), StatusCode::BAD_REQUEST),
            TelemetryResponse::empty(StatusCode::BAD_REQUEST)
        );
    }

    #[test]
    fn test_absent_error_falls_through_to_default() {
        assert_eq!(
            handle_error(None, StatusCode::BAD_REQUEST),
            TelemetryResponse::empty(StatusCode::BAD_REQUEST)
        );
    }

    #[test]
    fn test_invalid_api_status_falls_back() {
        let error = Error::Api {
            status: 20,
            body: None,
        };
        let response = handle_error(Some(&error), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, None);
    }

    #[test]
    fn test_into_response_status() {
        let response = handle_error(Some(&Error::validation("nope")), StatusCode::OK).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
