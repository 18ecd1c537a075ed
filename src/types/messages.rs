//! NATS message types

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::error::TariffError;

/// Generic request wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

/// Generic success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(request_id: Uuid, payload: T) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(request_id: Uuid, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Build an error reply carrying the tariff error's code and details
    pub fn from_tariff_error(request_id: Uuid, err: &TariffError) -> Self {
        let mut response = Self::new(request_id, err.code(), err.to_string());
        response.error.details = err.details();
        response
    }
}

/// Empty payload object. Wrap it in `Option` to also accept `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyPayload {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize() {
        let json = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "timestamp": "2026-01-15T10:00:00Z",
            "payload": { "distanceKm": 12.5 }
        }"#;

        let request: Request<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(request.payload["distanceKm"], 12.5);
    }

    #[test]
    fn test_request_with_empty_payload() {
        let json = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "timestamp": "2026-01-15T10:00:00Z",
            "payload": {}
        }"#;

        let request: Request<Option<EmptyPayload>> = serde_json::from_str(json).unwrap();
        assert_eq!(request.id.to_string(), "123e4567-e89b-12d3-a456-426614174000");
        assert!(request.payload.is_some());
    }

    #[test]
    fn test_request_with_null_or_missing_payload() {
        let null_payload = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "timestamp": "2026-01-15T10:00:00Z",
            "payload": null
        }"#;
        let request: Request<Option<EmptyPayload>> = serde_json::from_str(null_payload).unwrap();
        assert!(request.payload.is_none());

        let missing_payload = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "timestamp": "2026-01-15T10:00:00Z"
        }"#;
        let request: Request<Option<EmptyPayload>> = serde_json::from_str(missing_payload).unwrap();
        assert!(request.payload.is_none());
    }

    #[test]
    fn test_error_response_from_invalid_input() {
        let err = TariffError::invalid("marginPercent", "must be between 0 and 100, got 120");
        let response = ErrorResponse::from_tariff_error(Uuid::nil(), &err);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":\"INVALID_INPUT\""));
        assert!(json.contains("\"field\":\"marginPercent\""));
    }

    #[test]
    fn test_error_response_omits_missing_details() {
        let response = ErrorResponse::from_tariff_error(Uuid::nil(), &TariffError::NoSolution);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":\"NO_SOLUTION\""));
        assert!(!json.contains("details"));
    }
}
