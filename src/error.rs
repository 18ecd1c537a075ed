//! Domain error type for tariff generation

use thiserror::Error;

/// Failure modes surfaced to callers of the tariff engine.
///
/// `InvalidInput` and `NoSolution` are user-correctable; `Storage` wraps
/// database/plumbing failures.
#[derive(Debug, Error)]
pub enum TariffError {
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Could not find hyperbola parameters - check your input points")]
    NoSolution,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl TariffError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable error code used in NATS error replies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::NoSolution => "NO_SOLUTION",
            Self::Storage(_) => "DATABASE_ERROR",
        }
    }

    /// Extra structured details for the error reply, if any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidInput { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TariffError::invalid("point1Km", "bad").code(), "INVALID_INPUT");
        assert_eq!(TariffError::NoSolution.code(), "NO_SOLUTION");
        assert_eq!(TariffError::from(anyhow::anyhow!("down")).code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_invalid_input_message_and_details() {
        let err = TariffError::invalid("hyperMaxKm", "must not exceed maxDistanceKm");
        assert_eq!(
            err.to_string(),
            "Invalid input for 'hyperMaxKm': must not exceed maxDistanceKm"
        );
        assert_eq!(err.details(), Some(serde_json::json!({ "field": "hyperMaxKm" })));
        assert!(TariffError::NoSolution.details().is_none());
    }
}
