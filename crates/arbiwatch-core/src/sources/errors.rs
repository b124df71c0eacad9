use crate::errors::ArbiwatchError;

/// Typed failure of one source fetch.
///
/// Fetchers never panic or propagate past their own boundary; every
/// transport, status and decode problem ends up as one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("{source_name} requires a credential but none is available")]
    Unauthorized { source_name: &'static str },

    #[error("HTTP error! status: {status}")]
    HttpStatus { status: u16 },

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("Network failure: {message}")]
    NetworkFailure { message: String },

    #[error("Source reported failure: {message}")]
    Rejected { message: String },
}

impl FetchError {
    pub fn malformed(message: impl Into<String>) -> Self {
        FetchError::MalformedPayload {
            message: message.into(),
        }
    }
}

impl ArbiwatchError for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Unauthorized { .. } => "FETCH_UNAUTHORIZED",
            FetchError::HttpStatus { .. } => "FETCH_HTTP_STATUS",
            FetchError::MalformedPayload { .. } => "FETCH_MALFORMED_PAYLOAD",
            FetchError::NetworkFailure { .. } => "FETCH_NETWORK_FAILURE",
            FetchError::Rejected { .. } => "FETCH_REJECTED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, FetchError::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let error = FetchError::HttpStatus { status: 500 };
        assert_eq!(error.to_string(), "HTTP error! status: 500");
        assert_eq!(error.error_code(), "FETCH_HTTP_STATUS");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_unauthorized_is_user_error() {
        let error = FetchError::Unauthorized {
            source_name: "pairs",
        };
        assert_eq!(
            error.to_string(),
            "pairs requires a credential but none is available"
        );
        assert!(error.is_user_error());
    }
}
