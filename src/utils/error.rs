use std::time::Duration;
use thiserror::Error;

/// 與 CAS 伺服器之間的傳輸層錯誤，不再細分，原樣往上拋
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CAS server responded with HTTP {status}")]
    Status { status: u16 },

    #[error("CAS validation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum CasError {
    #[error("No ticket found in request.")]
    NoTicket,

    #[error("CAS Authentication Failure: {reason}")]
    AuthenticationFailure {
        code: Option<String>,
        reason: String,
    },

    #[error("Invalid CAS response.")]
    InvalidResponse,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Request should exist so it can be processed for validation.")]
    MissingRequestContext,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 票證無效或回應不可信，呼叫端應視為認證失敗
    Verification,
    Transport,
    /// 沒有 inbound request，屬於使用方式錯誤
    Environment,
    Configuration,
}

impl CasError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CasError::NoTicket
            | CasError::AuthenticationFailure { .. }
            | CasError::InvalidResponse => ErrorCategory::Verification,
            CasError::Transport(_) => ErrorCategory::Transport,
            CasError::MissingRequestContext => ErrorCategory::Environment,
            CasError::IoError(_)
            | CasError::MissingConfigError { .. }
            | CasError::InvalidConfigValueError { .. }
            | CasError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 傳輸錯誤也算驗證失敗的一種：呼叫端無法得到可信的身分
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Verification | ErrorCategory::Transport
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CasError::NoTicket => "Make sure the CAS login redirect appends a ticket parameter",
            CasError::AuthenticationFailure { .. } => {
                "Tickets are single use; restart the CAS login flow"
            }
            CasError::InvalidResponse => {
                "Check the validation URL and the configured namespace prefix"
            }
            CasError::Transport(_) => "Check connectivity to the CAS server and its TLS setup",
            CasError::MissingRequestContext => {
                "Call the verifier from within an inbound request context"
            }
            CasError::IoError(_)
            | CasError::MissingConfigError { .. }
            | CasError::InvalidConfigValueError { .. }
            | CasError::ConfigValidationError { .. } => "Review the configuration file",
        }
    }
}

pub type Result<T> = std::result::Result<T, CasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_protocol_wording() {
        assert_eq!(CasError::NoTicket.to_string(), "No ticket found in request.");
        assert_eq!(CasError::InvalidResponse.to_string(), "Invalid CAS response.");

        let err = CasError::AuthenticationFailure {
            code: Some("INVALID_TICKET".to_string()),
            reason: "Ticket ST-1856339 not recognized".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "CAS Authentication Failure: Ticket ST-1856339 not recognized"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(CasError::NoTicket.category(), ErrorCategory::Verification);
        assert_eq!(
            CasError::MissingRequestContext.category(),
            ErrorCategory::Environment
        );
        assert!(!CasError::MissingRequestContext.is_verification_failure());

        let transport = CasError::from(TransportError::Status { status: 502 });
        assert_eq!(transport.category(), ErrorCategory::Transport);
        assert!(transport.is_verification_failure());
        assert_eq!(transport.to_string(), "CAS server responded with HTTP 502");
    }
}
