use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("Fastbill API reported errors for {service}: {errors}")]
    ApiResponseError { service: String, errors: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Pagination error: {message}")]
    PaginationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Api,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(e) if e.is_decode() => ErrorCategory::Data,
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::HttpStatusError { .. }
            | EtlError::ApiResponseError { .. }
            | EtlError::PaginationError { .. } => ErrorCategory::Api,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Api if self.is_transient() => ErrorSeverity::Medium,
            ErrorCategory::Api | ErrorCategory::Data | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// Failures worth another attempt: connect/timeout errors, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            EtlError::ApiError(e) => e.is_timeout() || e.is_connect(),
            EtlError::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::HttpStatusError { status: 401 | 403, .. } => {
                "Check the Fastbill username (e-mail) and API key"
            }
            EtlError::HttpStatusError { status: 429, .. } => {
                "The API is rate limiting requests, wait a moment and run again"
            }
            EtlError::ApiResponseError { .. } => {
                "Inspect the error reported by Fastbill and the account permissions"
            }
            EtlError::PaginationError { .. } => {
                "The API returned an unexpected offset, try reducing the page size"
            }
            _ => match self.category() {
                ErrorCategory::Configuration => {
                    "Review the command-line flags or the TOML configuration file"
                }
                ErrorCategory::Network => "Check network connectivity and the API base URL",
                ErrorCategory::Api => "Retry later or verify the Fastbill service status",
                ErrorCategory::Data => "The API response had an unexpected shape, run with --verbose",
                ErrorCategory::System => "Check that the output path exists and is writable",
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Network => format!("Could not reach the Fastbill API: {}", self),
            ErrorCategory::Api => format!("The Fastbill API rejected the request: {}", self),
            ErrorCategory::Data => format!("Could not process the API data: {}", self),
            ErrorCategory::System => format!("Could not write the export: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        let unavailable = EtlError::HttpStatusError {
            status: 503,
            body: String::new(),
        };
        assert!(unavailable.is_transient());
        assert_eq!(unavailable.severity(), ErrorSeverity::Medium);

        let unauthorized = EtlError::HttpStatusError {
            status: 401,
            body: "denied".to_string(),
        };
        assert!(!unauthorized.is_transient());
        assert_eq!(unauthorized.category(), ErrorCategory::Api);
        assert_eq!(unauthorized.severity(), ErrorSeverity::High);
        assert!(unauthorized.recovery_suggestion().contains("API key"));
    }

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = EtlError::MissingConfigError {
            field: "username".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("username"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = EtlError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let throttled = EtlError::HttpStatusError {
            status: 429,
            body: String::new(),
        };
        assert_eq!(throttled.exit_code(), 2);

        let invalid = EtlError::ConfigError {
            message: "bad".to_string(),
        };
        assert_eq!(invalid.exit_code(), 1);
    }
}
