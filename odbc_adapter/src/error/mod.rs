use odbc_api::handles::Record as OdbcRecord;
use thiserror::Error;

/// Coarse classification for callers and pools deciding what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Fatal,
    /// Bad input or configuration, or a statement the adapter refused.
    Validation,
    ConnectionLost,
}

#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    #[error("ODBC error: {0}")]
    OdbcApi(String),

    #[error("Connection string is empty")]
    EmptyConnectionString,

    #[error("Environment not initialized")]
    EnvironmentNotInitialized,

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Structured error: {message}")]
    Structured {
        sqlstate: [u8; 5],
        native_code: i32,
        message: String,
    },

    /// Raised by the adapter itself for statements it refuses to issue.
    #[error("Statement invalid: {0}")]
    StatementInvalid(String),

    #[error("Directory lookup failed: {0}")]
    DirectoryLookup(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pool error: {0}")]
    PoolError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
}

impl From<odbc_api::Error> for AdapterError {
    fn from(err: odbc_api::Error) -> Self {
        if let Some(structured) = try_extract_structured(&err) {
            return structured;
        }
        AdapterError::OdbcApi(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Config(err.to_string())
    }
}

fn try_extract_structured(err: &odbc_api::Error) -> Option<AdapterError> {
    use odbc_api::Error as OdbcErr;
    let record = match err {
        OdbcErr::Diagnostics { record, .. } => record,
        OdbcErr::UnsupportedOdbcApiVersion(record) => record,
        OdbcErr::InvalidRowArraySize { record, .. } => record,
        OdbcErr::UnableToRepresentNull(record) => record,
        OdbcErr::OracleOdbcDriverDoesNotSupport64Bit(record) => record,
        _ => return None,
    };
    Some(structured_from_odbc_record(record))
}

fn structured_from_odbc_record(record: &OdbcRecord) -> AdapterError {
    AdapterError::Structured {
        sqlstate: record.state.0,
        native_code: record.native_error,
        message: record.to_string(),
    }
}

impl AdapterError {
    pub fn sqlstate(&self) -> [u8; 5] {
        match self {
            AdapterError::Structured { sqlstate, .. } => *sqlstate,
            _ => [0u8; 5],
        }
    }

    pub fn native_code(&self) -> i32 {
        match self {
            AdapterError::Structured { native_code, .. } => *native_code,
            _ => 0,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AdapterError::Structured { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }

    /// Returns true if the error is transient and may be retried by the caller.
    /// The adapter never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdapterError::Structured { sqlstate, .. } => sqlstate[0] == b'0' && sqlstate[1] == b'8',
            AdapterError::PoolError(_) => true,
            AdapterError::InternalError(msg) => msg.contains("timeout") || msg.contains("Timeout"),
            _ => false,
        }
    }

    /// Closed handles and SQLSTATE class 08.
    pub fn is_connection_error(&self) -> bool {
        match self {
            AdapterError::EmptyConnectionString
            | AdapterError::EnvironmentNotInitialized
            | AdapterError::ConnectionClosed => true,
            AdapterError::Structured { sqlstate, .. } => sqlstate[0] == b'0' && sqlstate[1] == b'8',
            _ => false,
        }
    }

    pub fn error_category(&self) -> ErrorCategory {
        if matches!(
            self,
            AdapterError::ValidationError(_)
                | AdapterError::StatementInvalid(_)
                | AdapterError::Config(_)
        ) {
            return ErrorCategory::Validation;
        }
        if matches!(self, AdapterError::UnsupportedFeature(_)) {
            return ErrorCategory::Fatal;
        }
        if self.is_connection_error() {
            return ErrorCategory::ConnectionLost;
        }
        if self.is_retryable() {
            return ErrorCategory::Transient;
        }
        ErrorCategory::Fatal
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AdapterError::EmptyConnectionString.to_string(),
            "Connection string is empty"
        );
        assert_eq!(
            AdapterError::StatementInvalid("name foo_seq too long".to_string()).to_string(),
            "Statement invalid: name foo_seq too long"
        );
        assert!(AdapterError::DirectoryLookup("no such DSN".to_string())
            .to_string()
            .contains("no such DSN"));
        assert!(AdapterError::UnsupportedFeature("structure_dump".to_string())
            .to_string()
            .contains("structure_dump"));
    }

    #[test]
    fn test_structured_error_properties() {
        let err = AdapterError::Structured {
            sqlstate: *b"42000",
            native_code: 942,
            message: "ORA-00942: table or view does not exist".to_string(),
        };

        assert_eq!(&err.sqlstate(), b"42000");
        assert_eq!(err.native_code(), 942);
        assert!(err.message().starts_with("ORA-00942"));
        assert!(!err.is_retryable());
        assert_eq!(err.error_category(), ErrorCategory::Fatal);
    }

    #[test]
    fn test_non_structured_error_defaults() {
        let err = AdapterError::ConnectionClosed;
        assert_eq!(err.sqlstate(), [0u8; 5]);
        assert_eq!(err.native_code(), 0);
        assert_eq!(err.message(), "Connection is closed");
    }

    #[test]
    fn test_connection_errors_are_classified() {
        let lost = AdapterError::Structured {
            sqlstate: *b"08S01",
            native_code: 0,
            message: "communication link failure".to_string(),
        };
        assert!(lost.is_connection_error());
        assert!(lost.is_retryable());
        assert_eq!(lost.error_category(), ErrorCategory::ConnectionLost);
        assert_eq!(
            AdapterError::ConnectionClosed.error_category(),
            ErrorCategory::ConnectionLost
        );
    }

    #[test]
    fn test_validation_category() {
        assert_eq!(
            AdapterError::StatementInvalid("x".into()).error_category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AdapterError::Config("x".into()).error_category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AdapterError::PoolError("exhausted".into()).error_category(),
            ErrorCategory::Transient
        );
    }

    #[test]
    fn test_serde_json_error_converts_to_config() {
        let err: AdapterError = serde_json::from_str::<serde_json::Value>("{")
            .map_err(AdapterError::from)
            .unwrap_err();
        assert!(matches!(err, AdapterError::Config(_)));
    }
}
