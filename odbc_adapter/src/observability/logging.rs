use crate::config::{split_connection_string_parts, AdapterConfig};
use crate::error::Result;
use log::Level;
use std::time::Instant;

/// Times and logs every statement the adapter sends.
#[derive(Debug, Clone, Copy)]
pub struct SqlLogger {
    enabled: bool,
}

impl SqlLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enabled unless the config sets `log_sql = false`.
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(config.option_bool("log_sql").unwrap_or(true))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs `f`, logging `sql` at debug level on success and error level on failure.
    pub fn log<T>(&self, sql: &str, name: Option<&str>, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = f();
        if self.enabled {
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            let entry = format_entry(sql, name, elapsed_ms);
            match &result {
                Ok(_) => log::debug!("{}", entry),
                Err(e) => log::error!("{} failed: {}", entry, e),
            }
        }
        result
    }

    pub fn log_connection(&self, level: Level, connection_string: &str, action: &str) {
        if !self.enabled {
            return;
        }
        log::log!(
            level,
            "Connection {}: {}",
            action,
            redact_connection_string(connection_string)
        );
    }
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn format_entry(sql: &str, name: Option<&str>, elapsed_ms: f64) -> String {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => format!("SQL ({}) {} [{:.1}ms]", name, sql, elapsed_ms),
        None => format!("SQL {} [{:.1}ms]", sql, elapsed_ms),
    }
}

/// Masks password values in an ODBC connection string.
pub fn redact_connection_string(connection_string: &str) -> String {
    split_connection_string_parts(connection_string)
        .into_iter()
        .map(|part| match part.split_once('=') {
            Some((key, _)) if matches!(key.trim().to_ascii_lowercase().as_str(), "pwd" | "password") => {
                format!("{}=***", key.trim())
            }
            _ => part.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;

    #[test]
    fn test_sql_logger_default() {
        assert!(SqlLogger::default().is_enabled());
    }

    #[test]
    fn test_sql_logger_from_config() {
        let config = AdapterConfig::new().with_option("log_sql", "false");
        assert!(!SqlLogger::from_config(&config).is_enabled());
        assert!(SqlLogger::from_config(&AdapterConfig::new()).is_enabled());
    }

    #[test]
    fn test_log_passes_result_through() {
        let logger = SqlLogger::new(true);
        let ok = logger.log("SELECT 1", Some("Probe"), || Ok(7));
        assert_eq!(ok.expect("ok"), 7);
        let err: Result<()> = logger.log("BROKEN", None, || {
            Err(AdapterError::StatementInvalid("boom".into()))
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_format_entry() {
        assert_eq!(
            format_entry("SELECT 1", Some("Load"), 1.5),
            "SQL (Load) SELECT 1 [1.5ms]"
        );
        assert_eq!(format_entry("SELECT 1", None, 0.0), "SQL SELECT 1 [0.0ms]");
    }

    #[test]
    fn test_redact_connection_string() {
        assert_eq!(
            redact_connection_string("DSN=PROD;UID=scott;PWD=tiger;"),
            "DSN=PROD;UID=scott;PWD=***"
        );
        assert_eq!(
            redact_connection_string("Driver={Oracle};Password={a;b}"),
            "Driver={Oracle};Password=***"
        );
    }
}
