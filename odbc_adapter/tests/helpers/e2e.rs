//! Gates for the live-database tests.
use super::env::get_oracle_test_dsn;
use odbc_adapter::connection::{CatalogSql, Connection, OdbcConnection};
use odbc_adapter::test_helpers::load_dotenv;
use odbc_adapter::AdapterConfig;

/// Detected database type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Oracle,
    SqlServer,
    PostgreSQL,
    Unknown,
}

/// Detects database type from the connection string.
pub fn detect_database_type(conn_str: &str) -> DatabaseType {
    let conn_lower = conn_str.to_lowercase();

    if conn_lower.contains("oracle") || conn_lower.contains("dbq=") {
        return DatabaseType::Oracle;
    }

    if conn_lower.contains("sql server") || conn_lower.contains("driver={odbc driver") {
        return DatabaseType::SqlServer;
    }

    if conn_lower.contains("postgresql") {
        return DatabaseType::PostgreSQL;
    }

    DatabaseType::Unknown
}

/// Adapter configuration for the Oracle test database.
#[allow(dead_code)]
pub fn oracle_config() -> Option<AdapterConfig> {
    load_dotenv();
    let conn_str = get_oracle_test_dsn()?;
    AdapterConfig::from_connection_string(&conn_str).ok()
}

/// Checks whether the Oracle test database accepts connections.
#[allow(dead_code)]
pub fn can_connect_to_oracle() -> bool {
    load_dotenv();

    let Some(conn_str) = get_oracle_test_dsn() else {
        return false;
    };

    match OdbcConnection::connect(&conn_str, CatalogSql::oracle()) {
        Ok(mut conn) => {
            let _ = conn.disconnect();
            eprintln!(
                "[OK] Connected (detected as {:?})",
                detect_database_type(&conn_str)
            );
            true
        }
        Err(e) => {
            eprintln!("[ERROR] Connection failed: {:?}", e);
            false
        }
    }
}

/// True when ENABLE_E2E_TESTS is set to a truthy value and the Oracle test
/// database answers.
#[allow(dead_code)]
pub fn should_run_e2e_tests() -> bool {
    load_dotenv();

    let enabled = std::env::var("ENABLE_E2E_TESTS")
        .map(|raw| matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y"))
        .unwrap_or(false);

    enabled && can_connect_to_oracle()
}
