//! Helper functions for reading environment variables in tests

/// Full connection string of the Oracle test database, from `ORACLE_TEST_DSN`.
/// Returns None if not set (tests should be skipped in this case)
pub fn get_test_dsn() -> Option<String> {
    std::env::var("ORACLE_TEST_DSN")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Build an Oracle connection string from components
pub fn build_oracle_conn_str(
    driver: &str,
    service: &str,
    username: &str,
    password: &str,
) -> String {
    format!(
        "Driver={{{}}};DBQ={};UID={};PWD={};",
        driver, service, username, password
    )
}

/// Oracle connection string for E2E tests: `ORACLE_TEST_DSN`, or one built
/// from the `ORACLE_TEST_*` component variables when all of them are set.
pub fn get_oracle_test_dsn() -> Option<String> {
    if let Some(dsn) = get_test_dsn() {
        return Some(dsn);
    }

    let driver = std::env::var("ORACLE_TEST_DRIVER").ok()?;
    let service = std::env::var("ORACLE_TEST_SERVICE").ok()?;
    let username = std::env::var("ORACLE_TEST_USER").ok()?;
    let password = std::env::var("ORACLE_TEST_PASSWORD").ok()?;

    Some(build_oracle_conn_str(&driver, &service, &username, &password))
}
