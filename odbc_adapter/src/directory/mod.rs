//! Data source name lookups used to discover the database product.

use crate::config::AdapterConfig;
use crate::connection::{CatalogSql, Connection, OdbcConnection};
use crate::error::{AdapterError, Result};
use crate::security::Secret;
use std::collections::HashMap;

/// Resolves a symbolic data source name to the product it serves.
pub trait DirectoryLookup: Send + Sync {
    fn database_product_name(&self, name: &str) -> Result<String>;
}

/// Opens a short-lived ODBC session on `DSN=<name>` and asks the driver
/// for the DBMS name.
#[derive(Debug, Clone, Default)]
pub struct OdbcDataSourceLookup {
    username: Option<String>,
    password: Option<Secret>,
    login_timeout_sec: Option<u32>,
}

impl OdbcDataSourceLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses the credentials and login timeout of an adapter configuration.
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            login_timeout_sec: config
                .option_u64("login_timeout")
                .and_then(|t| u32::try_from(t).ok()),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: &str) -> Self {
        self.username = Some(username.into());
        self.password = Some(Secret::from(password));
        self
    }

    pub fn with_login_timeout(mut self, seconds: u32) -> Self {
        self.login_timeout_sec = Some(seconds);
        self
    }

    fn connection_string(&self, name: &str) -> Result<String> {
        let config = AdapterConfig {
            jndi: Some(name.to_string()),
            username: self.username.clone(),
            password: self.password.clone(),
            ..AdapterConfig::default()
        };
        config.connection_string()
    }
}

impl DirectoryLookup for OdbcDataSourceLookup {
    fn database_product_name(&self, name: &str) -> Result<String> {
        let conn_str = self.connection_string(name)?;
        let wrap = |e: AdapterError| AdapterError::DirectoryLookup(format!("{}: {}", name, e));

        let mut conn = OdbcConnection::connect_with_timeout(
            &conn_str,
            CatalogSql::default(),
            self.login_timeout_sec,
        )
        .map_err(wrap)?;
        let product = conn.database_product_name().map_err(wrap);
        if let Err(e) = conn.disconnect() {
            log::warn!("Failed to close lookup session for '{}': {}", name, e);
        }
        product
    }
}

/// Fixed name-to-product table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, product: impl Into<String>) -> Self {
        self.insert(name, product);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, product: impl Into<String>) {
        self.entries.insert(name.into(), product.into());
    }
}

impl DirectoryLookup for StaticDirectory {
    fn database_product_name(&self, name: &str) -> Result<String> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::DirectoryLookup(format!("unknown data source: {}", name)))
    }
}
