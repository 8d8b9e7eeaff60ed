use super::{Dialect, OracleDialect, PostgresDialect, SqlServerDialect};
use crate::config::AdapterConfig;
use crate::directory::DirectoryLookup;
use crate::error::Result;
use std::sync::Arc;

/// Collects dialects in registration order.
#[derive(Default)]
pub struct DialectRegistryBuilder {
    dialects: Vec<Arc<dyn Dialect>>,
}

impl DialectRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialects.push(dialect);
        self
    }

    pub fn build(self) -> DialectRegistry {
        DialectRegistry {
            dialects: self.dialects.into(),
        }
    }
}

/// Immutable, ordered set of dialects. Cloning shares the same slice.
///
/// Matching scans in registration order and the first match wins, so a
/// registry built from the same calls always resolves the same way.
#[derive(Clone)]
pub struct DialectRegistry {
    dialects: Arc<[Arc<dyn Dialect>]>,
}

impl DialectRegistry {
    pub fn builder() -> DialectRegistryBuilder {
        DialectRegistryBuilder::new()
    }

    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Oracle, PostgreSQL and SQL Server, in that order.
    pub fn with_builtins() -> Self {
        Self::builder()
            .register(Arc::new(OracleDialect::new()))
            .register(Arc::new(PostgresDialect::new()))
            .register(Arc::new(SqlServerDialect::new()))
            .build()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.iter().find(|d| d.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.dialects.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }

    /// First registered dialect whose matcher accepts `key`.
    pub fn find(&self, key: &str, config: &AdapterConfig) -> Option<Arc<dyn Dialect>> {
        self.dialects
            .iter()
            .find(|d| d.matches(key, config))
            .cloned()
    }

    /// Picks the dialect for `config`.
    ///
    /// When nothing matches, `jndi` is set and `dialect` is not, the product
    /// name reported by the data source is written into `config.dialect` and
    /// matching runs once more. `Ok(None)` means generic behaviour.
    pub fn resolve(
        &self,
        config: &mut AdapterConfig,
        lookup: Option<&dyn DirectoryLookup>,
    ) -> Result<Option<Arc<dyn Dialect>>> {
        for pass in 0..2 {
            let key = config.dialect_key();
            if let Some(dialect) = self.find(&key, config) {
                log::info!("Using {} dialect (matched '{}')", dialect.name(), key);
                return Ok(Some(dialect));
            }
            if pass > 0 || config.dialect.is_some() {
                break;
            }
            let (Some(name), Some(lookup)) = (config.jndi.clone(), lookup) else {
                break;
            };
            let product = lookup.database_product_name(&name)?;
            log::debug!("Data source '{}' reports product '{}'", name, product);
            config.dialect = Some(product);
        }
        log::debug!(
            "No dialect matched '{}', using generic behaviour",
            config.dialect_key()
        );
        Ok(None)
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.names())
            .finish()
    }
}
