pub mod adapter;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod directory;
mod error;
pub mod observability;
pub mod pool;
pub mod schema;
pub mod security;
pub mod sql;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use adapter::{Adapter, PostSaveHook, SavedRecord};
pub use config::AdapterConfig;
pub use connection::{Connection, ExecResult, OdbcConnection, Row};
pub use dialect::{Dialect, DialectRegistry, GenericDialect, OracleDialect};
pub use directory::{DirectoryLookup, OdbcDataSourceLookup, StaticDirectory};
pub use error::{AdapterError, ErrorCategory, Result};
pub use types::{ColumnDescriptor, ColumnType, TypeMap, Value};
