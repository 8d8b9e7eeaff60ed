use crate::adapter::Adapter;
use crate::config::{parse_bool_flag, AdapterConfig};
use crate::dialect::DialectRegistry;
use crate::error::{AdapterError, Result};
use r2d2::{Pool, PooledConnection};
use std::time::Duration;

const POOL_TEST_ON_CHECKOUT_ENV: &str = "ODBC_POOL_TEST_ON_CHECKOUT";
const DEFAULT_TEST_ON_CHECKOUT: bool = true;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

fn read_checkout_validation_from_env() -> Option<bool> {
    std::env::var(POOL_TEST_ON_CHECKOUT_ENV)
        .ok()
        .and_then(|value| parse_bool_flag(&value))
}

/// `pool_test_on_checkout` from the config wins over the environment.
fn resolve_checkout_validation(config_override: Option<bool>, env_override: Option<bool>) -> bool {
    config_override
        .or(env_override)
        .unwrap_or(DEFAULT_TEST_ON_CHECKOUT)
}

/// Opens fully resolved adapters for an r2d2 pool.
#[derive(Debug, Clone)]
pub struct AdapterConnectionManager {
    config: AdapterConfig,
    registry: DialectRegistry,
}

impl AdapterConnectionManager {
    pub fn new(config: AdapterConfig, registry: DialectRegistry) -> Self {
        Self { config, registry }
    }
}

impl r2d2::ManageConnection for AdapterConnectionManager {
    type Connection = Adapter;
    type Error = AdapterError;

    fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        Adapter::connect(self.config.clone(), &self.registry)
    }

    fn is_valid(&self, adapter: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        adapter.validate()
    }

    fn has_broken(&self, _adapter: &mut Self::Connection) -> bool {
        false
    }
}

pub struct AdapterPool {
    pool: Pool<AdapterConnectionManager>,
    max_size: u32,
    test_on_check_out: bool,
}

impl AdapterPool {
    pub fn new(config: AdapterConfig, registry: DialectRegistry, max_size: u32) -> Result<Self> {
        let test_on_check_out = resolve_checkout_validation(
            config.option_bool("pool_test_on_checkout"),
            read_checkout_validation_from_env(),
        );
        let timeout = config
            .option_u64("pool_timeout_secs")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT);
        let manager = AdapterConnectionManager::new(config, registry);
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(timeout)
            .test_on_check_out(test_on_check_out)
            .build(manager)
            .map_err(|e| AdapterError::PoolError(format!("Pool creation failed: {}", e)))?;

        Ok(Self {
            pool,
            max_size,
            test_on_check_out,
        })
    }

    pub fn get(&self) -> Result<PooledConnection<AdapterConnectionManager>> {
        self.pool.get().map_err(|e| {
            AdapterError::PoolError(format!("Failed to get adapter from pool: {}", e))
        })
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn test_on_check_out(&self) -> bool {
        self.test_on_check_out
    }

    pub fn state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            size: state.connections,
            idle: state.idle_connections,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub size: u32,
    pub idle: u32,
}
