pub mod e2e;
pub mod env;

#[allow(unused_imports)]
pub use e2e::{
    can_connect_to_oracle, detect_database_type, oracle_config, should_run_e2e_tests,
    DatabaseType,
};
#[allow(unused_imports)]
pub use env::{build_oracle_conn_str, get_oracle_test_dsn, get_test_dsn};
