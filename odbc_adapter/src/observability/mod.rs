pub mod logging;

pub use logging::SqlLogger;
