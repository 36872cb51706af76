//! Startup utilities: logging bootstrap and inventory loading.

mod inventory;
mod logging;

pub use inventory::load_inventory;
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
