pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logger;

pub use application::engine::TopUpEngine;
pub use application::supervisor::ConnectionSupervisor;
pub use config::ControllerConfig;
pub use error::{LedgerError, Result};
