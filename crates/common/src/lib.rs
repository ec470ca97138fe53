//! Shared types, config, and error definitions for the flight board.

pub mod airline;
pub mod config;
pub mod error;
pub mod types;

pub use config::ServiceConfig;
pub use error::Error;
pub use types::*;
