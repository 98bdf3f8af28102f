//! Tramita Core — configuration and error taxonomy.

pub mod config;
pub mod error;

pub use config::TramitaConfig;
pub use error::{Error, Result};
