pub mod config;
pub mod error;

pub use config::DeskpilotConfig;
pub use error::{DeskpilotError, Result};
