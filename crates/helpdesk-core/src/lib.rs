pub mod config;
pub mod error;
pub mod seed;
pub mod types;

pub use config::HelpdeskConfig;
pub use error::{HelpdeskError, Result};
pub use types::*;
