pub mod config;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{HireflowError, Result};
pub use event::PresenceHub;
pub use types::*;
