pub mod config;
pub mod error;

pub use config::SignkeepConfig;
pub use error::{SignkeepError, SignkeepResult};
