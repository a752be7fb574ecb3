//! Utility types shared by the skilld crates: attribute values,
//! configuration and logging helpers.

pub mod attrs;
pub mod config;
pub mod logging;

pub use attrs::{AttrValue, Attrs};
pub use config::RepositoryConfig;
pub use logging::LogLevel;
