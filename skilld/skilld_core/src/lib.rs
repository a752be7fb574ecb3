//! # skilld core
//!
//! `skilld_core` holds the building blocks shared by the skill repository:
//! the error taxonomy, typed endpoint keys, identifier validation, attribute
//! values, configuration, logging helpers and the instrumented lock that
//! guards repository state.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for repository operations and configuration
//! - **key**: Typed `(snap, name)` keys for skills and slots
//! - **name**: Validation of snap, skill, slot and type names
//! - **sync**: `TrackedMutex`, a `parking_lot` mutex with usage statistics
//! - **utils**: Attribute values, configuration and log levels
//! - **macros**: `log_event!`

pub mod error;
pub mod key;
pub mod macros;
pub mod name;
pub mod sync;
pub mod utils;

pub use error::{
    ConfigError, EntityKind, Error, ErrorClass, ErrorKind, Operation, RepositoryError, Result,
};
pub use key::{Key, SkillKey, SlotKey};
pub use name::{is_valid_name, is_valid_snap_name, validate_name, validate_snap_name};
pub use sync::{LockStats, TrackedMutex};
pub use utils::{AttrValue, Attrs, LogLevel, RepositoryConfig};
