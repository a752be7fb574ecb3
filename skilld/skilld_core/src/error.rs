//! Error types for the skilld system.
//!
//! Every repository failure is a logical constraint violation reported
//! synchronously to the caller. Nothing here is transient or retryable.
//!
//! The root error type, `Error`, can wrap any of the subsystem-specific
//! errors, allowing for uniform error handling at the top level.

use std::fmt;

use thiserror::Error;

use crate::key::{SkillKey, SlotKey};

/// Root error type for the skilld system.
#[derive(Debug, Error)]
pub enum Error {
    /// Repository operation errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The repository operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddType,
    AddSkill,
    RemoveSkill,
    AddSlot,
    RemoveSlot,
    Grant,
    Revoke,
}

impl Operation {
    /// Human readable verb phrase, used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddType => "add skill type",
            Self::AddSkill => "add skill",
            Self::RemoveSkill => "remove skill",
            Self::AddSlot => "add slot",
            Self::RemoveSlot => "remove slot",
            Self::Grant => "grant skill",
            Self::Revoke => "revoke skill",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of named entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Type,
    Skill,
    Slot,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => f.write_str("skill type"),
            Self::Skill => f.write_str("skill"),
            Self::Slot => f.write_str("slot"),
        }
    }
}

/// Broad class of a repository failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed or semantically invalid input.
    Validation,
    /// The requested state already exists.
    Conflict,
    /// The referenced entity or edge does not exist.
    NotFound,
    /// The removal would leave a dangling grant.
    Integrity,
}

/// What went wrong in a repository operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The owning snap name is not well formed.
    #[error("invalid snap name {snap:?}: {reason}")]
    InvalidSnapName { snap: String, reason: String },

    /// A skill, slot or type name is not well formed.
    #[error("invalid {entity} name {name:?}: {reason}")]
    InvalidName {
        entity: EntityKind,
        name: String,
        reason: String,
    },

    /// The referenced skill type has not been registered.
    #[error("skill type {type_name:?} is not known")]
    UnknownType { type_name: String },

    /// The skill type refused the skill.
    #[error("skill {key} rejected by type {type_name:?}: {reason}")]
    TypeRejected {
        key: SkillKey,
        type_name: String,
        reason: String,
    },

    /// An entity with this name already exists.
    #[error("{entity} name {name:?} is in use")]
    NameConflict {
        entity: EntityKind,
        snap: Option<String>,
        name: String,
    },

    /// No skill or slot with this key exists.
    #[error("no such {entity} {snap:?}:{name:?}")]
    NotFound {
        entity: EntityKind,
        snap: String,
        name: String,
    },

    /// The skill or slot still takes part in at least one grant.
    #[error("{entity} {snap:?}:{name:?} is still connected")]
    InUse {
        entity: EntityKind,
        snap: String,
        name: String,
    },

    /// Skill and slot have different types.
    #[error("skill type {skill_type:?} doesn't match slot type {slot_type:?}")]
    TypeMismatch {
        skill_type: String,
        slot_type: String,
    },

    /// The skill is already granted to the slot.
    #[error("skill {skill} is already used by slot {slot}")]
    AlreadyGranted { skill: SkillKey, slot: SlotKey },

    /// The skill is not granted to the slot.
    #[error("skill {skill} is not used by slot {slot}")]
    NotGranted { skill: SkillKey, slot: SlotKey },
}

impl ErrorKind {
    /// Map this failure onto its class.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidSnapName { .. }
            | Self::InvalidName { .. }
            | Self::UnknownType { .. }
            | Self::TypeRejected { .. }
            | Self::TypeMismatch { .. } => ErrorClass::Validation,
            Self::NameConflict { .. } | Self::AlreadyGranted { .. } => ErrorClass::Conflict,
            Self::NotFound { .. } | Self::NotGranted { .. } => ErrorClass::NotFound,
            Self::InUse { .. } => ErrorClass::Integrity,
        }
    }
}

/// A failed repository operation.
///
/// The repository state is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {op}, {kind}")]
pub struct RepositoryError {
    /// The operation that failed.
    pub op: Operation,
    /// The reason it failed.
    pub kind: ErrorKind,
}

impl RepositoryError {
    /// Create a new repository error.
    pub fn new(op: Operation, kind: ErrorKind) -> Self {
        Self { op, kind }
    }

    /// The reason this operation failed.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Shorthand for `self.kind().class()`.
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }
}

/// Errors related to loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for this schema
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field has an unusable value
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result type used throughout the skilld system.
pub type Result<T> = std::result::Result<T, Error>;
