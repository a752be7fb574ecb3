//! Strongly-typed endpoint keys.
//!
//! Skills and slots are identified by the snap that owns them together with
//! a name that is unique within that snap. Both use the same shape, so the
//! key type carries a phantom marker to keep skill keys and slot keys apart.
//!
//! # Examples
//!
//! ```
//! use skilld_core::key::{SkillKey, SlotKey};
//!
//! let skill = SkillKey::new("app1", "iface");
//! let slot = SlotKey::new("app1", "iface");
//!
//! // Same text, different types.
//! assert_eq!(skill.to_string(), slot.to_string());
//! assert_eq!(skill.to_string(), "app1:iface");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A `(snap, name)` pair identifying an endpoint of kind `T`.
///
/// Keys order by snap first and name second, comparing bytes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Key<T> {
    /// Name of the owning snap.
    pub snap: String,
    /// Endpoint name, unique within `snap`.
    pub name: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Key<T> {
    /// Create a key from the owning snap and the endpoint name.
    pub fn new(snap: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            snap: snap.into(),
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// The owning snap.
    pub fn snap(&self) -> &str {
        &self.snap
    }

    /// The endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// Manual impls so that the marker type needs no bounds.

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self::new(self.snap.clone(), self.name.clone())
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.snap == other.snap && self.name == other.name
    }
}

impl<T> Eq for Key<T> {}

impl<T> PartialOrd for Key<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Key<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.snap
            .cmp(&other.snap)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.snap.hash(state);
        self.name.hash(state);
    }
}

impl<T> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.snap, self.name)
    }
}

/// Marker type for skills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SkillMarker;
/// Key of a skill.
pub type SkillKey = Key<SkillMarker>;

/// Marker type for slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotMarker;
/// Key of a slot.
pub type SlotKey = Key<SlotMarker>;
