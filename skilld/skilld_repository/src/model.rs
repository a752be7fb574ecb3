//! Skills and slots.
//!
//! A skill is a capability a snap offers; a slot is the place in another
//! (or the same) snap where such a capability can be plugged in. Both are
//! immutable once added to a repository.

use serde::{Deserialize, Serialize};
use skilld_core::key::{SkillKey, SlotKey};
use skilld_core::utils::{AttrValue, Attrs};

/// A capability offered by a snap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Name of the skill, unique within the snap.
    pub name: String,

    /// Name of the snap offering the skill.
    pub snap: String,

    /// Name of the skill type.
    #[serde(rename = "type")]
    pub skill_type: String,

    /// Short human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    /// Type specific attributes.
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,

    /// Applications of the snap bound to this skill.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<String>,
}

impl Skill {
    /// Create a skill with no label, attributes or apps.
    pub fn new(
        snap: impl Into<String>,
        name: impl Into<String>,
        skill_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            snap: snap.into(),
            skill_type: skill_type.into(),
            label: String::new(),
            attrs: Attrs::new(),
            apps: Vec::new(),
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Bind an application.
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.apps.push(app.into());
        self
    }

    /// Identity of this skill.
    pub fn key(&self) -> SkillKey {
        SkillKey::new(self.snap.as_str(), self.name.as_str())
    }
}

/// A place where a skill of matching type can be granted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Name of the slot, unique within the snap.
    pub name: String,

    /// Name of the snap holding the slot.
    pub snap: String,

    /// Name of the skill type accepted by the slot.
    #[serde(rename = "type")]
    pub skill_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<String>,
}

impl Slot {
    /// Create a slot with no label, attributes or apps.
    pub fn new(
        snap: impl Into<String>,
        name: impl Into<String>,
        skill_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            snap: snap.into(),
            skill_type: skill_type.into(),
            label: String::new(),
            attrs: Attrs::new(),
            apps: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.apps.push(app.into());
        self
    }

    /// Identity of this slot.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.snap.as_str(), self.name.as_str())
    }
}
