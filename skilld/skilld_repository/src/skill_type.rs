//! Skill types.
//!
//! The repository knows nothing about what a given type means. Each type
//! supplies its name and a check that a skill declared with that type is
//! well formed.

use std::fmt;

use crate::model::Skill;

/// A named category of skills.
///
/// `sanitize` runs while the repository lock is held. Implementations must
/// not call back into the repository from it; doing so deadlocks.
pub trait SkillType: Send + Sync + fmt::Debug {
    /// Unique name of the type.
    fn name(&self) -> &str;

    /// Check a skill of this type, returning the reason it is rejected.
    fn sanitize(&self, skill: &Skill) -> Result<(), String>;
}

type SanitizeFn = dyn Fn(&Skill) -> Result<(), String> + Send + Sync;

/// A skill type with pluggable sanitization.
///
/// Without a callback every skill is accepted.
pub struct TestType {
    name: String,
    sanitize_callback: Option<Box<SanitizeFn>>,
}

impl TestType {
    /// Create a type that accepts every skill.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sanitize_callback: None,
        }
    }

    /// Use `callback` to decide whether skills are acceptable.
    pub fn with_sanitizer<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Skill) -> Result<(), String> + Send + Sync + 'static,
    {
        self.sanitize_callback = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestType")
            .field("name", &self.name)
            .field("has_sanitizer", &self.sanitize_callback.is_some())
            .finish()
    }
}

impl SkillType for TestType {
    fn name(&self) -> &str {
        &self.name
    }

    fn sanitize(&self, skill: &Skill) -> Result<(), String> {
        if skill.skill_type != self.name {
            return Err(format!(
                "skill is not of type {:?}, got {:?}",
                self.name, skill.skill_type
            ));
        }
        match &self.sanitize_callback {
            Some(callback) => callback(skill),
            None => Ok(()),
        }
    }
}
