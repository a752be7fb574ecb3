//! The skill repository.
//!
//! `Repository` is the authoritative record of skill types, skills, slots
//! and the grants connecting them. All state sits behind a single
//! [`TrackedMutex`]; every operation takes it for its whole duration, so
//! operations are linearizable and a failing operation never leaves partial
//! state behind. Successful mutations are logged after the lock is released.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use skilld_core::error::{ConfigError, EntityKind, ErrorKind, Operation, RepositoryError};
use skilld_core::key::{SkillKey, SlotKey};
use skilld_core::log_event;
use skilld_core::name::{validate_name, validate_snap_name};
use skilld_core::sync::{LockStats, TrackedMutex};
use skilld_core::utils::RepositoryConfig;

use crate::grants::GrantIndex;
use crate::model::{Skill, Slot};
use crate::skill_type::SkillType;

/// Slots of one snap paired with the skills granted to each.
pub type SlotGrants = Vec<(Arc<Slot>, Vec<Arc<Skill>>)>;

/// Skills of one snap paired with the slots using each.
pub type SkillGrants = Vec<(Arc<Skill>, Vec<Arc<Slot>>)>;

type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Default)]
struct State {
    types: BTreeMap<String, Arc<dyn SkillType>>,
    // Indexed by snap name, then skill or slot name.
    skills: BTreeMap<String, BTreeMap<String, Arc<Skill>>>,
    slots: BTreeMap<String, BTreeMap<String, Arc<Slot>>>,
    grants: GrantIndex,
}

impl State {
    fn skill(&self, snap: &str, name: &str) -> Option<&Arc<Skill>> {
        self.skills.get(snap)?.get(name)
    }

    fn slot(&self, snap: &str, name: &str) -> Option<&Arc<Slot>> {
        self.slots.get(snap)?.get(name)
    }

    fn skill_by_key(&self, key: &SkillKey) -> Option<&Arc<Skill>> {
        self.skill(&key.snap, &key.name)
    }

    fn slot_by_key(&self, key: &SlotKey) -> Option<&Arc<Slot>> {
        self.slot(&key.snap, &key.name)
    }

    /// Resolve both ends of a grant or revoke request.
    fn endpoints(
        &self,
        op: Operation,
        skill_snap: &str,
        skill_name: &str,
        slot_snap: &str,
        slot_name: &str,
    ) -> Result<(Arc<Skill>, Arc<Slot>)> {
        let skill = self.skill(skill_snap, skill_name).ok_or_else(|| {
            RepositoryError::new(op, not_found(EntityKind::Skill, skill_snap, skill_name))
        })?;
        let slot = self.slot(slot_snap, slot_name).ok_or_else(|| {
            RepositoryError::new(op, not_found(EntityKind::Slot, slot_snap, slot_name))
        })?;
        Ok((Arc::clone(skill), Arc::clone(slot)))
    }
}

fn not_found(entity: EntityKind, snap: &str, name: &str) -> ErrorKind {
    ErrorKind::NotFound {
        entity,
        snap: snap.to_string(),
        name: name.to_string(),
    }
}

fn invalid_name(entity: EntityKind, name: &str, reason: String) -> ErrorKind {
    ErrorKind::InvalidName {
        entity,
        name: name.to_string(),
        reason,
    }
}

/// In-memory repository of skills, slots and grants.
///
/// Shared between threads behind an `Arc`; no external locking is needed.
pub struct Repository {
    state: TrackedMutex<State>,
    config: RepositoryConfig,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// Create an empty repository with default settings.
    pub fn new() -> Self {
        Self::build(RepositoryConfig::default())
    }

    /// Create an empty repository, rejecting an unusable configuration.
    pub fn with_config(config: RepositoryConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an empty repository configured from a TOML file.
    pub fn from_config_file(path: impl AsRef<Path>) -> skilld_core::Result<Self> {
        let config = RepositoryConfig::from_file(path)?;
        Ok(Self::with_config(config)?)
    }

    fn build(config: RepositoryConfig) -> Self {
        let state = TrackedMutex::new(State::default(), config.lock_name.clone())
            .with_slow_threshold(config.slow_lock_threshold());
        Self { state, config }
    }

    /// Settings this repository was created with.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Usage statistics of the repository lock.
    pub fn lock_stats(&self) -> LockStats {
        self.state.stats()
    }

    /// Register a skill type.
    ///
    /// Types can never be removed once added.
    pub fn add_type(&self, skill_type: Arc<dyn SkillType>) -> Result<()> {
        let op = Operation::AddType;
        let type_name = skill_type.name().to_string();
        validate_name(&type_name).map_err(|reason| {
            RepositoryError::new(op, invalid_name(EntityKind::Type, &type_name, reason))
        })?;

        let mut state = self.state.lock();
        if state.types.contains_key(&type_name) {
            return Err(RepositoryError::new(
                op,
                ErrorKind::NameConflict {
                    entity: EntityKind::Type,
                    snap: None,
                    name: type_name,
                },
            ));
        }
        state.types.insert(type_name.clone(), skill_type);

        drop(state);
        log_event!(self.config.mutation_log_level, "skill type added", type_name => type_name);
        Ok(())
    }

    /// Look up a skill type by name.
    pub fn skill_type(&self, name: &str) -> Option<Arc<dyn SkillType>> {
        self.state.lock().types.get(name).cloned()
    }

    /// Names of all registered types, sorted.
    pub fn types(&self) -> Vec<String> {
        self.state.lock().types.keys().cloned().collect()
    }

    /// All skills of the given type, or of every type if `type_filter` is empty.
    ///
    /// Sorted by snap name, then skill name.
    pub fn all_skills(&self, type_filter: &str) -> Vec<Arc<Skill>> {
        let state = self.state.lock();
        state
            .skills
            .values()
            .flat_map(|by_name| by_name.values())
            .filter(|skill| type_filter.is_empty() || skill.skill_type == type_filter)
            .cloned()
            .collect()
    }

    /// Skills offered by the named snap, sorted by name.
    pub fn skills(&self, snap: &str) -> Vec<Arc<Skill>> {
        let state = self.state.lock();
        state
            .skills
            .get(snap)
            .map(|by_name| by_name.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The named skill of the named snap.
    pub fn skill(&self, snap: &str, name: &str) -> Option<Arc<Skill>> {
        self.state.lock().skill(snap, name).cloned()
    }

    /// Add a skill.
    ///
    /// The snap and skill names must be valid, the type must be known and
    /// accept the skill, and no other skill of the snap may share the name.
    pub fn add_skill(&self, skill: Skill) -> Result<()> {
        let op = Operation::AddSkill;
        let mut state = self.state.lock();

        validate_snap_name(&skill.snap).map_err(|reason| {
            RepositoryError::new(
                op,
                ErrorKind::InvalidSnapName {
                    snap: skill.snap.clone(),
                    reason,
                },
            )
        })?;
        validate_name(&skill.name).map_err(|reason| {
            RepositoryError::new(op, invalid_name(EntityKind::Skill, &skill.name, reason))
        })?;
        let skill_type = state.types.get(&skill.skill_type).ok_or_else(|| {
            RepositoryError::new(
                op,
                ErrorKind::UnknownType {
                    type_name: skill.skill_type.clone(),
                },
            )
        })?;
        skill_type.sanitize(&skill).map_err(|reason| {
            RepositoryError::new(
                op,
                ErrorKind::TypeRejected {
                    key: skill.key(),
                    type_name: skill.skill_type.clone(),
                    reason,
                },
            )
        })?;
        if state.skill(&skill.snap, &skill.name).is_some() {
            return Err(RepositoryError::new(
                op,
                ErrorKind::NameConflict {
                    entity: EntityKind::Skill,
                    snap: Some(skill.snap.clone()),
                    name: skill.name.clone(),
                },
            ));
        }

        let key = skill.key();
        state
            .skills
            .entry(skill.snap.clone())
            .or_default()
            .insert(skill.name.clone(), Arc::new(skill));

        drop(state);
        log_event!(self.config.mutation_log_level, "skill added", skill => key);
        Ok(())
    }

    /// Remove the named skill of the named snap.
    ///
    /// Fails if the skill does not exist or is still used by a slot.
    pub fn remove_skill(&self, snap: &str, name: &str) -> Result<()> {
        let op = Operation::RemoveSkill;
        let mut state = self.state.lock();

        let key = state
            .skill(snap, name)
            .map(|skill| skill.key())
            .ok_or_else(|| RepositoryError::new(op, not_found(EntityKind::Skill, snap, name)))?;
        if state.grants.skill_in_use(&key) {
            return Err(RepositoryError::new(
                op,
                ErrorKind::InUse {
                    entity: EntityKind::Skill,
                    snap: snap.to_string(),
                    name: name.to_string(),
                },
            ));
        }
        if let Some(by_name) = state.skills.get_mut(snap) {
            by_name.remove(name);
            if by_name.is_empty() {
                state.skills.remove(snap);
            }
        }

        drop(state);
        log_event!(self.config.mutation_log_level, "skill removed", skill => key);
        Ok(())
    }

    /// All slots of the given type, or of every type if `type_filter` is empty.
    ///
    /// Sorted by snap name, then slot name.
    pub fn all_slots(&self, type_filter: &str) -> Vec<Arc<Slot>> {
        let state = self.state.lock();
        state
            .slots
            .values()
            .flat_map(|by_name| by_name.values())
            .filter(|slot| type_filter.is_empty() || slot.skill_type == type_filter)
            .cloned()
            .collect()
    }

    /// Slots of the named snap, sorted by name.
    pub fn slots(&self, snap: &str) -> Vec<Arc<Slot>> {
        let state = self.state.lock();
        state
            .slots
            .get(snap)
            .map(|by_name| by_name.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The named slot of the named snap.
    pub fn slot(&self, snap: &str, name: &str) -> Option<Arc<Slot>> {
        self.state.lock().slot(snap, name).cloned()
    }

    /// Add a slot.
    ///
    /// The snap and slot names must be valid, the type must be known, and no
    /// other slot of the snap may share the name. Skill types only sanitize
    /// skills, so slots are not passed to them.
    pub fn add_slot(&self, slot: Slot) -> Result<()> {
        let op = Operation::AddSlot;
        let mut state = self.state.lock();

        validate_snap_name(&slot.snap).map_err(|reason| {
            RepositoryError::new(
                op,
                ErrorKind::InvalidSnapName {
                    snap: slot.snap.clone(),
                    reason,
                },
            )
        })?;
        validate_name(&slot.name).map_err(|reason| {
            RepositoryError::new(op, invalid_name(EntityKind::Slot, &slot.name, reason))
        })?;
        if !state.types.contains_key(&slot.skill_type) {
            return Err(RepositoryError::new(
                op,
                ErrorKind::UnknownType {
                    type_name: slot.skill_type.clone(),
                },
            ));
        }
        if state.slot(&slot.snap, &slot.name).is_some() {
            return Err(RepositoryError::new(
                op,
                ErrorKind::NameConflict {
                    entity: EntityKind::Slot,
                    snap: Some(slot.snap.clone()),
                    name: slot.name.clone(),
                },
            ));
        }

        let key = slot.key();
        state
            .slots
            .entry(slot.snap.clone())
            .or_default()
            .insert(slot.name.clone(), Arc::new(slot));

        drop(state);
        log_event!(self.config.mutation_log_level, "slot added", slot => key);
        Ok(())
    }

    /// Remove the named slot of the named snap.
    ///
    /// Fails if the slot does not exist or still uses a skill.
    pub fn remove_slot(&self, snap: &str, name: &str) -> Result<()> {
        let op = Operation::RemoveSlot;
        let mut state = self.state.lock();

        let key = state
            .slot(snap, name)
            .map(|slot| slot.key())
            .ok_or_else(|| RepositoryError::new(op, not_found(EntityKind::Slot, snap, name)))?;
        if state.grants.slot_in_use(&key) {
            return Err(RepositoryError::new(
                op,
                ErrorKind::InUse {
                    entity: EntityKind::Slot,
                    snap: snap.to_string(),
                    name: name.to_string(),
                },
            ));
        }
        if let Some(by_name) = state.slots.get_mut(snap) {
            by_name.remove(name);
            if by_name.is_empty() {
                state.slots.remove(snap);
            }
        }

        drop(state);
        log_event!(self.config.mutation_log_level, "slot removed", slot => key);
        Ok(())
    }

    /// Grant the named skill to the named slot.
    ///
    /// Both must exist, share a type, and not be connected yet.
    pub fn grant(
        &self,
        skill_snap: &str,
        skill_name: &str,
        slot_snap: &str,
        slot_name: &str,
    ) -> Result<()> {
        let op = Operation::Grant;
        let mut state = self.state.lock();

        let (skill, slot) = state.endpoints(op, skill_snap, skill_name, slot_snap, slot_name)?;
        if skill.skill_type != slot.skill_type {
            return Err(RepositoryError::new(
                op,
                ErrorKind::TypeMismatch {
                    skill_type: skill.skill_type.clone(),
                    slot_type: slot.skill_type.clone(),
                },
            ));
        }
        let (skill_key, slot_key) = (skill.key(), slot.key());
        if !state.grants.insert(skill_key.clone(), slot_key.clone()) {
            return Err(RepositoryError::new(
                op,
                ErrorKind::AlreadyGranted {
                    skill: skill_key,
                    slot: slot_key,
                },
            ));
        }

        drop(state);
        log_event!(self.config.mutation_log_level, "skill granted",
            skill => skill_key,
            slot => slot_key,
        );
        Ok(())
    }

    /// Revoke the named skill from the named slot.
    pub fn revoke(
        &self,
        skill_snap: &str,
        skill_name: &str,
        slot_snap: &str,
        slot_name: &str,
    ) -> Result<()> {
        let op = Operation::Revoke;
        let mut state = self.state.lock();

        let (skill, slot) = state.endpoints(op, skill_snap, skill_name, slot_snap, slot_name)?;
        let (skill_key, slot_key) = (skill.key(), slot.key());
        if !state.grants.remove(&skill_key, &slot_key) {
            return Err(RepositoryError::new(
                op,
                ErrorKind::NotGranted {
                    skill: skill_key,
                    slot: slot_key,
                },
            ));
        }

        drop(state);
        log_event!(self.config.mutation_log_level, "skill revoked",
            skill => skill_key,
            slot => slot_key,
        );
        Ok(())
    }

    /// Skills granted to the slots of the named snap.
    ///
    /// Only slots with at least one grant appear. Slots and the skills of
    /// each are sorted by snap name, then name.
    pub fn granted_to(&self, snap: &str) -> SlotGrants {
        let state = self.state.lock();
        let Some(slots) = state.slots.get(snap) else {
            return Vec::new();
        };
        slots
            .values()
            .filter_map(|slot| {
                let skills: Vec<Arc<Skill>> = state
                    .grants
                    .skills_for_slot(&slot.key())
                    .filter_map(|key| state.skill_by_key(key).cloned())
                    .collect();
                (!skills.is_empty()).then(|| (Arc::clone(slot), skills))
            })
            .collect()
    }

    /// Slots using the skills of the named snap.
    ///
    /// Only skills with at least one grant appear. Skills and the slots of
    /// each are sorted by snap name, then name.
    pub fn granted_by(&self, snap: &str) -> SkillGrants {
        let state = self.state.lock();
        let Some(skills) = state.skills.get(snap) else {
            return Vec::new();
        };
        skills
            .values()
            .filter_map(|skill| {
                let slots: Vec<Arc<Slot>> = state
                    .grants
                    .slots_for_skill(&skill.key())
                    .filter_map(|key| state.slot_by_key(key).cloned())
                    .collect();
                (!slots.is_empty()).then(|| (Arc::clone(skill), slots))
            })
            .collect()
    }

    /// Is the named skill granted to the named slot?
    pub fn is_granted(
        &self,
        skill_snap: &str,
        skill_name: &str,
        slot_snap: &str,
        slot_name: &str,
    ) -> bool {
        self.state.lock().grants.is_granted(
            &SkillKey::new(skill_snap, skill_name),
            &SlotKey::new(slot_snap, slot_name),
        )
    }

    /// Total number of grants.
    pub fn grant_count(&self) -> usize {
        self.state.lock().grants.len()
    }

    /// Verify that the grant index is mirrored and references only
    /// existing skills and slots.
    pub fn check_integrity(&self) -> bool {
        let state = self.state.lock();
        state.grants.is_consistent()
            && state.grants.iter().all(|(skill, slot)| {
                state.skill_by_key(skill).is_some() && state.slot_by_key(slot).is_some()
            })
    }
}
