//! The grant relation between skills and slots.
//!
//! Grants are indexed both ways: from a slot to the skills it uses and from
//! a skill to the slots using it. Only `insert` and `remove` mutate the
//! index and each touches both directions, so the two views always mirror
//! each other. Empty sets are pruned so that an edge followed by its removal
//! leaves the index exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use skilld_core::key::{SkillKey, SlotKey};

/// Many-to-many relation between skills and slots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GrantIndex {
    skills_by_slot: BTreeMap<SlotKey, BTreeSet<SkillKey>>,
    slots_by_skill: BTreeMap<SkillKey, BTreeSet<SlotKey>>,
    len: usize,
}

impl GrantIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `skill` is granted to `slot`.
    ///
    /// Returns false, leaving the index untouched, if the edge already exists.
    pub fn insert(&mut self, skill: SkillKey, slot: SlotKey) -> bool {
        if self.is_granted(&skill, &slot) {
            return false;
        }
        self.skills_by_slot
            .entry(slot.clone())
            .or_default()
            .insert(skill.clone());
        self.slots_by_skill.entry(skill).or_default().insert(slot);
        self.len += 1;
        true
    }

    /// Drop the edge between `skill` and `slot`.
    ///
    /// Returns false, leaving the index untouched, if there is no such edge.
    pub fn remove(&mut self, skill: &SkillKey, slot: &SlotKey) -> bool {
        if !self.is_granted(skill, slot) {
            return false;
        }
        remove_edge(&mut self.skills_by_slot, slot, skill);
        remove_edge(&mut self.slots_by_skill, skill, slot);
        self.len -= 1;
        true
    }

    /// Is `skill` granted to `slot`?
    pub fn is_granted(&self, skill: &SkillKey, slot: &SlotKey) -> bool {
        self.skills_by_slot
            .get(slot)
            .is_some_and(|skills| skills.contains(skill))
    }

    /// Skills granted to `slot`, in key order.
    pub fn skills_for_slot<'a>(&'a self, slot: &SlotKey) -> impl Iterator<Item = &'a SkillKey> {
        self.skills_by_slot.get(slot).into_iter().flatten()
    }

    /// Slots using `skill`, in key order.
    pub fn slots_for_skill<'a>(&'a self, skill: &SkillKey) -> impl Iterator<Item = &'a SlotKey> {
        self.slots_by_skill.get(skill).into_iter().flatten()
    }

    /// Is any slot using `skill`?
    pub fn skill_in_use(&self, skill: &SkillKey) -> bool {
        self.slots_by_skill.contains_key(skill)
    }

    /// Is `slot` using any skill?
    pub fn slot_in_use(&self, slot: &SlotKey) -> bool {
        self.skills_by_slot.contains_key(slot)
    }

    /// All edges, ordered by skill then slot.
    pub fn iter(&self) -> impl Iterator<Item = (&SkillKey, &SlotKey)> {
        self.slots_by_skill
            .iter()
            .flat_map(|(skill, slots)| slots.iter().map(move |slot| (skill, slot)))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check that both directions describe the same set of edges.
    pub fn is_consistent(&self) -> bool {
        let forward: usize = self.skills_by_slot.values().map(BTreeSet::len).sum();
        let backward: usize = self.slots_by_skill.values().map(BTreeSet::len).sum();
        forward == self.len
            && backward == self.len
            && self.skills_by_slot.values().all(|s| !s.is_empty())
            && self.slots_by_skill.values().all(|s| !s.is_empty())
            && self.iter().all(|(skill, slot)| self.is_granted(skill, slot))
    }
}

fn remove_edge<K: Ord, V: Ord>(map: &mut BTreeMap<K, BTreeSet<V>>, from: &K, to: &V) {
    if let Some(set) = map.get_mut(from) {
        set.remove(to);
        if set.is_empty() {
            map.remove(from);
        }
    }
}
