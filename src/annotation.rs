//! Per-node annotation store.
//!
//! The C source stores a pointer to its annotation in the DOM node's
//! private slot. `dom_query` exposes no such extension slot, so instead we
//! keep one external map keyed by node identity, exactly the pattern this
//! codebase already uses for marking processed nodes during extraction.

use std::collections::HashMap;

use dom_query::NodeId;

/// Flags tracked per node during the article grabber's scoring pass.
///
/// A plain bitset over a `u8`: the flag set named in the data model
/// (`TO_SCORE`, `INITIALIZED`, `CANDIDATE`, `TOP_CANDIDATE`, `DATA_TABLE`)
/// fits comfortably without pulling in a bitflags dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    pub const TO_SCORE: Flags = Flags(0b0000_0001);
    pub const INITIALIZED: Flags = Flags(0b0000_0010);
    pub const CANDIDATE: Flags = Flags(0b0000_0100);
    pub const TOP_CANDIDATE: Flags = Flags(0b0000_1000);
    pub const DATA_TABLE: Flags = Flags(0b0001_0000);

    #[must_use]
    pub fn empty() -> Self {
        Flags(0)
    }

    #[must_use]
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }
}

/// One node's auxiliary scoring record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Annotation {
    pub score: f64,
    pub flags: Flags,
}

/// Owns the annotation records for one working document.
///
/// Annotations are process-local and never serialized; dropping this store
/// (at the end of one extraction attempt) releases every record it holds.
#[derive(Debug, Default)]
pub struct Annotations {
    records: HashMap<NodeId, Annotation>,
}

impl Annotations {
    #[must_use]
    pub fn new() -> Self {
        Self { records: HashMap::new() }
    }

    /// Whether `node_id` has ever been written to (i.e. has been initialized).
    #[must_use]
    pub fn is_initialized(&self, node_id: NodeId) -> bool {
        self.records
            .get(&node_id)
            .is_some_and(|a| a.flags.contains(Flags::INITIALIZED))
    }

    #[must_use]
    pub fn has_flag(&self, node_id: NodeId, flag: Flags) -> bool {
        self.records.get(&node_id).is_some_and(|a| a.flags.contains(flag))
    }

    pub fn set_flag(&mut self, node_id: NodeId, flag: Flags) {
        self.records.entry(node_id).or_default().flags.insert(flag);
    }

    pub fn clear_flag(&mut self, node_id: NodeId, flag: Flags) {
        if let Some(a) = self.records.get_mut(&node_id) {
            a.flags.remove(flag);
        }
    }

    #[must_use]
    pub fn score(&self, node_id: NodeId) -> f64 {
        self.records.get(&node_id).map_or(0.0, |a| a.score)
    }

    pub fn set_score(&mut self, node_id: NodeId, score: f64) {
        self.records.entry(node_id).or_default().score = score;
    }

    pub fn add_score(&mut self, node_id: NodeId, delta: f64) {
        self.records.entry(node_id).or_default().score += delta;
    }

    /// Remove the record for a node that has been unlinked from the tree.
    pub fn forget(&mut self, node_id: NodeId) {
        self.records.remove(&node_id);
    }

    #[must_use]
    pub fn get(&self, node_id: NodeId) -> Option<Annotation> {
        self.records.get(&node_id).copied()
    }
}
