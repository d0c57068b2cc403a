//! Document-order bookkeeping: the per-document level table and the
//! rank-based comparisons built on it.
//!
//! One [`OrderIndex`] is owned by each [`Document`]; it is touched only by
//! the single-writer construction phase. Levels make ancestor tests cost the
//! level difference instead of a full parent-chain scan, and ranks make order
//! comparison a single integer compare — both matter because node-set merges
//! compare order on every insertion.

use core::cmp::Ordering;

use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};

const UNINDEXED: u32 = u32::MAX;

/// Per-node depth table, keyed by arena index.
#[derive(Debug, Default)]
pub(crate) struct OrderIndex {
    levels: Vec<u32>,
}

impl OrderIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the slot for a freshly allocated (not yet appended) node.
    pub(crate) fn push_unindexed(&mut self) {
        self.levels.push(UNINDEXED);
    }

    pub(crate) fn set_level(&mut self, index: usize, level: u32) {
        debug_assert_eq!(self.levels[index], UNINDEXED, "level assigned twice");
        self.levels[index] = level;
    }

    pub(crate) fn level(&self, index: usize) -> Option<u32> {
        match self.levels.get(index) {
            Some(&UNINDEXED) | None => None,
            Some(&level) => Some(level),
        }
    }
}

impl Document {
    /// Depth of a node (document node = 0), or `None` until it is appended.
    pub fn level_of(&self, node: NodeId) -> Option<u32> {
        self.check_owned(node).ok()?;
        self.index.level(node.index())
    }

    /// The node itself if indexed, otherwise the nearest ancestor that is.
    /// `None` only for a detached node with no indexed ancestor.
    pub fn nearest_indexed_ancestor(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.level_of(n).is_some() {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Strict ancestor test. Climbs exactly `level(b) - level(a)` parent
    /// links from the deeper node instead of scanning to the root.
    pub fn is_ancestor(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(la), Some(lb)) = (self.level_of(a), self.level_of(b)) else {
            return false;
        };
        if la >= lb {
            return false;
        }
        let mut cur = b;
        for _ in 0..(lb - la) {
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
        cur == a
    }

    /// Compare two nodes of this document by document-order rank.
    ///
    /// Structural error when either node belongs to another document or has
    /// not been ranked yet (order across documents is undefined here).
    pub fn compare_order(&self, a: NodeId, b: NodeId) -> Result<Ordering> {
        self.check_owned(a)?;
        self.check_owned(b)?;
        let ra = self
            .rank(a)
            .ok_or_else(|| Error::structural("node has no document-order rank yet"))?;
        let rb = self
            .rank(b)
            .ok_or_else(|| Error::structural("node has no document-order rank yet"))?;
        Ok(ra.cmp(&rb))
    }
}
