//! Node-sets: ordered, duplicate-free node collections kept in document
//! order by rank at every insertion, so no full re-sort ever happens.

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};

/// Below this size an ordered linear scan beats the binary search.
const LINEAR_SCAN_MAX: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    items: SmallVec<[NodeId; 8]>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A singleton set. The node must already be ranked.
    pub fn singleton(node: NodeId, doc: &Document) -> Result<Self> {
        let mut set = Self::new();
        set.add_node_in_order(node, doc)?;
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }

    /// First node in document order.
    pub fn first(&self) -> Option<NodeId> {
        self.items.first().copied()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.items.contains(&node)
    }

    /// Position (0-based) of a node in the set, by identity.
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.items.iter().position(|&n| n == node)
    }

    /// Insert `node` preserving the sorted-by-rank, duplicate-free invariant.
    /// Returns `false` when the node was already present (identity dedup).
    ///
    /// Only fully-ranked nodes may be inserted; ranks assigned after this set
    /// was created compare like any other. Already-placed entries are never
    /// reordered.
    pub fn add_node_in_order(&mut self, node: NodeId, doc: &Document) -> Result<bool> {
        doc.check_owned(node)?;
        let rank = doc
            .rank(node)
            .ok_or_else(|| Error::structural("cannot add an unranked node to a node-set"))?;
        let pos = if self.items.len() <= LINEAR_SCAN_MAX {
            let mut pos = self.items.len();
            for (i, &existing) in self.items.iter().enumerate() {
                // Ranks are unique per document, so equal rank means identity.
                let erank = doc.rank(existing).expect("placed nodes are ranked");
                if erank == rank {
                    return Ok(false);
                }
                if erank > rank {
                    pos = i;
                    break;
                }
            }
            pos
        } else {
            match self
                .items
                .binary_search_by_key(&rank, |&n| doc.rank(n).expect("placed nodes are ranked"))
            {
                Ok(_) => return Ok(false),
                Err(pos) => pos,
            }
        };
        self.items.insert(pos, node);
        Ok(true)
    }

    /// Merge two ordered sets in O(|a|+|b|) by a rank walk, preserving order
    /// and dropping duplicates.
    pub fn union(&self, other: &Self, doc: &Document) -> Result<Self> {
        let mut out: SmallVec<[NodeId; 8]> = SmallVec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            let a = self.items[i];
            let b = other.items[j];
            match doc.compare_order(a, b)? {
                core::cmp::Ordering::Less => {
                    out.push(a);
                    i += 1;
                }
                core::cmp::Ordering::Greater => {
                    out.push(b);
                    j += 1;
                }
                core::cmp::Ordering::Equal => {
                    out.push(a);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.items[i..]);
        out.extend_from_slice(&other.items[j..]);
        Ok(Self { items: out })
    }

    /// Nodes present in both sets, by the same merge walk.
    pub fn intersect(&self, other: &Self, doc: &Document) -> Result<Self> {
        let mut out: SmallVec<[NodeId; 8]> = SmallVec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            match doc.compare_order(self.items[i], other.items[j])? {
                core::cmp::Ordering::Less => i += 1,
                core::cmp::Ordering::Greater => j += 1,
                core::cmp::Ordering::Equal => {
                    out.push(self.items[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(Self { items: out })
    }

    /// Nodes of `self` not present in `other`.
    pub fn except(&self, other: &Self, doc: &Document) -> Result<Self> {
        let mut out: SmallVec<[NodeId; 8]> = SmallVec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            match doc.compare_order(self.items[i], other.items[j])? {
                core::cmp::Ordering::Less => {
                    out.push(self.items[i]);
                    i += 1;
                }
                core::cmp::Ordering::Greater => j += 1,
                core::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.items[i..]);
        Ok(Self { items: out })
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = NodeId;
    type IntoIter = core::iter::Copied<core::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().copied()
    }
}
