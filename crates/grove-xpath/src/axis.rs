//! Traversal axes and the cursor that walks one axis from one origin node.
//!
//! Forward axes yield document order. Reverse axes (ancestor, preceding,
//! preceding-sibling) yield reverse document order — nearest node first — so
//! positional predicates count from the context node; path evaluation merges
//! the survivors back into document order afterwards.

use crate::model::NodeKind;
use crate::tree::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Attribute,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    Descendant,
    DescendantOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::PrecedingSibling
                | Axis::Preceding
        )
    }

    /// The node kind a name test on this axis selects.
    pub fn principal_kind(self) -> NodeKind {
        match self {
            Axis::Attribute => NodeKind::Attribute,
            _ => NodeKind::Element,
        }
    }
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Axis::Child => "child",
            Axis::Attribute => "attribute",
            Axis::SelfAxis => "self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::FollowingSibling => "following-sibling",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Following => "following",
            Axis::Preceding => "preceding",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
enum CursorState {
    /// A precomputed candidate list, already in axis order.
    Fixed { items: Vec<NodeId>, pos: usize },
    /// Lazy parent-chain walk.
    Up { cur: Option<NodeId> },
    /// Lazy depth-first pre-order walk over pending subtree roots.
    Dfs { stack: Vec<NodeId> },
}

/// One active axis traversal. Cursors live on the execution context's
/// axis-cursor stack, one per nested axis evaluation.
#[derive(Debug)]
pub struct AxisCursor {
    axis: Axis,
    state: CursorState,
}

impl AxisCursor {
    pub fn new(doc: &Document, axis: Axis, origin: NodeId) -> Self {
        let state = match axis {
            Axis::Child => CursorState::Fixed {
                items: doc.children(origin).to_vec(),
                pos: 0,
            },
            Axis::Attribute => CursorState::Fixed {
                items: doc.attributes(origin).to_vec(),
                pos: 0,
            },
            Axis::SelfAxis => CursorState::Fixed {
                items: vec![origin],
                pos: 0,
            },
            Axis::Parent => CursorState::Fixed {
                items: doc.parent(origin).into_iter().collect(),
                pos: 0,
            },
            Axis::Ancestor => CursorState::Up {
                cur: doc.parent(origin),
            },
            Axis::AncestorOrSelf => CursorState::Up { cur: Some(origin) },
            Axis::Descendant => CursorState::Dfs {
                stack: doc.children(origin).iter().rev().copied().collect(),
            },
            Axis::DescendantOrSelf => CursorState::Dfs {
                stack: vec![origin],
            },
            Axis::FollowingSibling => CursorState::Fixed {
                items: following_siblings(doc, origin),
                pos: 0,
            },
            Axis::PrecedingSibling => CursorState::Fixed {
                items: preceding_siblings(doc, origin),
                pos: 0,
            },
            Axis::Following => CursorState::Dfs {
                stack: following_subtree_roots(doc, origin),
            },
            Axis::Preceding => CursorState::Fixed {
                items: preceding_nodes(doc, origin),
                pos: 0,
            },
        };
        Self { axis, state }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn next(&mut self, doc: &Document) -> Option<NodeId> {
        match &mut self.state {
            CursorState::Fixed { items, pos } => {
                let item = items.get(*pos).copied()?;
                *pos += 1;
                Some(item)
            }
            CursorState::Up { cur } => {
                let node = (*cur)?;
                *cur = doc.parent(node);
                Some(node)
            }
            CursorState::Dfs { stack } => {
                let node = stack.pop()?;
                stack.extend(doc.children(node).iter().rev().copied());
                Some(node)
            }
        }
    }
}

fn sibling_split(doc: &Document, origin: NodeId) -> Option<(Vec<NodeId>, usize)> {
    let parent = doc.parent(origin)?;
    // Attributes are not siblings of child nodes; the sibling axes of an
    // attribute node are empty.
    let siblings = doc.children(parent);
    let at = siblings.iter().position(|&n| n == origin)?;
    Some((siblings.to_vec(), at))
}

fn following_siblings(doc: &Document, origin: NodeId) -> Vec<NodeId> {
    match sibling_split(doc, origin) {
        Some((siblings, at)) => siblings[at + 1..].to_vec(),
        None => Vec::new(),
    }
}

/// Nearest sibling first (reverse document order).
fn preceding_siblings(doc: &Document, origin: NodeId) -> Vec<NodeId> {
    match sibling_split(doc, origin) {
        Some((siblings, at)) => siblings[..at].iter().rev().copied().collect(),
        None => Vec::new(),
    }
}

/// Subtree roots of the following axis, arranged so that a LIFO depth-first
/// walk yields document order: the origin's following siblings come first,
/// then each ancestor's in turn.
fn following_subtree_roots(doc: &Document, origin: NodeId) -> Vec<NodeId> {
    let mut groups: Vec<Vec<NodeId>> = Vec::new();
    let mut cur = origin;
    loop {
        let fs = following_siblings(doc, cur);
        if !fs.is_empty() {
            groups.push(fs);
        }
        match doc.parent(cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    let mut stack = Vec::new();
    for group in groups.iter().rev() {
        stack.extend(group.iter().rev().copied());
    }
    stack
}

/// All preceding nodes in reverse document order, ancestors excluded.
fn preceding_nodes(doc: &Document, origin: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut cur = origin;
    loop {
        for sib in preceding_siblings(doc, cur) {
            // Each preceding sibling's subtree, deepest-last node first.
            let mut pre = Vec::new();
            let mut stack = vec![sib];
            while let Some(n) = stack.pop() {
                pre.push(n);
                stack.extend(doc.children(n).iter().rev().copied());
            }
            out.extend(pre.into_iter().rev());
        }
        match doc.parent(cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    out
}
