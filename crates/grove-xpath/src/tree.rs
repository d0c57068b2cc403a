//! The source tree: an arena-backed node graph built forward-only during
//! parsing, with a document-order rank stamped onto every node at append
//! time.
//!
//! Ownership runs one way: the [`Document`] arena owns every node, a parent
//! owns the positions of its children, and back-references (parent, owning
//! document) are plain indices. Ranks are assigned once by a post-incremented
//! document-wide counter and never recomputed, which makes order assignment
//! and order comparison O(1) at the cost of ruling out structural edits after
//! construction.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use compact_str::CompactString;

use crate::error::{Error, Result};
use crate::model::{NodeKind, QName};
use crate::order::OrderIndex;

static NEXT_DOC_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Document`] instance, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocId(u64);

/// Copyable handle to a node in a document arena. Carries the owning
/// document's identity so cross-document misuse is detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    doc: DocId,
    index: u32,
}

impl NodeId {
    pub fn doc(self) -> DocId {
        self.doc
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) name: Option<QName>,
    pub(crate) value: Option<CompactString>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: Vec<NodeId>,
    /// Namespace declarations made on this element (prefix, URI).
    pub(crate) namespaces: Vec<(CompactString, CompactString)>,
    /// Document-order rank; `None` until the node is appended.
    pub(crate) rank: Option<u32>,
}

impl NodeData {
    fn new(kind: NodeKind, name: Option<QName>, value: Option<CompactString>) -> Self {
        Self {
            kind,
            name,
            value,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
            rank: None,
        }
    }
}

/// One document tree. Single-writer during construction; read-only (and
/// freely shared) during evaluation.
#[derive(Debug)]
pub struct Document {
    id: DocId,
    nodes: Vec<NodeData>,
    doc_element: Option<NodeId>,
    doctype_name: Option<CompactString>,
    order_count: u32,
    pub(crate) index: OrderIndex,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document. The document node itself holds rank 0 at
    /// level 0; the order counter continues from 1.
    pub fn new() -> Self {
        let id = DocId(NEXT_DOC_ID.fetch_add(1, AtomicOrdering::Relaxed));
        let mut root = NodeData::new(NodeKind::Document, None, None);
        root.rank = Some(0);
        let mut index = OrderIndex::new();
        index.push_unindexed();
        index.set_level(0, 0);
        Self {
            id,
            nodes: vec![root],
            doc_element: None,
            doctype_name: None,
            order_count: 1,
            index,
        }
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    /// The document node (the tree root).
    pub fn document_node(&self) -> NodeId {
        NodeId {
            doc: self.id,
            index: 0,
        }
    }

    /// The single document element, once one has been appended.
    pub fn document_element(&self) -> Option<NodeId> {
        self.doc_element
    }

    pub fn set_doctype_name(&mut self, name: impl Into<CompactString>) {
        self.doctype_name = Some(name.into());
    }

    pub fn doctype_name(&self) -> Option<&str> {
        self.doctype_name.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.doc == self.id && node.index() < self.nodes.len()
    }

    // ---- factories ----------------------------------------------------
    //
    // Factories allocate in the arena with no rank; the rank arrives only
    // when the node is appended.

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let index = u32::try_from(self.nodes.len()).expect("node arena overflow");
        self.nodes.push(data);
        self.index.push_unindexed();
        NodeId {
            doc: self.id,
            index,
        }
    }

    pub fn create_element(&mut self, local: impl Into<CompactString>) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Element,
            Some(QName::local(local)),
            None,
        ))
    }

    pub fn create_element_ns(
        &mut self,
        prefix: Option<&str>,
        local: impl Into<CompactString>,
        ns_uri: impl Into<CompactString>,
    ) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Element,
            Some(QName::with_ns(prefix, local, ns_uri)),
            None,
        ))
    }

    pub fn create_attribute(
        &mut self,
        local: impl Into<CompactString>,
        value: impl Into<CompactString>,
    ) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Attribute,
            Some(QName::local(local)),
            Some(value.into()),
        ))
    }

    pub fn create_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        local: impl Into<CompactString>,
        ns_uri: impl Into<CompactString>,
        value: impl Into<CompactString>,
    ) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::Attribute,
            Some(QName::with_ns(prefix, local, ns_uri)),
            Some(value.into()),
        ))
    }

    pub fn create_text(&mut self, data: impl Into<CompactString>) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Text, None, Some(data.into())))
    }

    pub fn create_comment(&mut self, data: impl Into<CompactString>) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Comment, None, Some(data.into())))
    }

    pub fn create_pi(
        &mut self,
        target: impl Into<CompactString>,
        data: impl Into<CompactString>,
    ) -> NodeId {
        self.alloc(NodeData::new(
            NodeKind::ProcessingInstruction,
            Some(QName::local(target)),
            Some(data.into()),
        ))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::new(NodeKind::DocumentFragment, None, None))
    }

    // ---- construction -------------------------------------------------

    /// Append `new` as the last child of `parent`, stamping it with the next
    /// document-order rank and registering it with the order indexer.
    ///
    /// Structural errors: cross-document nodes, re-appending a node that
    /// already has a parent, a non-container parent, an unranked parent, or a
    /// second element appended directly under the document node.
    pub fn append_child(&mut self, parent: NodeId, new: NodeId) -> Result<()> {
        self.check_owned(parent)?;
        self.check_owned(new)?;
        if new.index == 0 {
            return Err(Error::structural("cannot append the document node"));
        }
        if self.nodes[new.index()].parent.is_some() {
            return Err(Error::structural("node already has a parent"));
        }
        match self.nodes[new.index()].kind {
            NodeKind::Attribute => {
                return Err(Error::structural(
                    "attribute nodes attach via set_attribute, not append_child",
                ));
            }
            NodeKind::Document => {
                return Err(Error::structural("cannot append a document node"));
            }
            _ => {}
        }
        if !self.nodes[parent.index()].kind.is_container() {
            return Err(Error::structural("parent node cannot own children"));
        }
        let Some(parent_level) = self.index.level(parent.index()) else {
            return Err(Error::structural("parent has not been appended yet"));
        };
        if parent.index == 0 && self.nodes[new.index()].kind == NodeKind::Element {
            if self.doc_element.is_some() {
                return Err(Error::structural(
                    "document element is already present",
                ));
            }
            self.doc_element = Some(new);
        }

        let rank = self.order_count;
        self.order_count += 1;
        let level = parent_level + 1;
        self.nodes[new.index()].rank = Some(rank);
        self.nodes[new.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(new);
        self.index.set_level(new.index(), level);
        tracing::trace!(rank, level, kind = ?self.nodes[new.index()].kind, "node appended");
        Ok(())
    }

    /// Attach an attribute node to an element. Attributes run through the
    /// same order counter, so they rank after their element and before any
    /// children appended later.
    pub fn set_attribute(&mut self, element: NodeId, attr: NodeId) -> Result<()> {
        self.check_owned(element)?;
        self.check_owned(attr)?;
        if self.nodes[element.index()].kind != NodeKind::Element {
            return Err(Error::structural("attributes attach to element nodes only"));
        }
        if self.nodes[attr.index()].kind != NodeKind::Attribute {
            return Err(Error::structural("set_attribute requires an attribute node"));
        }
        if self.nodes[attr.index()].parent.is_some() {
            return Err(Error::structural("attribute already has an owner element"));
        }
        let Some(element_level) = self.index.level(element.index()) else {
            return Err(Error::structural("element has not been appended yet"));
        };
        // Attributes rank after their element and before its children, which
        // only holds while the element is still childless.
        if !self.nodes[element.index()].children.is_empty() {
            return Err(Error::structural(
                "attributes must be set before children are appended",
            ));
        }
        let rank = self.order_count;
        self.order_count += 1;
        self.nodes[attr.index()].rank = Some(rank);
        self.nodes[attr.index()].parent = Some(element);
        self.nodes[element.index()].attributes.push(attr);
        self.index.set_level(attr.index(), element_level + 1);
        Ok(())
    }

    /// Record a namespace declaration in scope at an element.
    pub fn declare_namespace(
        &mut self,
        element: NodeId,
        prefix: impl Into<CompactString>,
        uri: impl Into<CompactString>,
    ) -> Result<()> {
        self.check_owned(element)?;
        if self.nodes[element.index()].kind != NodeKind::Element {
            return Err(Error::structural(
                "namespace declarations attach to element nodes only",
            ));
        }
        self.nodes[element.index()]
            .namespaces
            .push((prefix.into(), uri.into()));
        Ok(())
    }

    // ---- node accessors -----------------------------------------------

    pub(crate) fn data(&self, node: NodeId) -> &NodeData {
        assert!(self.contains(node), "node from another document");
        &self.nodes[node.index()]
    }

    pub(crate) fn check_owned(&self, node: NodeId) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(Error::structural("node belongs to another document"))
        }
    }

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.data(node).kind
    }

    pub fn name(&self, node: NodeId) -> Option<&QName> {
        self.data(node).name.as_ref()
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.data(node).value.as_deref()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    pub fn attributes(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).attributes
    }

    /// Namespace declarations made directly on this element.
    pub fn namespace_declarations(&self, node: NodeId) -> &[(CompactString, CompactString)] {
        &self.data(node).namespaces
    }

    /// Resolve a prefix against declarations in scope, nearest element first.
    pub fn lookup_namespace_uri(&self, node: NodeId, prefix: &str) -> Option<&str> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.kind(n) == NodeKind::Element {
                for (p, uri) in &self.data(n).namespaces {
                    if p == prefix {
                        return Some(uri);
                    }
                }
            }
            cur = self.parent(n);
        }
        None
    }

    /// Document-order rank, or `None` for a node not yet appended.
    pub fn rank(&self, node: NodeId) -> Option<u32> {
        self.data(node).rank
    }

    /// XPath string value: own character data for attribute/text/comment/PI,
    /// concatenated descendant text for containers.
    pub fn string_value(&self, node: NodeId) -> String {
        let data = self.data(node);
        if data.kind.is_character_data() {
            return data.value.as_deref().unwrap_or_default().to_string();
        }
        let mut out = String::new();
        let mut stack: Vec<NodeId> = data.children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            let d = &self.nodes[n.index()];
            if d.kind == NodeKind::Text {
                out.push_str(d.value.as_deref().unwrap_or_default());
            }
            stack.extend(d.children.iter().rev().copied());
        }
        out
    }
}
