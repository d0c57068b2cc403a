//! Node kinds and qualified names shared by the source tree and the AST.

use compact_str::CompactString;

/// URI of the reserved `xml` namespace (carries `xml:lang`, `xml:id`, ...).
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    DocumentFragment,
}

impl NodeKind {
    /// Kinds that may own child nodes.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Element | NodeKind::DocumentFragment
        )
    }

    /// Kinds whose string value is their own character data.
    pub fn is_character_data(self) -> bool {
        matches!(
            self,
            NodeKind::Attribute | NodeKind::Text | NodeKind::Comment | NodeKind::ProcessingInstruction
        )
    }
}

/// A qualified name: optional prefix, local part, optional namespace URI.
///
/// Prefix-to-URI resolution policy lives with the host; the core only stores
/// and compares what it is given. Name equality for node tests is on
/// (namespace URI, local part); the prefix is carried for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<CompactString>,
    pub local: CompactString,
    pub ns_uri: Option<CompactString>,
}

impl QName {
    /// A name with no prefix and no namespace.
    pub fn local(local: impl Into<CompactString>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            ns_uri: None,
        }
    }

    pub fn with_ns(
        prefix: Option<&str>,
        local: impl Into<CompactString>,
        ns_uri: impl Into<CompactString>,
    ) -> Self {
        Self {
            prefix: prefix.map(CompactString::from),
            local: local.into(),
            ns_uri: Some(ns_uri.into()),
        }
    }

    /// True for names in the reserved `xml` namespace, whether the builder
    /// attached the URI or only the magic prefix.
    pub fn is_xml_ns(&self) -> bool {
        self.ns_uri.as_deref() == Some(XML_URI) || self.prefix.as_deref() == Some("xml")
    }

    /// (namespace URI, local part) equality, ignoring the prefix.
    pub fn matches(&self, ns_uri: Option<&str>, local: &str) -> bool {
        self.local == local && self.ns_uri.as_deref() == ns_uri
    }
}

impl core::fmt::Display for QName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}
