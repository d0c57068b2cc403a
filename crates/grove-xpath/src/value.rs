//! The evaluation value universe: one closed tagged union over boolean,
//! number, string, node-set and the explicit empty value, with the XPath 1.0
//! coercion rules.

use compact_str::CompactString;

use crate::nodeset::NodeSet;
use crate::tree::Document;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(CompactString),
    Nodes(NodeSet),
    /// Explicit absence (an unevaluated optional argument, an empty result).
    Empty,
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Nodes(_) => "node-set",
            Value::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Boolean coercion: non-zero non-NaN numbers, non-empty strings and
    /// non-empty node-sets are true; `Empty` is false.
    pub fn boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Nodes(ns) => !ns.is_empty(),
            Value::Empty => false,
        }
    }

    /// Number coercion; anything unparseable is NaN, per XPath.
    pub fn number(&self, doc: &Document) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => parse_number(s),
            Value::Nodes(_) => parse_number(&self.string(doc)),
            Value::Empty => f64::NAN,
        }
    }

    /// String coercion; a node-set yields the string value of its first node
    /// in document order, an empty set (or `Empty`) the empty string.
    pub fn string(&self, doc: &Document) -> CompactString {
        match self {
            Value::String(s) => s.clone(),
            Value::Boolean(b) => CompactString::from(if *b { "true" } else { "false" }),
            Value::Number(n) => format_number(*n),
            Value::Nodes(ns) => match ns.first() {
                Some(node) => CompactString::from(doc.string_value(node)),
                None => CompactString::new(""),
            },
            Value::Empty => CompactString::new(""),
        }
    }

    /// Node-set view, or `None` for every other kind (`Empty` included).
    pub fn node_set(&self) -> Option<&NodeSet> {
        match self {
            Value::Nodes(ns) => Some(ns),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(CompactString::from(s))
    }
}

impl From<NodeSet> for Value {
    fn from(ns: NodeSet) -> Self {
        Value::Nodes(ns)
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// XPath-style number formatting: integral doubles print without a fraction.
fn format_number(n: f64) -> CompactString {
    if n.is_nan() {
        return CompactString::new("NaN");
    }
    if n == n.trunc() && n.is_finite() && n.abs() < 1e15 {
        let mut s = CompactString::new("");
        use core::fmt::Write;
        let _ = write!(s, "{}", n as i64);
        s
    } else {
        let mut s = CompactString::new("");
        use core::fmt::Write;
        let _ = write!(s, "{}", n);
        s
    }
}
