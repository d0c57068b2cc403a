//! XPath evaluation core over an arena-backed XML source tree.
//!
//! The tree assigns every node a document-order rank at append time, so
//! order comparison is O(1) and node-sets stay sorted by cheap merges. The
//! evaluator walks a factory-built AST against an [`ExecutionContext`] that
//! carries the traversal stacks, variable frames and injected collaborators
//! for one evaluation session.

pub mod axis;
pub mod context;
pub mod error;
pub mod eval;
pub mod expr;
pub mod functions;
pub mod model;
pub mod nodeset;
pub mod order;
pub mod tree;
pub mod value;

pub use axis::{Axis, AxisCursor};
pub use context::{
    AbortingSink, Disposition, ErrorSink, ExecutionContext, ExecutionContextBuilder, IdResolver,
    PrefixResolver, VariableStack,
};
pub use error::{Error, Result};
pub use eval::{Evaluator, evaluate};
pub use expr::{
    CombineOp, Expr, ExprFactory, KindTest, Literal, NameTest, NodeTest, PathExpr, QuantifierKind,
    Step, TargetType,
};
pub use functions::{Function, FunctionLibrary};
pub use model::{NodeKind, QName, XML_URI};
pub use nodeset::NodeSet;
pub use tree::{DocId, Document, NodeId};
pub use value::Value;
