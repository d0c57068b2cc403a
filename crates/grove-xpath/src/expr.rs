//! The expression AST the evaluator interprets, and the single factory
//! contract that constructs it.
//!
//! The grammar is closed: every variant is built through [`ExprFactory`], so
//! the evaluator can assume no structurally invalid tree exists (a combine
//! expression always carries its discriminator, a quantified expression
//! always binds exactly one variable — multiple clauses chain by nesting).
//! Trees are immutable once constructed and may be shared read-only across
//! concurrent evaluations.

use compact_str::CompactString;

use crate::axis::Axis;
use crate::model::QName;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(f64),
    Double(f64),
    String(CompactString),
}

/// Discriminator for combining/operator expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    And,
    Or,
    Union,
    Intersect,
    Except,
    Sequence,
}

impl core::fmt::Display for CombineOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CombineOp::And => "and",
            CombineOp::Or => "or",
            CombineOp::Union => "union",
            CombineOp::Intersect => "intersect",
            CombineOp::Except => "except",
            CombineOp::Sequence => "sequence",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    For,
    Some,
    Every,
}

/// Target of a cast/treat expression. The XPath 2.0 sequence-type system is
/// out of scope; targets name the value kinds of this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Boolean,
    Number,
    String,
    NodeSet,
}

impl TargetType {
    pub fn name(self) -> &'static str {
        match self {
            TargetType::Boolean => "boolean",
            TargetType::Number => "number",
            TargetType::String => "string",
            TargetType::NodeSet => "node-set",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameTest {
    /// Match on (namespace URI, local name); the prefix is not consulted.
    Name(QName),
    /// `*`
    Any,
    /// `ns:*` — any local name in one namespace.
    NsWildcard(CompactString),
    /// `*:local` — one local name in any namespace.
    LocalWildcard(CompactString),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindTest {
    /// `node()`
    AnyKind,
    Text,
    Comment,
    /// `processing-instruction()` with an optional target.
    ProcessingInstruction(Option<CompactString>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Name(NameTest),
    Kind(KindTest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// Attach a predicate; a numeric predicate is a positional test.
    pub fn add_predicate(&mut self, predicate: Expr) {
        self.predicates.push(predicate);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

impl PathExpr {
    pub fn add_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn into_expr(self) -> Expr {
        Expr::Path(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    VarRef(QName),
    FunctionCall {
        name: QName,
        args: Vec<Expr>,
    },
    Path(PathExpr),
    Operator {
        op: CombineOp,
        operands: Vec<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `for`/`some`/`every` with exactly one bound variable; multiple
    /// clauses nest.
    ForOrQuantified {
        kind: QuantifierKind,
        var: QName,
        source: Box<Expr>,
        body: Box<Expr>,
    },
    CastOrTreat {
        /// `treat as` checks the kind; `cast as` coerces.
        treat: bool,
        target: TargetType,
        operand: Box<Expr>,
    },
}

/// The single construction contract for every AST variant.
///
/// Centralizing construction here decouples tree-shape decisions from the
/// parser that drives it.
#[derive(Debug, Default)]
pub struct ExprFactory;

impl ExprFactory {
    pub fn new() -> Self {
        Self
    }

    // ---- literals -------------------------------------------------------

    pub fn create_integer_literal(&self, value: i64) -> Expr {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn create_decimal_literal(&self, value: f64) -> Expr {
        Expr::Literal(Literal::Decimal(value))
    }

    pub fn create_double_literal(&self, value: f64) -> Expr {
        Expr::Literal(Literal::Double(value))
    }

    pub fn create_string_literal(&self, value: impl Into<CompactString>) -> Expr {
        Expr::Literal(Literal::String(value.into()))
    }

    // ---- paths ------------------------------------------------------------

    pub fn create_path_expr(&self, absolute: bool) -> PathExpr {
        PathExpr {
            absolute,
            steps: Vec::new(),
        }
    }

    pub fn create_step_expr(&self, axis: Axis, test: NodeTest) -> Step {
        Step {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    pub fn create_name_test(&self, ns_uri: Option<&str>, local: &str) -> NodeTest {
        let test = match (ns_uri, local) {
            (None, "*") => NameTest::Any,
            (Some(ns), "*") => NameTest::NsWildcard(CompactString::from(ns)),
            (None, _) => NameTest::Name(QName::local(local)),
            (Some(ns), _) => NameTest::Name(QName::with_ns(None, local, ns)),
        };
        NodeTest::Name(test)
    }

    pub fn create_local_wildcard_test(&self, local: &str) -> NodeTest {
        NodeTest::Name(NameTest::LocalWildcard(CompactString::from(local)))
    }

    pub fn create_kind_test(&self, kind: KindTest) -> NodeTest {
        NodeTest::Kind(kind)
    }

    // ---- operators ----------------------------------------------------------

    /// An empty sequence-construction expression; extend with
    /// [`ExprFactory::add_operand`].
    pub fn create_sequence(&self) -> Expr {
        Expr::Operator {
            op: CombineOp::Sequence,
            operands: Vec::new(),
        }
    }

    /// A combining expression (union/intersect/except) over two operands.
    /// The discriminator is required; and/or have their own constructors.
    pub fn create_combine_expr(&self, op: CombineOp, left: Expr, right: Expr) -> Expr {
        Expr::Operator {
            op,
            operands: vec![left, right],
        }
    }

    pub fn create_and_expr(&self, left: Expr, right: Expr) -> Expr {
        self.create_combine_expr(CombineOp::And, left, right)
    }

    pub fn create_or_expr(&self, left: Expr, right: Expr) -> Expr {
        self.create_combine_expr(CombineOp::Or, left, right)
    }

    /// Append an operand to an operator expression. Any other variant is
    /// rejected so invalid shapes cannot be built.
    pub fn add_operand(&self, expr: &mut Expr, operand: Expr) -> crate::error::Result<()> {
        match expr {
            Expr::Operator { operands, .. } => {
                operands.push(operand);
                Ok(())
            }
            _ => Err(crate::error::Error::eval(
                "add_operand requires an operator expression",
            )),
        }
    }

    // ---- control ----------------------------------------------------------------

    pub fn create_if_expr(&self, test: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::Conditional {
            test: Box::new(test),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn create_for_expr(&self, var: QName, source: Expr, body: Expr) -> Expr {
        Expr::ForOrQuantified {
            kind: QuantifierKind::For,
            var,
            source: Box::new(source),
            body: Box::new(body),
        }
    }

    pub fn create_some_expr(&self, var: QName, source: Expr, body: Expr) -> Expr {
        Expr::ForOrQuantified {
            kind: QuantifierKind::Some,
            var,
            source: Box::new(source),
            body: Box::new(body),
        }
    }

    pub fn create_every_expr(&self, var: QName, source: Expr, body: Expr) -> Expr {
        Expr::ForOrQuantified {
            kind: QuantifierKind::Every,
            var,
            source: Box::new(source),
            body: Box::new(body),
        }
    }

    pub fn create_cast_as_expr(&self, target: TargetType, operand: Expr) -> Expr {
        Expr::CastOrTreat {
            treat: false,
            target,
            operand: Box::new(operand),
        }
    }

    pub fn create_treat_as_expr(&self, target: TargetType, operand: Expr) -> Expr {
        Expr::CastOrTreat {
            treat: true,
            target,
            operand: Box::new(operand),
        }
    }

    // ---- references ---------------------------------------------------------------

    pub fn create_var_ref(&self, name: QName) -> Expr {
        Expr::VarRef(name)
    }

    pub fn create_function_call(&self, name: QName, args: Vec<Expr>) -> Expr {
        Expr::FunctionCall { name, args }
    }
}
