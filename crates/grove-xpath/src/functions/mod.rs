//! The function dispatch protocol and the built-in library.
//!
//! Every built-in or extension function implements the same operation:
//! `execute(expr, context, context_node, arg_position, args)` with arguments
//! already evaluated into [`Value`]s. `arg_position` is the 1-based position
//! of the function's first argument within the enclosing call, used as the
//! base for argument diagnostics.
//!
//! Lookup misses inside functions (an ID that resolves to nothing, a missing
//! `xml:lang`) are expected outcomes and never raise; genuine context
//! problems go through the execution context's error sink.

mod ids;
mod lang;

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::model::{NodeKind, QName};
use crate::tree::NodeId;
use crate::value::Value;

pub use ids::FuncId;
pub use lang::FuncLang;

pub trait Function: Send + Sync {
    fn execute(
        &self,
        expr: &Expr,
        ctx: &mut ExecutionContext,
        context_node: NodeId,
        arg_position: usize,
        args: &[Value],
    ) -> Result<Value>;
}

/// Registry of functions by name. Explicitly constructed and owned by the
/// evaluator (or the host); extension functions register through the same
/// call as the built-ins.
#[derive(Default)]
pub struct FunctionLibrary {
    fns: HashMap<QName, Arc<dyn Function>>,
}

impl FunctionLibrary {
    /// An empty library with no functions at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in library.
    pub fn new() -> Self {
        let mut lib = Self::default();
        lib.register(QName::local("id"), Arc::new(FuncId));
        lib.register(QName::local("lang"), Arc::new(FuncLang));
        lib.register(QName::local("true"), Arc::new(FuncTrue));
        lib.register(QName::local("false"), Arc::new(FuncFalse));
        lib.register(QName::local("not"), Arc::new(FuncNot));
        lib.register(QName::local("boolean"), Arc::new(FuncBoolean));
        lib.register(QName::local("string"), Arc::new(FuncString));
        lib.register(QName::local("number"), Arc::new(FuncNumber));
        lib.register(QName::local("count"), Arc::new(FuncCount));
        lib.register(QName::local("position"), Arc::new(FuncPosition));
        lib.register(QName::local("last"), Arc::new(FuncLast));
        lib.register(QName::local("local-name"), Arc::new(FuncLocalName));
        lib
    }

    pub fn register(&mut self, name: QName, func: Arc<dyn Function>) {
        self.fns.insert(name, func);
    }

    pub fn get(&self, name: &QName) -> Option<&Arc<dyn Function>> {
        self.fns.get(name)
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.fns.contains_key(name)
    }
}

pub(crate) fn require_arity(function: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::eval(format!(
            "{function}() expects {expected} argument(s), got {}",
            args.len()
        )))
    }
}

// ---- small built-ins -----------------------------------------------------

struct FuncTrue;

impl Function for FuncTrue {
    fn execute(
        &self,
        _expr: &Expr,
        _ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("true", args, 0)?;
        Ok(Value::Boolean(true))
    }
}

struct FuncFalse;

impl Function for FuncFalse {
    fn execute(
        &self,
        _expr: &Expr,
        _ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("false", args, 0)?;
        Ok(Value::Boolean(false))
    }
}

struct FuncNot;

impl Function for FuncNot {
    fn execute(
        &self,
        _expr: &Expr,
        _ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("not", args, 1)?;
        Ok(Value::Boolean(!args[0].boolean()))
    }
}

struct FuncBoolean;

impl Function for FuncBoolean {
    fn execute(
        &self,
        _expr: &Expr,
        _ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("boolean", args, 1)?;
        Ok(Value::Boolean(args[0].boolean()))
    }
}

struct FuncString;

impl Function for FuncString {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        let doc = Arc::clone(ctx.document());
        match args {
            [] => Ok(Value::String(doc.string_value(context_node).into())),
            [arg] => Ok(Value::String(arg.string(&doc))),
            _ => require_arity("string", args, 1).map(|()| Value::Empty),
        }
    }
}

struct FuncNumber;

impl Function for FuncNumber {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        let doc = Arc::clone(ctx.document());
        match args {
            [] => Ok(Value::Number(
                Value::String(doc.string_value(context_node).into()).number(&doc),
            )),
            [arg] => Ok(Value::Number(arg.number(&doc))),
            _ => require_arity("number", args, 1).map(|()| Value::Empty),
        }
    }
}

struct FuncCount;

impl Function for FuncCount {
    fn execute(
        &self,
        _expr: &Expr,
        _ctx: &mut ExecutionContext,
        _context_node: NodeId,
        arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("count", args, 1)?;
        match &args[0] {
            Value::Nodes(ns) => Ok(Value::Number(ns.len() as f64)),
            Value::Empty => Ok(Value::Number(0.0)),
            other => Err(Error::argument_type(
                "count",
                arg_position,
                "node-set",
                other.kind_name(),
            )),
        }
    }
}

struct FuncPosition;

impl Function for FuncPosition {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("position", args, 0)?;
        // Inside predicates the evaluator threads the axis-order position;
        // outside, fall back to the pushed list. The outermost evaluation
        // behaves as a singleton context.
        let pos = match ctx.context_position() {
            Some(p) => p,
            None => match (ctx.current_context_node_list(), ctx.current_node()) {
                (Some(list), Some(node)) => list.position_of(node).map_or(1, |i| i + 1),
                _ => 1,
            },
        };
        Ok(Value::Number(pos as f64))
    }
}

struct FuncLast;

impl Function for FuncLast {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("last", args, 0)?;
        let last = ctx
            .current_context_node_list()
            .map_or(1, |list| list.len().max(1));
        Ok(Value::Number(last as f64))
    }
}

struct FuncLocalName;

impl Function for FuncLocalName {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        context_node: NodeId,
        arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        let doc = Arc::clone(ctx.document());
        let node = match args {
            [] => Some(context_node),
            [Value::Nodes(ns)] => ns.first(),
            [Value::Empty] => None,
            [other] => {
                return Err(Error::argument_type(
                    "local-name",
                    arg_position,
                    "node-set",
                    other.kind_name(),
                ));
            }
            _ => return require_arity("local-name", args, 1).map(|()| Value::Empty),
        };
        let name = node
            .filter(|&n| {
                matches!(
                    doc.kind(n),
                    NodeKind::Element | NodeKind::Attribute | NodeKind::ProcessingInstruction
                )
            })
            .and_then(|n| doc.name(n))
            .map(|q| q.local.clone())
            .unwrap_or_default();
        Ok(Value::String(name))
    }
}
