//! The recursive expression evaluator: one exhaustive match over the AST,
//! threading the execution context's stacks through steps, predicates and
//! function calls.
//!
//! On a fatal error the context's stacks are deliberately not unwound; the
//! session is over and [`ExecutionContext::reset`] restores it for the next
//! run.

use std::sync::Arc;

use crate::axis::AxisCursor;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::expr::{CombineOp, Expr, Literal, NameTest, NodeTest, PathExpr, QuantifierKind, Step, TargetType};
use crate::functions::FunctionLibrary;
use crate::model::NodeKind;
use crate::nodeset::NodeSet;
use crate::tree::{Document, NodeId};
use crate::value::Value;

/// Walks expression trees against an execution context. Holds the function
/// library; one evaluator may serve many sequential evaluations.
pub struct Evaluator {
    library: FunctionLibrary,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// An evaluator with the built-in function library.
    pub fn new() -> Self {
        Self {
            library: FunctionLibrary::new(),
        }
    }

    pub fn with_library(library: FunctionLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &FunctionLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut FunctionLibrary {
        &mut self.library
    }

    /// Evaluate one expression to a value.
    pub fn evaluate(&self, expr: &Expr, ctx: &mut ExecutionContext) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),

            Expr::VarRef(name) => ctx.variable(name).ok_or_else(|| {
                // The context reports absence; a dangling reference in an
                // expression is fatal here, at the caller.
                Error::eval(format!("unbound variable ${name}"))
            }),

            Expr::FunctionCall { name, args } => self.eval_function_call(expr, name, args, ctx),

            Expr::Path(path) => self.eval_path(path, ctx),

            Expr::Operator { op, operands } => self.eval_operator(*op, operands, ctx),

            Expr::Conditional {
                test,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(test, ctx)?.boolean() {
                    self.evaluate(then_branch, ctx)
                } else {
                    self.evaluate(else_branch, ctx)
                }
            }

            Expr::ForOrQuantified {
                kind,
                var,
                source,
                body,
            } => self.eval_for_or_quantified(*kind, var, source, body, ctx),

            Expr::CastOrTreat {
                treat,
                target,
                operand,
            } => {
                let value = self.evaluate(operand, ctx)?;
                if *treat {
                    treat_as(value, *target)
                } else {
                    cast_as(value, *target, ctx.document())
                }
            }
        }
    }

    fn eval_function_call(
        &self,
        call: &Expr,
        name: &crate::model::QName,
        args: &[Expr],
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, ctx)?);
        }
        let Some(func) = self.library.get(name) else {
            return Err(Error::UnknownFunction(name.to_string().into()));
        };
        let context_node = ctx
            .current_node()
            .unwrap_or_else(|| ctx.document().document_node());
        func.execute(call, ctx, context_node, 1, &values)
    }

    fn eval_path(&self, path: &PathExpr, ctx: &mut ExecutionContext) -> Result<Value> {
        let doc = Arc::clone(ctx.document());
        let mut current = NodeSet::new();
        if path.absolute {
            current.add_node_in_order(doc.document_node(), &doc)?;
        } else {
            match ctx.current_node() {
                Some(node) => {
                    current.add_node_in_order(node, &doc)?;
                }
                None => {
                    return Err(Error::eval("relative path evaluated with no current node"));
                }
            }
        }
        for step in &path.steps {
            current = self.eval_step(step, &current, ctx, &doc)?;
            if current.is_empty() {
                break;
            }
        }
        Ok(Value::Nodes(current))
    }

    /// Evaluate one step against every origin node, merging results in
    /// document order.
    fn eval_step(
        &self,
        step: &Step,
        origins: &NodeSet,
        ctx: &mut ExecutionContext,
        doc: &Arc<Document>,
    ) -> Result<NodeSet> {
        let mut out = NodeSet::new();
        let saved = ctx.current_node();
        ctx.push_context_node_list(origins.clone());
        for origin in origins.iter() {
            ctx.set_current_node(Some(origin));
            ctx.push_axis_cursor(AxisCursor::new(doc, step.axis, origin));
            // Candidates stay in axis order so positional predicates count
            // the way the axis runs (nearest-first on reverse axes).
            let mut candidates: Vec<NodeId> = Vec::new();
            while let Some(node) = ctx.advance_axis_cursor() {
                if node_test_matches(doc, step, node) {
                    candidates.push(node);
                }
            }
            ctx.pop_axis_cursor()?;
            let survivors = self.apply_predicates(&step.predicates, candidates, ctx, doc)?;
            for node in survivors {
                out.add_node_in_order(node, doc)?;
            }
        }
        ctx.pop_context_node_list()?;
        ctx.set_current_node(saved);
        tracing::trace!(axis = %step.axis, results = out.len(), "step evaluated");
        Ok(out)
    }

    fn apply_predicates(
        &self,
        predicates: &[Expr],
        mut candidates: Vec<NodeId>,
        ctx: &mut ExecutionContext,
        doc: &Arc<Document>,
    ) -> Result<Vec<NodeId>> {
        let saved_position = ctx.context_position();
        for predicate in predicates {
            let mut list = NodeSet::new();
            for &node in &candidates {
                list.add_node_in_order(node, doc)?;
            }
            ctx.push_context_node_list(list);
            let mut kept = Vec::with_capacity(candidates.len());
            for (i, &candidate) in candidates.iter().enumerate() {
                ctx.set_current_node(Some(candidate));
                // Predicates count in axis order (nearest first on reverse
                // axes); position() must see the same counting.
                ctx.set_context_position(Some(i + 1));
                let value = self.evaluate(predicate, ctx)?;
                let keep = match value {
                    // A numeric predicate is a positional test.
                    Value::Number(n) => (i + 1) as f64 == n,
                    other => other.boolean(),
                };
                if keep {
                    kept.push(candidate);
                }
            }
            ctx.set_context_position(saved_position);
            ctx.pop_context_node_list()?;
            candidates = kept;
            if candidates.is_empty() {
                break;
            }
        }
        Ok(candidates)
    }

    fn eval_operator(
        &self,
        op: CombineOp,
        operands: &[Expr],
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        match op {
            CombineOp::And => {
                for operand in operands {
                    if !self.evaluate(operand, ctx)?.boolean() {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(Value::Boolean(true))
            }
            CombineOp::Or => {
                for operand in operands {
                    if self.evaluate(operand, ctx)?.boolean() {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            }
            CombineOp::Union | CombineOp::Intersect | CombineOp::Except | CombineOp::Sequence => {
                let doc = Arc::clone(ctx.document());
                let label = op.to_string();
                let mut acc: Option<NodeSet> = None;
                for (i, operand) in operands.iter().enumerate() {
                    let value = self.evaluate(operand, ctx)?;
                    let ns = into_node_set(value, &label, i + 1)?;
                    acc = Some(match acc {
                        None => ns,
                        Some(prev) => match op {
                            CombineOp::Intersect => prev.intersect(&ns, &doc)?,
                            CombineOp::Except => prev.except(&ns, &doc)?,
                            _ => prev.union(&ns, &doc)?,
                        },
                    });
                }
                Ok(Value::Nodes(acc.unwrap_or_default()))
            }
        }
    }

    fn eval_for_or_quantified(
        &self,
        kind: QuantifierKind,
        var: &crate::model::QName,
        source: &Expr,
        body: &Expr,
        ctx: &mut ExecutionContext,
    ) -> Result<Value> {
        let doc = Arc::clone(ctx.document());
        let source_value = self.evaluate(source, ctx)?;
        let quantifier = match kind {
            QuantifierKind::For => "for",
            QuantifierKind::Some => "some",
            QuantifierKind::Every => "every",
        };
        let Value::Nodes(source_set) = source_value else {
            return Err(Error::argument_type(
                quantifier,
                1,
                "node-set",
                source_value.kind_name(),
            ));
        };

        let mut collected = NodeSet::new();
        for node in source_set.iter() {
            ctx.variables().push_frame();
            ctx.variables()
                .bind(var.clone(), Value::Nodes(NodeSet::singleton(node, &doc)?));
            let body_value = self.evaluate(body, ctx);
            ctx.variables().pop_frame();
            let body_value = body_value?;
            match kind {
                QuantifierKind::Some => {
                    if body_value.boolean() {
                        return Ok(Value::Boolean(true));
                    }
                }
                QuantifierKind::Every => {
                    if !body_value.boolean() {
                        return Ok(Value::Boolean(false));
                    }
                }
                QuantifierKind::For => {
                    let ns = into_node_set(body_value, quantifier, 2)?;
                    collected = collected.union(&ns, &doc)?;
                }
            }
        }
        match kind {
            QuantifierKind::Some => Ok(Value::Boolean(false)),
            QuantifierKind::Every => Ok(Value::Boolean(true)),
            QuantifierKind::For => Ok(Value::Nodes(collected)),
        }
    }
}

/// Evaluate with a freshly built default evaluator. Convenience for hosts
/// that do not keep an [`Evaluator`] around.
pub fn evaluate(expr: &Expr, ctx: &mut ExecutionContext) -> Result<Value> {
    Evaluator::new().evaluate(expr, ctx)
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(i) => Value::Number(*i as f64),
        Literal::Decimal(d) | Literal::Double(d) => Value::Number(*d),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn into_node_set(value: Value, operation: &str, position: usize) -> Result<NodeSet> {
    match value {
        Value::Nodes(ns) => Ok(ns),
        Value::Empty => Ok(NodeSet::new()),
        other => Err(Error::argument_type(
            operation,
            position,
            "node-set",
            other.kind_name(),
        )),
    }
}

fn treat_as(value: Value, target: TargetType) -> Result<Value> {
    let matches = matches!(
        (&value, target),
        (Value::Boolean(_), TargetType::Boolean)
            | (Value::Number(_), TargetType::Number)
            | (Value::String(_), TargetType::String)
            | (Value::Nodes(_), TargetType::NodeSet)
    );
    if matches {
        Ok(value)
    } else {
        Err(Error::argument_type(
            "treat as",
            1,
            target.name(),
            value.kind_name(),
        ))
    }
}

fn cast_as(value: Value, target: TargetType, doc: &Document) -> Result<Value> {
    match target {
        TargetType::Boolean => Ok(Value::Boolean(value.boolean())),
        TargetType::Number => Ok(Value::Number(value.number(doc))),
        TargetType::String => Ok(Value::String(value.string(doc))),
        // Nothing else converts into nodes.
        TargetType::NodeSet => match value {
            Value::Nodes(_) => Ok(value),
            other => Err(Error::argument_type(
                "cast as",
                1,
                "node-set",
                other.kind_name(),
            )),
        },
    }
}

fn node_test_matches(doc: &Document, step: &Step, node: NodeId) -> bool {
    match &step.test {
        NodeTest::Kind(kind) => match kind {
            crate::expr::KindTest::AnyKind => true,
            crate::expr::KindTest::Text => doc.kind(node) == NodeKind::Text,
            crate::expr::KindTest::Comment => doc.kind(node) == NodeKind::Comment,
            crate::expr::KindTest::ProcessingInstruction(target) => {
                doc.kind(node) == NodeKind::ProcessingInstruction
                    && target
                        .as_ref()
                        .is_none_or(|t| doc.name(node).is_some_and(|q| q.local == *t))
            }
        },
        NodeTest::Name(name_test) => {
            if doc.kind(node) != step.axis.principal_kind() {
                return false;
            }
            let Some(name) = doc.name(node) else {
                return false;
            };
            match name_test {
                NameTest::Any => true,
                NameTest::Name(q) => name.matches(q.ns_uri.as_deref(), &q.local),
                NameTest::NsWildcard(ns) => name.ns_uri.as_deref() == Some(ns.as_str()),
                NameTest::LocalWildcard(local) => name.local == *local,
            }
        }
    }
}
