//! The `id()` function: whitespace-tokenized ID lookup with per-token
//! deduplication, results merged in document order.

use std::collections::HashSet;
use std::sync::Arc;

use compact_str::CompactString;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::functions::{Function, require_arity};
use crate::nodeset::NodeSet;
use crate::tree::NodeId;
use crate::value::Value;

pub struct FuncId;

impl Function for FuncId {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        _context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("id", args, 1)?;
        let doc = Arc::clone(ctx.document());
        let arg = &args[0];

        let mut result = NodeSet::new();
        // Empty argument, or a non-node-set whose string form is empty,
        // short-circuits to an empty node-set — never an error.
        let sources: Vec<CompactString> = match arg {
            Value::Empty => return Ok(Value::Nodes(result)),
            Value::Nodes(ns) => ns
                .iter()
                .map(|n| CompactString::from(doc.string_value(n)))
                .collect(),
            other => {
                let s = other.string(&doc);
                if s.is_empty() {
                    return Ok(Value::Nodes(result));
                }
                vec![s]
            }
        };

        if sources.iter().all(|s| s.split_whitespace().next().is_none()) {
            return Ok(Value::Nodes(result));
        }
        let Some(resolver) = ctx.id_resolver().cloned() else {
            // The sink decides whether a missing resolver aborts the
            // evaluation.
            ctx.report(Error::context_misuse(
                "id() requires an ID resolver on the execution context",
            ))?;
            return Ok(Value::Nodes(result));
        };

        // Each distinct token is looked up exactly once, even when repeated
        // across several source strings.
        let mut seen: HashSet<CompactString> = HashSet::new();
        for source in &sources {
            for token in source.split_whitespace() {
                if !seen.insert(CompactString::from(token)) {
                    continue;
                }
                // Unresolved tokens are skipped, not errors.
                if let Some(element) = resolver.element_by_id(token, &doc) {
                    result.add_node_in_order(element, &doc)?;
                }
            }
        }
        tracing::trace!(tokens = seen.len(), hits = result.len(), "id() resolved");
        Ok(Value::Nodes(result))
    }
}
