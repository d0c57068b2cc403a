//! The `lang()` function: ancestor-or-self walk to the nearest `xml:lang`,
//! matched case-insensitively on language subtag boundaries.

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::expr::Expr;
use crate::functions::{Function, require_arity};
use crate::model::NodeKind;
use crate::tree::NodeId;
use crate::value::Value;

pub struct FuncLang;

impl Function for FuncLang {
    fn execute(
        &self,
        _expr: &Expr,
        ctx: &mut ExecutionContext,
        context_node: NodeId,
        _arg_position: usize,
        args: &[Value],
    ) -> Result<Value> {
        require_arity("lang", args, 1)?;
        let doc = Arc::clone(ctx.document());
        let wanted = args[0].string(&doc).to_ascii_lowercase();

        let mut is_lang = false;
        let mut cur = Some(context_node);
        while let Some(node) = cur {
            if doc.kind(node) == NodeKind::Element
                && let Some(value) = xml_lang_of(&doc, node)
            {
                // The nearest xml:lang decides, match or not.
                let value = value.to_ascii_lowercase();
                is_lang = value == wanted.as_str()
                    || (value.starts_with(wanted.as_str())
                        && value.as_bytes().get(wanted.len()) == Some(&b'-'));
                break;
            }
            cur = doc.parent(node);
        }
        Ok(Value::Boolean(is_lang))
    }
}

/// Non-empty `xml:lang` value on this element, if any.
fn xml_lang_of(doc: &crate::tree::Document, element: NodeId) -> Option<String> {
    for &attr in doc.attributes(element) {
        let Some(name) = doc.name(attr) else { continue };
        if name.local == "lang" && name.is_xml_ns() {
            let value = doc.value(attr).unwrap_or_default();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
