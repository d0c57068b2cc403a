//! The execution context: per-evaluation mutable state threaded through
//! recursive expression evaluation.
//!
//! One context serves one evaluation session at a time; the source tree it
//! points at is read-only and may be shared by many contexts concurrently.
//! All collaborating services (ID resolver, prefix resolver, error sink,
//! owner handle) are injected through the builder — there are no process-wide
//! tables.

use std::any::Any;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::axis::AxisCursor;
use crate::error::{Error, Result};
use crate::model::QName;
use crate::nodeset::NodeSet;
use crate::tree::{Document, NodeId};
use crate::value::Value;

/// Resolves namespace prefixes for the expression currently evaluating.
/// Swapped (save-and-restore), not stacked.
pub trait PrefixResolver: Send + Sync {
    fn resolve_prefix(&self, prefix: &str) -> Option<String>;
}

/// ID-to-element lookup, owned by a DOM-helper collaborator outside this
/// core. "Not found" is an expected outcome, never an error.
pub trait IdResolver: Send + Sync {
    fn element_by_id(&self, token: &str, doc: &Document) -> Option<NodeId>;
}

/// What the error sink decided about a reported context-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Abort,
}

/// Receives context-level errors; the registered handler decides whether the
/// evaluation continues or aborts.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &Error) -> Disposition;
}

/// Default sink: every reported error is fatal.
#[derive(Debug, Default)]
pub struct AbortingSink;

impl ErrorSink for AbortingSink {
    fn report(&self, error: &Error) -> Disposition {
        tracing::debug!(%error, "context error reported");
        Disposition::Abort
    }
}

/// Scoped name→value bindings, one frame per template/function invocation,
/// looked up innermost-first.
#[derive(Debug, Default)]
pub struct VariableStack {
    frames: Vec<Vec<(QName, Value)>>,
}

impl VariableStack {
    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(!self.frames.is_empty(), "pop on empty variable stack");
        self.frames.pop();
    }

    pub fn bind(&mut self, name: QName, value: Value) {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        self.frames
            .last_mut()
            .expect("frame pushed above")
            .push((name, value));
    }

    /// Innermost binding for `name`, or `None` if unbound at every frame.
    pub fn lookup(&self, name: &QName) -> Option<&Value> {
        for frame in self.frames.iter().rev() {
            for (n, v) in frame.iter().rev() {
                if n == name {
                    return Some(v);
                }
            }
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn clear(&mut self) {
        self.frames.clear();
    }
}

/// Execution context for one evaluation session.
pub struct ExecutionContext {
    doc: Arc<Document>,
    context_node_lists: SmallVec<[NodeSet; 4]>,
    axis_cursors: SmallVec<[AxisCursor; 4]>,
    current_node: Option<NodeId>,
    /// 1-based position of the current node within the innermost candidate
    /// list, in axis order. Set only while predicates run.
    context_position: Option<usize>,
    namespace_context: Option<Arc<dyn PrefixResolver>>,
    variables: VariableStack,
    owner: Option<Arc<dyn Any + Send + Sync>>,
    sink: Arc<dyn ErrorSink>,
    id_resolver: Option<Arc<dyn IdResolver>>,
    /// Bindings re-applied by `reset()`.
    session_bindings: Vec<(QName, Value)>,
}

impl ExecutionContext {
    pub fn new(doc: Arc<Document>) -> Self {
        ExecutionContextBuilder::new(doc).build()
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    // ---- error reporting ------------------------------------------------

    /// Route an error through the sink. `Ok(())` when the handler chose to
    /// continue, otherwise the error propagates and aborts the evaluation.
    pub fn report(&self, error: Error) -> Result<()> {
        match self.sink.report(&error) {
            Disposition::Continue => Ok(()),
            Disposition::Abort => Err(error),
        }
    }

    // ---- context node list stack -----------------------------------------

    pub fn push_context_node_list(&mut self, list: NodeSet) {
        self.context_node_lists.push(list);
    }

    /// Pop the innermost context node list. Popping an empty stack is a
    /// context-misuse error routed through the sink.
    pub fn pop_context_node_list(&mut self) -> Result<()> {
        if self.context_node_lists.pop().is_none() {
            self.report(Error::context_misuse(
                "pop_context_node_list on an empty stack",
            ))?;
        }
        Ok(())
    }

    /// The innermost pushed node list, or `None` at the outermost evaluation
    /// (a normal condition, not an error).
    pub fn current_context_node_list(&self) -> Option<&NodeSet> {
        self.context_node_lists.last()
    }

    // ---- axis cursor stack ------------------------------------------------

    pub fn push_axis_cursor(&mut self, cursor: AxisCursor) {
        self.axis_cursors.push(cursor);
    }

    pub fn pop_axis_cursor(&mut self) -> Result<()> {
        if self.axis_cursors.pop().is_none() {
            self.report(Error::context_misuse("pop_axis_cursor on an empty stack"))?;
        }
        Ok(())
    }

    pub fn current_axis_cursor(&self) -> Option<&AxisCursor> {
        self.axis_cursors.last()
    }

    /// Advance the innermost axis cursor against the context's own tree.
    pub fn advance_axis_cursor(&mut self) -> Option<NodeId> {
        let doc = &self.doc;
        self.axis_cursors.last_mut()?.next(doc)
    }

    // ---- current node -----------------------------------------------------

    /// The node being evaluated right now, as opposed to the full context
    /// list.
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    pub fn set_current_node(&mut self, node: Option<NodeId>) {
        self.current_node = node;
    }

    /// The current node's 1-based position in the innermost candidate list,
    /// counted in axis order (nearest first on reverse axes). `None` outside
    /// predicate evaluation.
    pub fn context_position(&self) -> Option<usize> {
        self.context_position
    }

    pub fn set_context_position(&mut self, position: Option<usize>) {
        self.context_position = position;
    }

    // ---- namespace resolver -------------------------------------------------

    pub fn namespace_context(&self) -> Option<&Arc<dyn PrefixResolver>> {
        self.namespace_context.as_ref()
    }

    /// Swap in a resolver, returning the previous one so the caller can
    /// restore it around a sub-evaluation.
    pub fn set_namespace_context(
        &mut self,
        resolver: Option<Arc<dyn PrefixResolver>>,
    ) -> Option<Arc<dyn PrefixResolver>> {
        core::mem::replace(&mut self.namespace_context, resolver)
    }

    // ---- variables ----------------------------------------------------------

    pub fn variables(&mut self) -> &mut VariableStack {
        &mut self.variables
    }

    /// Innermost-first variable lookup. Unbound is absence, not an error.
    pub fn variable(&self, name: &QName) -> Option<Value> {
        self.variables.lookup(name).cloned()
    }

    // ---- services -------------------------------------------------------------

    /// The host evaluation/transform object, if one was attached.
    pub fn owner(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.owner.as_ref()
    }

    pub fn id_resolver(&self) -> Option<&Arc<dyn IdResolver>> {
        self.id_resolver.as_ref()
    }

    /// Clear evaluation state between independent runs. Injected services
    /// and session-level variable bindings survive.
    pub fn reset(&mut self) {
        self.context_node_lists.clear();
        self.axis_cursors.clear();
        self.current_node = None;
        self.context_position = None;
        self.variables.clear();
        if !self.session_bindings.is_empty() {
            self.variables.push_frame();
            for (name, value) in &self.session_bindings {
                self.variables.bind(name.clone(), value.clone());
            }
        }
    }
}

/// Builder for [`ExecutionContext`]; the only way to attach services.
pub struct ExecutionContextBuilder {
    doc: Arc<Document>,
    namespace_context: Option<Arc<dyn PrefixResolver>>,
    owner: Option<Arc<dyn Any + Send + Sync>>,
    sink: Arc<dyn ErrorSink>,
    id_resolver: Option<Arc<dyn IdResolver>>,
    bindings: Vec<(QName, Value)>,
}

impl ExecutionContextBuilder {
    pub fn new(doc: Arc<Document>) -> Self {
        Self {
            doc,
            namespace_context: None,
            owner: None,
            sink: Arc::new(AbortingSink),
            id_resolver: None,
            bindings: Vec::new(),
        }
    }

    pub fn with_namespace_context(mut self, resolver: Arc<dyn PrefixResolver>) -> Self {
        self.namespace_context = Some(resolver);
        self
    }

    pub fn with_owner(mut self, owner: Arc<dyn Any + Send + Sync>) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_id_resolver(mut self, resolver: Arc<dyn IdResolver>) -> Self {
        self.id_resolver = Some(resolver);
        self
    }

    /// Bind a session-level variable (outermost frame, survives `reset()`).
    pub fn with_variable(mut self, name: QName, value: impl Into<Value>) -> Self {
        self.bindings.push((name, value.into()));
        self
    }

    pub fn build(self) -> ExecutionContext {
        let mut ctx = ExecutionContext {
            doc: self.doc,
            context_node_lists: SmallVec::new(),
            axis_cursors: SmallVec::new(),
            current_node: None,
            context_position: None,
            namespace_context: self.namespace_context,
            variables: VariableStack::default(),
            owner: self.owner,
            sink: self.sink,
            id_resolver: self.id_resolver,
            session_bindings: self.bindings,
        };
        ctx.reset();
        ctx
    }
}
