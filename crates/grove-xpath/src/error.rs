//! Error kinds for tree construction and expression evaluation.
//!
//! Lookup misses (unresolved ID token, missing `xml:lang`, unbound variable)
//! are deliberately not represented here; they are normal control-flow
//! outcomes carried as explicit absences in return types.

use compact_str::CompactString;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Tree-shape violations: a second document element, a cross-document
    /// order comparison, an unranked node where a ranked one is required.
    /// Fatal to the current construction or comparison call.
    #[error("hierarchy request error: {0}")]
    Structural(CompactString),

    /// Execution-context misuse: unbalanced stack pop, a required
    /// collaborator missing. Routed through the context's error sink, which
    /// decides between continue and abort (abort by default).
    #[error("execution context misuse: {0}")]
    ContextMisuse(CompactString),

    /// A function (or operator) received an argument of a kind it cannot
    /// coerce, tied to the call site for precise diagnostics.
    #[error("{function}() argument {position}: expected {expected}, got {actual}")]
    ArgumentType {
        function: CompactString,
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown function: {0}()")]
    UnknownFunction(CompactString),

    /// General evaluation failure (unbound variable reference, relative path
    /// with no current node, ...).
    #[error("evaluation error: {0}")]
    Eval(CompactString),
}

impl Error {
    pub fn structural(msg: impl Into<CompactString>) -> Self {
        Error::Structural(msg.into())
    }

    pub fn context_misuse(msg: impl Into<CompactString>) -> Self {
        Error::ContextMisuse(msg.into())
    }

    pub fn eval(msg: impl Into<CompactString>) -> Self {
        Error::Eval(msg.into())
    }

    pub fn argument_type(
        function: impl Into<CompactString>,
        position: usize,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Error::ArgumentType {
            function: function.into(),
            position,
            expected,
            actual,
        }
    }
}
