//! Boundaries with the collaborators the engine does not own: the source
//! parser, the snippet compiler, the classpath and the diagnostic stream.

use std::path::Path;
use std::sync::Arc;

use crate::domain::ast::CompilationUnit;
use crate::domain::descriptor::ClassDescriptor;
use crate::domain::errors::{ActionError, ParseError, ScriptError};
use crate::domain::node_kind::{NodeKind, NodeRef};
use crate::domain::traverser::ActionContext;

pub mod diagnostics;

pub use diagnostics::{CollectingDiagnostics, ConsoleDiagnostics};

/// Reads and decodes one source file.
pub trait SourceLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<str>, ParseError>;
}

/// Turns decoded source text into a compilation unit. Shared across the
/// parse-phase workers.
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &str, source: Arc<str>) -> Result<CompilationUnit, ParseError>;
}

/// Behavior bound to a node kind. Invoked once per matching node, before
/// the node's children are visited. Shared with the traversal thread.
pub trait Action: Send + Sync {
    fn invoke(&self, node: NodeRef<'_>, cx: &mut ActionContext<'_>) -> Result<(), ActionError>;
}

impl<F> Action for F
where
    F: Fn(NodeRef<'_>, &mut ActionContext<'_>) -> Result<(), ActionError> + Send + Sync,
{
    fn invoke(&self, node: NodeRef<'_>, cx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        self(node, cx)
    }
}

/// Compiles snippet text into an action whose single parameter is a node
/// of `kind` (or of any kind generalizing to it).
pub trait ScriptCompiler {
    fn compile(&self, source: &str, kind: NodeKind) -> Result<Box<dyn Action>, ScriptError>;
}

/// Leaf of the class repository: answers for types that are not declared
/// by the units of this run. Treated as a pure, idempotent oracle.
pub trait ClassResolver: Send + Sync {
    fn resolve(&self, binary_name: &str) -> Option<ClassDescriptor>;
}

/// Resolver that knows no classes.
pub struct EmptyClasspath;

impl ClassResolver for EmptyClasspath {
    fn resolve(&self, _binary_name: &str) -> Option<ClassDescriptor> {
        None
    }
}

/// Receives non-fatal diagnostics. Never affects control flow.
pub trait DiagnosticSink {
    fn report(&mut self, message: &str, location: Option<&str>);
}
