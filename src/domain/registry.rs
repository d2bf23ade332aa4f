//! Action registry: node kind -> ordered list of compiled actions.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::errors::{ActionError, ConfigError};
use crate::domain::node_kind::{NodeKind, NodeRef};
use crate::domain::traverser::ActionContext;
use crate::ports::{Action, ScriptCompiler};

/// One caller-supplied `(kind, script)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionSpec {
    pub kind: String,
    pub script: String,
}

impl ActionSpec {
    pub fn new(kind: impl Into<String>, script: impl Into<String>) -> Self {
        ActionSpec { kind: kind.into(), script: script.into() }
    }
}

/// Built once before the run; read-only afterwards. Several actions may
/// be bound to the same kind and run in the order they were bound.
#[derive(Default)]
pub struct ActionRegistry {
    bindings: HashMap<NodeKind, Vec<Box<dyn Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every spec's kind and compiles its script. The first
    /// unknown kind or uncompilable script fails the whole build.
    pub fn build(specs: &[ActionSpec], compiler: &dyn ScriptCompiler) -> Result<Self, ConfigError> {
        let mut registry = ActionRegistry::new();
        for spec in specs {
            let kind = NodeKind::from_name(&spec.kind)
                .ok_or_else(|| ConfigError::UnknownNodeKind(spec.kind.clone()))?;
            let action = compiler.compile(&spec.script, kind).map_err(|source| ConfigError::Script {
                kind,
                script: spec.script.clone(),
                source,
            })?;
            tracing::debug!("bound action #{} to {}", registry.len() + 1, kind);
            registry.bind(kind, action);
        }
        Ok(registry)
    }

    pub fn bind(&mut self, kind: NodeKind, action: Box<dyn Action>) {
        self.bindings.entry(kind).or_default().push(action);
    }

    /// Binds a native closure.
    pub fn bind_fn<F>(&mut self, kind: NodeKind, f: F)
    where
        F: Fn(NodeRef<'_>, &mut ActionContext<'_>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.bind(kind, Box::new(f));
    }

    /// Actions bound to exactly `kind`, in binding order.
    pub fn actions(&self, kind: NodeKind) -> &[Box<dyn Action>] {
        self.bindings.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Kinds with at least one action, in table order.
    pub fn bound_kinds(&self) -> Vec<NodeKind> {
        let mut kinds: Vec<NodeKind> = self.bindings.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ScriptError;

    /// Accepts any script except one containing `!!`.
    struct FakeCompiler;

    impl ScriptCompiler for FakeCompiler {
        fn compile(&self, source: &str, _kind: NodeKind) -> Result<Box<dyn Action>, ScriptError> {
            if source.contains("!!") {
                return Err(ScriptError::new(1, source.find("!!").unwrap() + 1, "unexpected `!`"));
            }
            Ok(Box::new(noop))
        }
    }

    fn noop(_: NodeRef<'_>, _: &mut ActionContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }

    #[test]
    fn test_build_accumulates_per_kind() {
        let specs = vec![
            ActionSpec::new("methodInvocation", "a"),
            ActionSpec::new("-fieldDeclaration", "b"),
            ActionSpec::new("method-invocation", "c"),
        ];
        let registry = ActionRegistry::build(&specs, &FakeCompiler).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.actions(NodeKind::MethodInvocation).len(), 2);
        assert_eq!(registry.actions(NodeKind::FieldDeclaration).len(), 1);
        assert!(registry.actions(NodeKind::Block).is_empty());
        assert_eq!(
            registry.bound_kinds(),
            vec![NodeKind::FieldDeclaration, NodeKind::MethodInvocation]
        );
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let specs = vec![ActionSpec::new("methodInvocationz", "a")];
        match ActionRegistry::build(&specs, &FakeCompiler) {
            Err(ConfigError::UnknownNodeKind(name)) => assert_eq!(name, "methodInvocationz"),
            other => panic!("expected UnknownNodeKind, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_script_error_carries_kind_and_text() {
        let specs = vec![
            ActionSpec::new("block", "fine"),
            ActionSpec::new("fieldDeclaration", "x !! y"),
        ];
        let err = ActionRegistry::build(&specs, &FakeCompiler).err().expect("must fail");
        match &err {
            ConfigError::Script { kind, script, source } => {
                assert_eq!(*kind, NodeKind::FieldDeclaration);
                assert_eq!(script, "x !! y");
                assert_eq!(source.column, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
        let text = err.to_string();
        assert!(text.contains("fieldDeclaration"), "{text}");
        assert!(text.contains("x !! y"), "{text}");
    }
}
