//! The two-phase search run: parse every file, then resolve and traverse
//! against the frozen unit list.

use std::io::Write;
use std::path::PathBuf;

use crate::domain::ast::{CompilationUnit, ImportDeclaration, MemberDeclaration, TypeDeclaration};
use crate::domain::errors::{ActionError, JgrepError, ParseError};
use crate::domain::registry::{ActionRegistry, ActionSpec};
use crate::domain::repository::{ClassRepository, ResolverStats, RUNTIME_PACKAGE_PREFIX};
use crate::domain::traverser::Traverser;
use crate::infrastructure::concurrency;
use crate::ports::{ClassResolver, DiagnosticSink, ScriptCompiler, SourceLoader, SourceParser};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub nodes_visited: usize,
    pub actions_invoked: usize,
    pub resolver: ResolverStats,
}

pub struct SearchUsecase<'a> {
    pub loader: &'a dyn SourceLoader,
    pub parser: &'a dyn SourceParser,
    pub compiler: &'a dyn ScriptCompiler,
    pub classpath: Box<dyn ClassResolver>,
    pub check_references: bool,
    /// Parse-phase workers; 0 picks one per core, 1 parses on this thread.
    pub jobs: usize,
}

impl<'a> SearchUsecase<'a> {
    /// Compiles `actions` before any file is read, then searches `files`.
    pub fn run(
        self,
        files: &[PathBuf],
        actions: &[ActionSpec],
        out: &mut (dyn Write + Send),
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<RunSummary, JgrepError> {
        let registry = ActionRegistry::build(actions, self.compiler)?;
        tracing::info!("{} action(s) bound to {} kind(s)", registry.len(), registry.bound_kinds().len());
        self.run_with_registry(&registry, files, out, diagnostics)
    }

    pub fn run_with_registry(
        self,
        registry: &ActionRegistry,
        files: &[PathBuf],
        out: &mut (dyn Write + Send),
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<RunSummary, JgrepError> {
        let units = self.parse_all(files)?;
        if units.is_empty() {
            diagnostics.report("no source files found", None);
        }

        let classes = ClassRepository::new(&units, self.classpath);
        if self.check_references {
            check_references(&classes, diagnostics);
        }

        let mut summary = RunSummary { units: units.len(), ..RunSummary::default() };
        let traversal = concurrency::with_worker_stack("jgrep-traverse", || -> Result<(), ActionError> {
            for unit in &units {
                let stats = Traverser::new(registry, unit, &classes, &mut *out).run()?;
                tracing::trace!("{}: {} nodes", unit.path, stats.nodes_visited);
                summary.nodes_visited += stats.nodes_visited;
                summary.actions_invoked += stats.actions_invoked;
            }
            out.flush()?;
            Ok(())
        });
        traversal.map_err(ActionError::from)??;

        summary.resolver = classes.stats();
        tracing::info!(
            "searched {} unit(s): {} nodes, {} action call(s)",
            summary.units,
            summary.nodes_visited,
            summary.actions_invoked
        );
        Ok(summary)
    }

    fn parse_all(&self, files: &[PathBuf]) -> Result<Vec<CompilationUnit>, ParseError> {
        let (loader, parser) = (self.loader, self.parser);
        let parse = |path: &PathBuf| -> Result<CompilationUnit, ParseError> {
            let source = loader.load(path)?;
            parser.parse(&path.display().to_string(), source)
        };

        let units = if self.jobs == 1 {
            concurrency::with_worker_stack("jgrep-parse", || concurrency::map_in_order(None, files, parse))
                .map_err(|e| ParseError::Language(e.to_string()))??
        } else {
            let pool =
                concurrency::build_pool(self.jobs).map_err(|e| ParseError::Language(format!("{:#}", e)))?;
            concurrency::map_in_order(Some(&pool), files, parse)?
        };
        tracing::info!("parsed {} file(s)", units.len());
        Ok(units)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Reference check
// ═══════════════════════════════════════════════════════════════════════

/// Reports single-type imports and declared super types that resolve
/// nowhere. Runtime-namespace names are never reported.
pub fn check_references(classes: &ClassRepository<'_>, diagnostics: &mut dyn DiagnosticSink) {
    let mut missing = 0;
    for unit in classes.units() {
        for import in &unit.imports {
            if let ImportDeclaration::SingleType(i) = import {
                if is_runtime_name(&i.name) || classes.resolve_in_unit(unit, &i.name).is_some() {
                    continue;
                }
                missing += 1;
                diagnostics.report(&format!("cannot resolve import {}", i.name), Some(&unit.location(&i.span)));
            }
        }

        let mut pending: Vec<&TypeDeclaration> = unit.types.iter().rev().collect();
        while let Some(decl) = pending.pop() {
            for ty in decl.super_types() {
                let Some(name) = ty.reference_name() else { continue };
                if is_runtime_name(name) || classes.resolve_in_unit(unit, name).is_some() {
                    continue;
                }
                missing += 1;
                diagnostics.report(
                    &format!("cannot resolve super type {} of {}", name, decl.name()),
                    Some(&unit.location(&ty.span())),
                );
            }
            pending.extend(decl.members().iter().rev().filter_map(|m| match m {
                MemberDeclaration::Type(t) => Some(t),
                _ => None,
            }));
        }
    }
    tracing::debug!("reference check: {} unresolved", missing);
}

fn is_runtime_name(name: &str) -> bool {
    name.starts_with(RUNTIME_PACKAGE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Encoding, JavaParser, ScriptEngine};
    use crate::ports::{CollectingDiagnostics, EmptyClasspath};

    fn write(dir: &std::path::Path, rel: &str, text: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    fn usecase(jobs: usize, check_references: bool) -> SearchUsecase<'static> {
        SearchUsecase {
            loader: &Encoding::Utf8,
            parser: &JavaParser,
            compiler: &ScriptEngine,
            classpath: Box::new(EmptyClasspath),
            check_references,
            jobs,
        }
    }

    #[test]
    fn test_units_are_traversed_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..6)
            .map(|i| write(dir.path(), &format!("p/C{}.java", i), &format!("package p; class C{} {{}}", i)))
            .collect();
        let actions = [ActionSpec::new("namedClassDeclaration", "print(_.name + \" \")")];
        let mut out = Vec::new();
        let mut diags = CollectingDiagnostics::default();
        let summary = usecase(3, false).run(&files, &actions, &mut out, &mut diags).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "C0 C1 C2 C3 C4 C5 ");
        assert_eq!(summary.units, 6);
        assert_eq!(summary.actions_invoked, 6);
        assert!(diags.messages.is_empty());
    }

    #[test]
    fn test_parse_failure_aborts_before_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "A.java", "class A {}"),
            write(dir.path(), "B.java", "class B { int }"),
        ];
        let actions = [ActionSpec::new("compilationUnit", "println(\"seen\")")];
        let mut out = Vec::new();
        let err = usecase(1, false)
            .run(&files, &actions, &mut out, &mut CollectingDiagnostics::default())
            .unwrap_err();
        assert!(matches!(err, JgrepError::Parse(ParseError::Syntax { .. })), "{err}");
        assert!(out.is_empty());
    }

    #[test]
    fn test_reference_check_reports_unresolved_names() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(
                dir.path(),
                "p/A.java",
                "package p;\nimport q.Missing;\nimport java.util.List;\nimport p.B;\nclass A extends B implements Gone, Runnable {\n  static class In extends Nowhere {}\n}\n",
            ),
            write(dir.path(), "p/B.java", "package p; class B {}"),
        ];
        let a = files[0].display().to_string();
        let mut diags = CollectingDiagnostics::default();
        usecase(1, true).run(&files, &[], &mut Vec::new(), &mut diags).unwrap();
        assert_eq!(
            diags.messages,
            vec![
                format!("{}:2:1: cannot resolve import q.Missing", a),
                format!("{}:5:30: cannot resolve super type Gone of A", a),
                format!("{}:5:36: cannot resolve super type Runnable of A", a),
                format!("{}:6:27: cannot resolve super type Nowhere of In", a),
            ]
        );
    }

    #[test]
    fn test_empty_file_list_is_reported() {
        let mut diags = CollectingDiagnostics::default();
        let summary = usecase(0, false).run(&[], &[], &mut Vec::new(), &mut diags).unwrap();
        assert_eq!(summary.units, 0);
        assert_eq!(diags.messages, vec!["no source files found"]);
    }
}
