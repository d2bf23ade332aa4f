//! Embedded snippet language.
//!
//! A snippet is a short Java-flavoured statement list run once per
//! matching node, with the node bound to `_`:
//!
//! ```text
//! if (_.methodName == "foo") println(_.location());
//! for (arg : _.arguments) printf("%s%n", arg);
//! ```
//!
//! Everything that can be checked without a node (syntax, names, arities,
//! `_.field` against the bound kind, literal regexes) is checked by
//! [`ScriptEngine::compile`].

mod format;
mod interpreter;
mod lexer;
mod parser;

use crate::domain::errors::{ActionError, ScriptError};
use crate::domain::node_kind::{NodeKind, NodeRef};
use crate::domain::traverser::ActionContext;
use crate::ports::{Action, ScriptCompiler};

use interpreter::{Interpreter, Value};
use parser::Program;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptEngine;

impl ScriptCompiler for ScriptEngine {
    fn compile(&self, source: &str, kind: NodeKind) -> Result<Box<dyn Action>, ScriptError> {
        let program = parser::parse_program(source, kind)?;
        tracing::trace!("compiled {} statement(s) for {}", program.body.len(), kind);
        Ok(Box::new(Script { program }))
    }
}

/// A compiled snippet.
pub struct Script {
    program: Program,
}

impl Action for Script {
    fn invoke(&self, node: NodeRef<'_>, cx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        let value = Value::from(node.to_value());
        Interpreter::new(cx, value, node.span(), self.program.slots).run(&self.program.body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::registry::{ActionRegistry, ActionSpec};
    use crate::domain::repository::ClassRepository;
    use crate::domain::traverser::Traverser;
    use crate::infrastructure::java_parser::JavaParser;
    use crate::ports::{EmptyClasspath, SourceParser};

    const SOURCE: &str = "package p;\n\
        class A extends B {\n\
        \x20 int count = 3;\n\
        \x20 void run() { foo(1, \"x\"); bar(); this.foo(2, \"y\"); }\n\
        }\n\
        class B {}\n";

    fn run(specs: &[(&str, &str)]) -> Result<String, ActionError> {
        let unit = JavaParser.parse("p/A.java", Arc::from(SOURCE)).unwrap();
        let specs: Vec<ActionSpec> = specs.iter().map(|(k, s)| ActionSpec::new(*k, *s)).collect();
        let registry = ActionRegistry::build(&specs, &ScriptEngine).unwrap();
        let units = vec![unit];
        let classes = ClassRepository::new(&units, Box::new(EmptyClasspath));
        let mut out = Vec::new();
        Traverser::new(&registry, &units[0], &classes, &mut out).run()?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prints_locations_of_matching_invocations() {
        let out = run(&[(
            "methodInvocation",
            r#"if (_.methodName == "foo") println(_.location() + " " + _.arguments.size())"#,
        )])
        .unwrap();
        assert_eq!(out, "p/A.java:4:16 2\np/A.java:4:36 2\n");
    }

    #[test]
    fn test_printing_a_node_prints_its_source_text() {
        let out = run(&[("fieldDeclaration", "for (d : _.variableDeclarators) println(d.initializer)")]).unwrap();
        assert_eq!(out, "3\n");
        let out = run(&[("stringLiteral", "print(_); print(' ')")]).unwrap();
        assert_eq!(out, "\"x\" \"y\" ");
    }

    #[test]
    fn test_generalized_kinds_and_printf() {
        let out = run(&[("literal", r#"printf("%-15s|%s%n", _.kind(), _.value)"#)]).unwrap();
        assert_eq!(
            out,
            "integerLiteral |3\n\
             integerLiteral |1\n\
             stringLiteral  |\"x\"\n\
             integerLiteral |2\n\
             stringLiteral  |\"y\"\n"
        );
    }

    #[test]
    fn test_resolve_sees_units_of_the_run() {
        let out = run(&[(
            "packageMemberClassDeclaration",
            r#"var d = resolveType(_.name); println(d.name + " < " + d.superclass); var m = resolve("java.lang.String"); println(m)"#,
        )])
        .unwrap();
        assert_eq!(out, "p.A < B\nnull\np.B < java.lang.Object\nnull\n");
    }

    #[test]
    fn test_return_and_locals() {
        let out = run(&[(
            "methodInvocation",
            r#"var n = 0; for (a : _.arguments) { if (a.kind() == "stringLiteral") return; n = n + 1 } println(_.methodName + n)"#,
        )])
        .unwrap();
        assert_eq!(out, "bar0\n");
    }

    #[test]
    fn test_runtime_faults_carry_node_location() {
        let err = run(&[("methodInvocation", "println(_.target.lhs)")]).unwrap_err();
        match err {
            ActionError::Fault { location, message } => {
                assert_eq!(location, "p/A.java:4:16");
                assert!(message.contains("cannot read `lhs` of null"), "{}", message);
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = run(&[("fieldDeclaration", "println(1 / (_.variableDeclarators.size() - 1))")]).unwrap_err();
        assert!(err.to_string().contains("division by zero"), "{}", err);

        let err = run(&[("fieldDeclaration", r#"fail("no fields allowed: " + _.type)"#)]).unwrap_err();
        assert_eq!(err.to_string(), "p/A.java:3:3: no fields allowed: int");
    }

    #[test]
    fn test_oversized_printf_width_is_a_fault() {
        let err = run(&[("integerLiteral", r#"printf("%99999999999999999999d", 1)"#)]).unwrap_err();
        match err {
            ActionError::Fault { location, message } => {
                assert_eq!(location, "p/A.java:3:15");
                assert_eq!(message, "format width too large");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_compile_errors_name_the_kind() {
        let err = ScriptEngine.compile("println(_.methodName)", NodeKind::FieldDeclaration).err().unwrap();
        assert!(err.message.contains("fieldDeclaration has no field `methodName`"), "{}", err);
        assert!(ScriptEngine.compile("if (", NodeKind::Block).is_err());
    }

    #[test]
    fn test_string_methods() {
        let out = run(&[(
            "methodDeclarator",
            r#"var n = _.name; println(n.toUpperCase() + n.length() + n.startsWith("r") + n.matches("r.n") + n.contains("x"))"#,
        )])
        .unwrap();
        assert_eq!(out, "RUN3truetruefalse\n");
    }
}
