// End-to-end runs: library driver and the `jgrep` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jgrep::application::SearchUsecase;
use jgrep::domain::errors::{ActionError, ConfigError, JgrepError, ParseError};
use jgrep::domain::registry::ActionSpec;
use jgrep::infrastructure::{Encoding, JavaParser, ScriptEngine};
use jgrep::ports::{CollectingDiagnostics, EmptyClasspath, SourceLoader};

/// Counts loads so tests can tell whether any file was read.
struct CountingLoader {
    loads: AtomicUsize,
}

impl SourceLoader for CountingLoader {
    fn load(&self, path: &Path) -> Result<Arc<str>, ParseError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Encoding::Utf8.load(path)
    }
}

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

fn search(
    loader: &CountingLoader,
    files: &[PathBuf],
    actions: &[ActionSpec],
) -> (Result<usize, JgrepError>, String) {
    let usecase = SearchUsecase {
        loader,
        parser: &JavaParser,
        compiler: &ScriptEngine,
        classpath: Box::new(EmptyClasspath),
        check_references: false,
        jobs: 2,
    };
    let mut out = Vec::new();
    let result = usecase
        .run(files, actions, &mut out, &mut CollectingDiagnostics::default())
        .map(|summary| summary.units);
    (result, String::from_utf8(out).unwrap())
}

fn loader() -> CountingLoader {
    CountingLoader { loads: AtomicUsize::new(0) }
}

const CALLS: &str = "package p;\n\
class Calls {\n\
  void run() {\n\
    foo(1);\n\
    bar(foo(2));\n\
    this.foo(3);\n\
  }\n\
}\n";

#[test]
fn prints_one_line_per_matching_invocation_in_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "p/Calls.java", CALLS);
    let actions = [ActionSpec::new(
        "methodInvocation",
        r#"if (_.methodName == "foo") println(_.location())"#,
    )];

    let (result, out) = search(&loader(), &[file.clone()], &actions);
    assert_eq!(result.unwrap(), 1);
    let path = file.display().to_string();
    assert_eq!(
        out,
        format!("{p}:4:5\n{p}:5:9\n{p}:6:5\n", p = path),
    );
}

#[test]
fn a_broken_script_aborts_before_any_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write(dir.path(), "A.java", "class A { int x; }"),
        write(dir.path(), "B.java", "class B { this is not java }"),
    ];
    let actions = [
        ActionSpec::new("compilationUnit", "println(\"visited\")"),
        ActionSpec::new("field-declaration", "println(_.type"),
    ];

    let loader = loader();
    let (result, out) = search(&loader, &files, &actions);
    let err = result.unwrap_err();
    assert!(
        matches!(&err, JgrepError::Config(ConfigError::Script { script, .. }) if script == "println(_.type"),
        "{err}"
    );
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    assert!(out.is_empty());

    let (result, _) = search(&loader, &files, &[ActionSpec::new("fieldDecl", "print(1)")]);
    assert!(matches!(result, Err(JgrepError::Config(ConfigError::UnknownNodeKind(_)))));
}

#[test]
fn a_failing_action_stops_the_whole_run() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (1..=3)
        .map(|i| write(dir.path(), &format!("U{}.java", i), &format!("class U{} {{ }}", i)))
        .collect();
    let actions = [ActionSpec::new(
        "packageMemberClassDeclaration",
        r#"print(_.name + " "); if (_.name == "U2") fail("refusing " + _.name)"#,
    )];

    let (result, out) = search(&loader(), &files, &actions);
    match result.unwrap_err() {
        JgrepError::Action(ActionError::Fault { location, message }) => {
            assert_eq!(location, format!("{}:1:1", files[1].display()));
            assert_eq!(message, "refusing U2");
        }
        other => panic!("unexpected {other}"),
    }
    assert_eq!(out, "U1 U2 ");
}

fn concatenation(class: &str, terms: usize) -> String {
    format!("class {} {{\n  String s = {};\n}}\n", class, vec!["\"a\""; terms].join(" + "))
}

#[test]
fn deeply_nested_sources_are_searched_or_rejected_without_crashing() {
    let dir = tempfile::tempdir().unwrap();
    let long = write(dir.path(), "Long.java", &concatenation("Long", 900));
    let actions = [ActionSpec::new("fieldDeclaration", "println(_.variableDeclarators[0].name)")];

    let (result, out) = search(&loader(), &[long.clone()], &actions);
    assert_eq!(result.unwrap(), 1);
    assert_eq!(out, "s\n");

    let generated = write(dir.path(), "Generated.java", &concatenation("Generated", 5000));
    let (result, out) = search(&loader(), &[long, generated.clone()], &actions);
    match result.unwrap_err() {
        JgrepError::Parse(ParseError::Unsupported { path, construct, .. }) => {
            assert_eq!(path, generated.display().to_string());
            assert!(construct.contains("nested deeper than"), "{construct}");
        }
        other => panic!("unexpected {other}"),
    }
    assert!(out.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Binary
// ═══════════════════════════════════════════════════════════════════════

fn jgrep() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jgrep"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn cli_runs_actions_over_a_root() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "src/p/Calls.java", CALLS);
    write(dir.path(), "src/p/CallsTest.java", "package p; class CallsTest { void t() { foo(); } }");

    let output = jgrep()
        .arg(dir.path().join("src"))
        .args(["--files", "*.java-*Test.java"])
        .args(["-a", "methodInvocation", r#"if (_.methodName == "foo") println(_.location())"#])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "{stdout}");
    assert_eq!(lines[0], format!("{}:4:5", file.display()));
}

#[test]
fn cli_reads_actions_from_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/p/Calls.java", CALLS);
    let config = write(
        dir.path(),
        "jgrep.toml",
        "roots = [\"src\"]\n\n[[action]]\nkind = \"integerLiteral\"\nscript = 'print(_.value)'\n",
    );

    let output = jgrep().arg("--config").arg(&config).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "123");
}

#[test]
fn cli_fails_with_one_line_on_fatal_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.java", "class A { void m() { m(); } }");

    let output = jgrep()
        .arg(dir.path())
        .args(["-a", "methodCall", "println(1)"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("jgrep: unknown node kind \"methodCall\""), "{stderr}");
    assert_eq!(stderr.lines().count(), 1);

    let output = jgrep()
        .arg(dir.path())
        .args(["-a", "methodInvocation", "fail(\"no calls\")"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("A.java:1:22: no calls"), "{stderr}");
}

#[test]
fn cli_lists_kinds() {
    let output = jgrep().arg("--list-kinds").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.lines().any(|l| l.starts_with(" methodInvocation") && l.contains("methodName")));
    assert!(stdout.lines().any(|l| l.starts_with("*literal")));
}

#[test]
fn cli_rejects_a_deeply_nested_file_with_one_line() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Generated.java", &concatenation("Generated", 5000));

    let output = jgrep().arg(dir.path()).args(["-a", "stringLiteral", "print(1)"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert!(stderr.contains("Generated.java:2:"), "{stderr}");
    assert!(stderr.contains("nested deeper than"), "{stderr}");
    assert!(output.stdout.is_empty());
}
