// Traversal engine behavior over real parsed sources.

use std::io::Write;
use std::sync::Arc;

use jgrep::domain::ast::CompilationUnit;
use jgrep::domain::node_kind::NodeKind;
use jgrep::domain::registry::ActionRegistry;
use jgrep::domain::repository::ClassRepository;
use jgrep::domain::traverser::{TraversalStats, Traverser};
use jgrep::infrastructure::JavaParser;
use jgrep::ports::{EmptyClasspath, SourceParser};

const RICH: &str = "package p;\n\
import java.util.List;\n\
import static java.lang.Math.*;\n\
enum E implements Runnable { A(1), B(2) { }; E(int v) { this(); } E() { } public void run() {} }\n\
record R(int x, String... rest) {}\n\
@interface Ann { int value() default 0; String[] names() default {\"a\"}; }\n\
@Deprecated\n\
class G<T extends Comparable<? super T>> extends java.util.ArrayList<T> {\n\
  static { }\n\
  int[] a = new int[] {1, 2}, b[];\n\
  G(T t) { super(); }\n\
  @SuppressWarnings(value = {\"x\", \"y\"})\n\
  int m(List<String> xs, Object o) throws Exception {\n\
    outer: for (int i = 0, j = 1; i < 10; i++, j--) { continue outer; }\n\
    for (final String s : xs) { ; }\n\
    try (java.io.Reader r = open(); this.reader) { } catch (RuntimeException | Error e) { } finally { }\n\
    switch (o.hashCode()) { case 1: case 2: break; default: }\n\
    int k = switch (xs.size()) { case 0 -> 1; default -> { yield 2; } };\n\
    Runnable f = () -> System.gc();\n\
    java.util.function.Function<String, Integer> g = Integer::parseInt;\n\
    Object anon = new Object() { };\n\
    if (o instanceof String str && !str.isEmpty()) { }\n\
    synchronized (this) { assert k > 0 : \"k\"; }\n\
    do { k -= 1; } while (k > 0);\n\
    char c = 'c'; double d = 1.5; Object n = null; boolean t = true;\n\
    return (int) 1L + xs.size() > 0 ? k : -k;\n\
  }\n\
}\n";

const PLAIN: &str = "package p;\n\
class A extends B {\n\
  int count = 3;\n\
  String name;\n\
  int run(int n) {\n\
    int total = 0;\n\
    for (int i = 0; i < n; i++) { total = total + values[i] * 2; }\n\
    while (total > 10) { total -= 1; }\n\
    if (total == 0) { return -1; } else { foo(total, \"x\"); }\n\
    this.name = String.valueOf(total);\n\
    return total;\n\
  }\n\
}\n";

fn parse(source: &str) -> Vec<CompilationUnit> {
    vec![JavaParser.parse("p/A.java", Arc::from(source)).unwrap()]
}

fn traverse(registry: &ActionRegistry, units: &[CompilationUnit]) -> (String, TraversalStats) {
    let classes = ClassRepository::new(units, Box::new(EmptyClasspath));
    let mut out = Vec::new();
    let stats = Traverser::new(registry, &units[0], &classes, &mut out).run().unwrap();
    (String::from_utf8(out).unwrap(), stats)
}

/// Records `kind start end` for every node.
fn recording_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.bind_fn(NodeKind::CompilationUnit, |node, cx| {
        let span = node.span();
        writeln!(cx.out, "{} {} {}", node.kind(), span.start, span.end)?;
        Ok(())
    });
    registry.bind_fn(NodeKind::Located, |node, cx| {
        let span = node.span();
        writeln!(cx.out, "{} {} {}", node.kind(), span.start, span.end)?;
        Ok(())
    });
    registry
}

fn count_nodes(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Object(map) => {
            let own = usize::from(map.contains_key("kind"));
            own + map.values().map(count_nodes).sum::<usize>()
        }
        serde_json::Value::Array(items) => items.iter().map(count_nodes).sum(),
        _ => 0,
    }
}

#[test]
fn every_node_is_visited_exactly_once() {
    for source in [RICH, PLAIN] {
        let units = parse(source);
        let expected = count_nodes(&serde_json::to_value(&units[0]).unwrap());

        let (out, stats) = traverse(&ActionRegistry::new(), &units);
        assert!(out.is_empty());
        assert_eq!(stats.nodes_visited, expected);
        assert_eq!(stats.actions_invoked, 0);

        // Every node fires either compilationUnit or located, never both.
        let (out, stats) = traverse(&recording_registry(), &units);
        assert_eq!(out.lines().count(), expected);
        assert_eq!(stats.actions_invoked, expected);
    }
}

#[test]
fn parents_fire_before_their_children() {
    let units = parse(PLAIN);
    let (out, _) = traverse(&recording_registry(), &units);
    let events: Vec<(String, usize, usize)> = out
        .lines()
        .map(|line| {
            let mut parts = line.split(' ');
            let kind = parts.next().unwrap().to_string();
            let start = parts.next().unwrap().parse().unwrap();
            let end = parts.next().unwrap().parse().unwrap();
            (kind, start, end)
        })
        .collect();

    assert_eq!(events[0].0, "compilationUnit");
    for (i, (kind, start, end)) in events.iter().enumerate().skip(1) {
        let has_enclosing_predecessor = events[..i].iter().any(|(_, s, e)| s <= start && end <= e);
        assert!(has_enclosing_predecessor, "{} at {}..{} fired before its parent", kind, start, end);
    }

    let kinds: Vec<&str> = events.iter().map(|(k, _, _)| k.as_str()).collect();
    let class = kinds.iter().position(|k| *k == "packageMemberClassDeclaration").unwrap();
    let field = kinds.iter().position(|k| *k == "fieldDeclaration").unwrap();
    let method = kinds.iter().position(|k| *k == "methodDeclarator").unwrap();
    let first_for = kinds.iter().position(|k| *k == "forStatement").unwrap();
    assert!(class < field && field < method && method < first_for);
}

#[test]
fn a_no_op_action_does_not_change_descent() {
    let units = parse(PLAIN);
    let (baseline, baseline_stats) = traverse(&recording_registry(), &units);

    let mut registry = recording_registry();
    registry.bind_fn(NodeKind::MethodInvocation, |_, _| Ok(()));
    registry.bind_fn(NodeKind::Statement, |_, _| Ok(()));
    let (out, stats) = traverse(&registry, &units);

    assert_eq!(out, baseline);
    assert_eq!(stats.nodes_visited, baseline_stats.nodes_visited);
    assert!(stats.actions_invoked > baseline_stats.actions_invoked);
}

#[test]
fn actions_run_in_registration_order_concrete_kind_first() {
    let units = parse(PLAIN);
    let mut registry = ActionRegistry::new();
    registry.bind_fn(NodeKind::Literal, |node, cx| {
        write!(cx.out, "literal:{} ", cx.text(&node.span()))?;
        Ok(())
    });
    registry.bind_fn(NodeKind::IntegerLiteral, |node, cx| {
        write!(cx.out, "a1:{} ", cx.text(&node.span()))?;
        Ok(())
    });
    registry.bind_fn(NodeKind::IntegerLiteral, |node, cx| {
        write!(cx.out, "a2:{} ", cx.text(&node.span()))?;
        Ok(())
    });
    let (out, _) = traverse(&registry, &units);

    assert!(out.starts_with("a1:3 a2:3 literal:3 a1:0 a2:0 literal:0 "), "{}", out);
    assert!(out.contains("literal:\"x\" "), "{}", out);
    let a1 = out.matches("a1:").count();
    assert_eq!(a1, out.matches("a2:").count());
    assert_eq!(a1, 8);
}

#[test]
fn action_failure_stops_the_unit() {
    let units = parse(PLAIN);
    let mut registry = ActionRegistry::new();
    registry.bind_fn(NodeKind::Statement, |node, cx| {
        write!(cx.out, "{} ", node.kind())?;
        Ok(())
    });
    registry.bind_fn(NodeKind::WhileStatement, |node, cx| {
        Err(jgrep::domain::errors::ActionError::fault(cx.location(&node.span()), "stop"))
    });

    let classes = ClassRepository::new(&units, Box::new(EmptyClasspath));
    let mut out = Vec::new();
    let err = Traverser::new(&registry, &units[0], &classes, &mut out).run().unwrap_err();
    assert_eq!(err.to_string(), "p/A.java:8:5: stop");
    let out = String::from_utf8(out).unwrap();
    // The concrete-kind action fails before the generalized one prints.
    assert!(out.ends_with("expressionStatement "), "{}", out);
    assert!(!out.contains("whileStatement"));
    assert!(!out.contains("ifStatement"));
}
