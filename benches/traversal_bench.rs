/// Benchmarks for jgrep parsing and traversal.
///
/// Run with: `cargo bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jgrep::domain::registry::{ActionRegistry, ActionSpec};
use jgrep::domain::repository::ClassRepository;
use jgrep::domain::traverser::Traverser;
use jgrep::infrastructure::{JavaParser, ScriptEngine};
use jgrep::ports::{EmptyClasspath, SourceParser};

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Sources
// ═══════════════════════════════════════════════════════════════════════════

/// A class with `methods` methods, each with a loop, a branch and calls.
fn synthetic_class(index: usize, methods: usize) -> String {
    let mut src = format!("package bench;\n\nclass C{} {{\n  int total;\n", index);
    for m in 0..methods {
        src.push_str(&format!(
            "  int m{m}(int n) {{\n\
             \x20   for (int i = 0; i < n; i++) {{\n\
             \x20     if (i % 3 == 0) {{ total += helper(i, \"x{m}\"); }} else {{ total -= i; }}\n\
             \x20   }}\n\
             \x20   return total > 0 ? total : -total;\n\
             \x20 }}\n",
        ));
    }
    src.push_str("  int helper(int a, String s) { return a + s.length(); }\n}\n");
    src
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for methods in [10, 100] {
        let source: Arc<str> = Arc::from(synthetic_class(0, methods));
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(methods), &source, |b, source| {
            b.iter(|| JavaParser.parse("bench/C0.java", Arc::clone(source)).map(|cu| cu.types.len()))
        });
    }
    group.finish();
}

fn bench_traversal(c: &mut Criterion) {
    let units: Vec<_> = (0..20)
        .filter_map(|i| JavaParser.parse(&format!("bench/C{}.java", i), Arc::from(synthetic_class(i, 50))).ok())
        .collect();
    let classes = ClassRepository::new(&units, Box::new(EmptyClasspath));

    let empty = ActionRegistry::new();
    let scripted = ActionRegistry::build(
        &[
            ActionSpec::new("methodInvocation", r#"if (_.methodName == "helper") print("")"#),
            ActionSpec::new("literal", "var t = _.kind()"),
        ],
        &ScriptEngine,
    );
    let Ok(scripted) = scripted else { return };

    let mut group = c.benchmark_group("traverse");
    for (name, registry) in [("no-actions", &empty), ("scripted", &scripted)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut visited = 0;
                for unit in &units {
                    let mut sink = std::io::sink();
                    if let Ok(stats) = Traverser::new(registry, unit, &classes, &mut sink).run() {
                        visited += stats.nodes_visited;
                    }
                }
                black_box(visited)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_traversal);
criterion_main!(benches);
