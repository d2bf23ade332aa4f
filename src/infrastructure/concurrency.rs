/// Parse-phase worker pool.
/// Only the parse phase runs in parallel; resolution and traversal start
/// after every unit is in, on a single thread of their own.

use std::io;
use std::thread;

use anyhow::Result;
use rayon::prelude::*;

/// Stack for parse workers and the traversal thread. Lowering and
/// traversal recurse once per nesting level of the source, which the
/// parser caps at `java_parser::MAX_NESTING`.
pub const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Worker count for a `--jobs` value; 0 means one per core.
pub fn worker_count(jobs: usize) -> usize {
    if jobs == 0 {
        num_cpus::get().max(1)
    } else {
        jobs
    }
}

/// Build a local pool rather than touching rayon's global one.
pub fn build_pool(jobs: usize) -> Result<rayon::ThreadPool> {
    let workers = worker_count(jobs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("jgrep-parse-{}", i))
        .stack_size(WORKER_STACK_SIZE)
        .build()?;
    tracing::debug!("parse pool: {} workers (system has {} cores)", workers, num_cpus::get());
    Ok(pool)
}

/// Maps `f` over `items` on `pool`, keeping input order. On failure the
/// error of the earliest failing item is returned.
pub fn map_in_order<T, R, E, F>(pool: Option<&rayon::ThreadPool>, items: &[T], f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync + Send,
{
    match pool {
        Some(pool) if items.len() > 1 => {
            let results: Vec<Result<R, E>> = pool.install(|| items.par_iter().map(&f).collect());
            results.into_iter().collect()
        }
        _ => items.iter().map(f).collect(),
    }
}

/// Runs `f` to completion on a named thread with `WORKER_STACK_SIZE`.
/// A panic in `f` is resumed on the caller.
pub fn with_worker_stack<R, F>(name: &str, f: F) -> io::Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn_scoped(scope, f)?;
        match handle.join() {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_defaults_to_cores() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }

    #[test]
    fn test_results_keep_input_order() {
        let pool = build_pool(4).unwrap();
        let items: Vec<u64> = (0..200).collect();
        let out: Result<Vec<u64>, String> = map_in_order(Some(&pool), &items, |n| Ok(n * 2));
        assert_eq!(out.unwrap(), items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_earliest_failure_wins() {
        let pool = build_pool(4).unwrap();
        let items: Vec<u64> = (0..100).collect();
        let out: Result<Vec<u64>, u64> =
            map_in_order(Some(&pool), &items, |&n| if n % 30 == 7 { Err(n) } else { Ok(n) });
        assert_eq!(out.unwrap_err(), 7);
        let out: Result<Vec<u64>, u64> = map_in_order(None, &items, |&n| if n > 50 { Err(n) } else { Ok(n) });
        assert_eq!(out.unwrap_err(), 51);
    }

    #[test]
    fn test_worker_stack_runs_on_a_named_thread() {
        let mut borrowed = vec![1, 2, 3];
        let name = with_worker_stack("jgrep-test", || {
            borrowed.push(4);
            thread::current().name().map(str::to_string)
        })
        .unwrap();
        assert_eq!(name.as_deref(), Some("jgrep-test"));
        assert_eq!(borrowed, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_worker_stack_holds_deep_recursion() {
        fn depth(n: usize) -> usize {
            let pad = std::hint::black_box([0u8; 512]);
            if n == 0 {
                usize::from(pad[0])
            } else {
                1 + depth(n - 1)
            }
        }
        assert_eq!(with_worker_stack("jgrep-deep", || depth(50_000)).unwrap(), 50_000);
    }
}
