// Command-line entry point for jgrep.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use jgrep::application::SearchUsecase;
use jgrep::domain::node_kind::NodeKind;
use jgrep::domain::registry::{ActionRegistry, ActionSpec};
use jgrep::infrastructure::{Encoding, JavaParser, Overrides, ScriptEngine, Settings, SourceFinder};
use jgrep::ports::ConsoleDiagnostics;

/// Search Java sources for syntactic patterns and run snippets on every match.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source roots (directories or single files)
    #[arg(value_name = "ROOT")]
    roots: Vec<PathBuf>,

    /// Directory name pattern, e.g. "*-build-test"
    #[arg(long)]
    dirs: Option<String>,

    /// File name pattern, e.g. "*.java-*Generated*"
    #[arg(long)]
    files: Option<String>,

    /// Class directories, as a platform path list (default: ".")
    #[arg(long)]
    classpath: Option<String>,

    /// Class directories searched before the classpath
    #[arg(long)]
    bootclasspath: Option<String>,

    /// Directories of class archives searched after the boot entries
    #[arg(long)]
    extdirs: Option<String>,

    /// Source encoding (UTF-8, ISO-8859-1, US-ASCII)
    #[arg(long)]
    encoding: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Report imports and super types that resolve nowhere
    #[arg(long)]
    check_references: bool,

    /// Parse-phase workers (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Bind a snippet to a node kind; may be repeated
    #[arg(short, long, num_args = 2, value_names = ["KIND", "SCRIPT"], action = ArgAction::Append)]
    action: Vec<String>,

    /// Print every node kind with its fields and exit
    #[arg(long)]
    list_kinds: bool,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn list_kinds(out: &mut dyn Write) -> io::Result<()> {
    for kind in NodeKind::ALL {
        let marker = if kind.is_abstract() { "*" } else { " " };
        writeln!(out, "{}{:<40} {}", marker, kind.id(), kind.fields().join(", "))?;
    }
    Ok(())
}

fn settings(cli: Cli) -> Result<Settings> {
    let base = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let actions = cli
        .action
        .chunks(2)
        .map(|pair| ActionSpec::new(pair[0].clone(), pair[1].clone()))
        .collect();
    let path_list = |list: Option<&str>| -> Option<Vec<PathBuf>> {
        list.map(|l| std::env::split_paths(l).filter(|p| !p.as_os_str().is_empty()).collect())
    };

    Ok(base.apply(Overrides {
        roots: cli.roots,
        dirs: cli.dirs,
        files: cli.files,
        classpath: path_list(cli.classpath.as_deref()),
        bootclasspath: path_list(cli.bootclasspath.as_deref()),
        extdirs: path_list(cli.extdirs.as_deref()),
        encoding: cli.encoding,
        check_references: cli.check_references,
        jobs: cli.jobs,
        actions,
    }))
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_kinds {
        return list_kinds(&mut io::stdout().lock()).context("writing kind list");
    }

    let settings = settings(cli)?;
    if settings.roots.is_empty() {
        bail!("no source roots given (pass ROOT or set `roots` in --config)");
    }
    let encoding = Encoding::from_name(&settings.encoding)?;
    let finder = SourceFinder::from_patterns(&settings.dirs, &settings.files)?;

    let usecase = SearchUsecase {
        loader: &encoding,
        parser: &JavaParser,
        compiler: &ScriptEngine,
        classpath: Box::new(settings.class_resolver()),
        check_references: settings.check_references,
        jobs: settings.jobs,
    };

    // Snippets compile before the roots are walked.
    let registry = ActionRegistry::build(&settings.actions, &ScriptEngine)?;
    let files = finder.find(&settings.roots)?;
    tracing::info!("{} source file(s) under {} root(s)", files.len(), settings.roots.len());

    let mut out = BufWriter::new(io::stdout());
    let summary = usecase.run_with_registry(&registry, &files, &mut out, &mut ConsoleDiagnostics)?;
    tracing::debug!(
        "resolver: {} cache hits, {} unit scans, {} classpath lookups",
        summary.resolver.cache_hits,
        summary.resolver.unit_scans,
        summary.resolver.leaf_lookups
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jgrep: {e:#}");
            ExitCode::FAILURE
        }
    }
}
