//! Error taxonomy.
//!
//! Configuration and parse errors abort a run before traversal starts;
//! action errors abort it during traversal. Resolution misses are not
//! errors at all (see `repository`).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::node_kind::NodeKind;

/// A snippet that does not compile. Positions are within the snippet text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ScriptError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        ScriptError { line, column, message: message.into() }
    }
}

/// Detected at startup, before any source file is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown node kind \"{0}\" (see --list-kinds)")]
    UnknownNodeKind(String),

    #[error("action for {kind}: {source} (in `{script}`)")]
    Script {
        kind: NodeKind,
        script: String,
        #[source]
        source: ScriptError,
    },

    #[error("unsupported encoding \"{0}\" (use UTF-8, ISO-8859-1 or US-ASCII)")]
    UnsupportedEncoding(String),

    #[error("invalid name pattern \"{pattern}\": {message}")]
    Pattern { pattern: String, message: String },

    #[error("{path}: {message}")]
    ConfigFile { path: PathBuf, message: String },
}

/// A source file that cannot be turned into a compilation unit.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path}:{line}:{column}: {message}")]
    Syntax {
        path: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{path}:{line}:{column}: unsupported construct: {construct}")]
    Unsupported {
        path: String,
        line: usize,
        column: usize,
        construct: String,
    },

    #[error("{path}: cannot decode as {encoding}: {message}")]
    Decode {
        path: String,
        encoding: String,
        message: String,
    },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("parser setup failed: {0}")]
    Language(String),
}

/// Raised by an action while a node is being visited.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{location}: {message}")]
    Fault { location: String, message: String },

    #[error("writing output: {0}")]
    Io(#[from] io::Error),
}

impl ActionError {
    pub fn fault(location: impl Into<String>, message: impl Into<String>) -> Self {
        ActionError::Fault { location: location.into(), message: message.into() }
    }
}

/// Any failure that ends a run.
#[derive(Debug, Error)]
pub enum JgrepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

pub type Result<T, E = JgrepError> = std::result::Result<T, E>;
