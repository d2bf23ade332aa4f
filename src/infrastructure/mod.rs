//! Adapters behind the ports: the Java parser, the snippet language, the
//! directory classpath, source discovery, configuration and the parse pool.

pub mod classpath;
pub mod concurrency;
pub mod config;
pub mod java_parser;
pub mod script;
pub mod source_finder;

pub use classpath::DirectoryClasspath;
pub use config::{Overrides, Settings};
pub use java_parser::JavaParser;
pub use script::ScriptEngine;
pub use source_finder::{Encoding, NamePattern, SourceFinder};
