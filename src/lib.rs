// Library entry point for jgrep.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::errors::{JgrepError, Result};
