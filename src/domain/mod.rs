//! Data model and core algorithms: the typed syntax tree, the node-kind
//! table, the traversal engine with its action registry, and the class
//! repository.

pub mod ast;
pub mod descriptor;
pub mod errors;
pub mod node_kind;
pub mod registry;
pub mod repository;
pub mod traverser;
