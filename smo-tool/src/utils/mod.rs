//! Shared utilities for the smo-tool CLI

pub mod table;
pub mod tree;

pub use table::*;
pub use tree::*;
