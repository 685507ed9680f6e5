//! Network topology module.
//!
//! This module contains the fabric resource types, the classification of
//! templates into master and child roles, and the expansion of a definition
//! into concrete nodes and links.

pub mod types;
pub mod classify;
pub mod compose;

// Re-export key types and functions for easier access
pub use types::{Definition, Fabric, Link, Node, Position, Template, TOPO_API_VERSION};
pub use classify::{classify, Classified};
pub use compose::{compose, ComposeError};
