//! KRM resource plumbing.
//!
//! This module holds the minimal object model shared by every resource the
//! function reads or writes (TypeMeta/ObjectMeta), the `ResourceList`
//! envelope exchanged with the pipeline, and the grouping of input items into
//! a bundle keyed by type tag.

pub mod types;
pub mod bundle;

// Re-export commonly used types
pub use types::{
    ObjectMeta, ResourceList, ResourceParameters, ResourceRef, ResultItem, Severity, TypeMeta,
    ANNOTATION_CONDITIONED, ANNOTATION_INTERNAL,
};
pub use bundle::{BundleItem, InputKind, ResourceBundle};
