//! Run results.
//!
//! Every problem encountered during a run is collected as a [`RunError`] in a
//! single list that is returned to the caller. Decode failures of individual
//! input items are non-fatal; everything else makes the run unsuccessful.

use crate::config::ValidationError;
use crate::ip::AllocationError;
use crate::resource::{InputKind, ResourceRef, ResultItem, Severity};
use crate::topology::ComposeError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// `position` is the item's index in `ResourceList.items`
    #[error("Failed to decode {kind} at items[{position}]: {source}")]
    Decode {
        kind: InputKind,
        position: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Duplicate Definition '{name}' ignored; '{kept}' governs this run")]
    DuplicateDefinition { name: String, kept: String },
    #[error("No Definition found in input")]
    MissingDefinition,
    #[error("Fabric composition failed: {0}")]
    Compose(#[from] ComposeError),
    #[error("Allocation request '{request}' failed: {source}")]
    Allocation {
        request: String,
        #[source]
        source: AllocationError,
    },
    #[error("Failed to encode generated {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid function configuration: {0}")]
    Config(#[from] ValidationError),
}

impl RunError {
    /// Whether this error makes the whole run unsuccessful
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RunError::Decode { .. })
    }

    /// Render as a `ResourceList` result entry
    pub fn to_result_item(&self) -> ResultItem {
        let severity = if self.is_fatal() { Severity::Error } else { Severity::Warning };
        let resource_ref = match self {
            RunError::DuplicateDefinition { name, .. } => Some(ResourceRef {
                api_version: crate::topology::TOPO_API_VERSION.to_string(),
                kind: InputKind::Definition.to_string(),
                name: name.clone(),
                namespace: String::new(),
            }),
            _ => None,
        };
        ResultItem {
            message: self.to_string(),
            severity,
            resource_ref,
        }
    }
}

/// True when none of the collected errors is fatal
pub fn is_success(errors: &[RunError]) -> bool {
    !errors.iter().any(RunError::is_fatal)
}

/// Convert collected errors into result entries, adding a summary on success
pub fn to_result_items(errors: &[RunError], generated: usize) -> Vec<ResultItem> {
    let mut items: Vec<ResultItem> = errors.iter().map(RunError::to_result_item).collect();
    if is_success(errors) {
        items.push(ResultItem {
            message: format!("Generated {} resources", generated),
            severity: Severity::Info,
            resource_ref: None,
        });
    }
    items
}
