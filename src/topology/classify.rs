//! Template classification.
//!
//! Splits decoded templates into master templates (those whose fabric
//! references other templates) and child templates (pod building blocks).

use super::types::Template;
use crate::resource::{BundleItem, InputKind};
use crate::results::RunError;

/// Templates split by role, each in input arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub masters: Vec<Template>,
    pub children: Vec<Template>,
}

impl Classified {
    pub fn len(&self) -> usize {
        self.masters.len() + self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition already decoded templates by role
pub fn partition(templates: impl IntoIterator<Item = Template>) -> Classified {
    let mut classified = Classified::default();
    for template in templates {
        if template.is_master() {
            classified.masters.push(template);
        } else {
            classified.children.push(template);
        }
    }
    classified
}

/// Decode raw template items and classify them.
///
/// An item that fails to decode is skipped and reported as a non-fatal
/// decode error; the remaining items are still classified.
pub fn classify(items: &[BundleItem]) -> (Classified, Vec<RunError>) {
    let mut errors = Vec::new();
    let mut decoded = Vec::with_capacity(items.len());

    for item in items {
        match serde_yaml::from_value::<Template>(item.raw.clone()) {
            Ok(template) => decoded.push(template),
            Err(source) => {
                log::warn!("Skipping undecodable template at items[{}]: {}", item.position, source);
                errors.push(RunError::Decode { kind: InputKind::Template, position: item.position, source });
            }
        }
    }

    let classified = partition(decoded);
    log::info!(
        "Classified {} templates: {} master, {} child",
        classified.len(),
        classified.masters.len(),
        classified.children.len()
    );
    (classified, errors)
}
