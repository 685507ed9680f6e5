//! Input bundle grouping.
//!
//! Items of the incoming `ResourceList` are grouped by their type tag so that
//! the orchestrator can dispatch each group through the closed set of input
//! kinds it understands.

use super::types::TypeMeta;
use std::collections::BTreeMap;

/// Type tag of fabric definitions
pub const DEFINITION_TYPE_TAG: &str = "Definition.v1alpha1.topo.yndd.io";
/// Type tag of fabric templates
pub const TEMPLATE_TYPE_TAG: &str = "Template.v1alpha1.topo.yndd.io";

/// Input kinds recognized by the function. Any other type tag is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Definition,
    Template,
}

impl InputKind {
    pub const ALL: [InputKind; 2] = [InputKind::Definition, InputKind::Template];

    /// Map a type tag to a recognized input kind
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            DEFINITION_TYPE_TAG => Some(Self::Definition),
            TEMPLATE_TYPE_TAG => Some(Self::Template),
            _ => None,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Definition => DEFINITION_TYPE_TAG,
            Self::Template => TEMPLATE_TYPE_TAG,
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definition => write!(f, "Definition"),
            Self::Template => write!(f, "Template"),
        }
    }
}

/// One raw input item and where it sat in `ResourceList.items`
#[derive(Debug, Clone, PartialEq)]
pub struct BundleItem {
    pub position: usize,
    pub raw: serde_yaml::Value,
}

/// Raw input items keyed by type tag, arrival order kept within each tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBundle {
    entries: BTreeMap<String, Vec<BundleItem>>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `ResourceList.items` by type tag.
    ///
    /// Items that are not mappings or carry no kind cannot be tagged and are
    /// skipped.
    pub fn from_items(items: &[serde_yaml::Value]) -> Self {
        let mut bundle = ResourceBundle::new();
        for (idx, item) in items.iter().enumerate() {
            match serde_yaml::from_value::<TypeMeta>(item.clone()) {
                Ok(type_meta) if !type_meta.kind.is_empty() => {
                    bundle.push(type_meta.type_tag(), idx, item.clone());
                }
                Ok(_) => {
                    log::debug!("Skipping input item {} without kind", idx);
                }
                Err(e) => {
                    log::debug!("Skipping untyped input item {}: {}", idx, e);
                }
            }
        }
        bundle
    }

    pub fn push(&mut self, type_tag: impl Into<String>, position: usize, raw: serde_yaml::Value) {
        self.entries
            .entry(type_tag.into())
            .or_default()
            .push(BundleItem { position, raw });
    }

    /// Raw items of a recognized kind, in arrival order
    pub fn items_of(&self, kind: InputKind) -> &[BundleItem] {
        self.entries
            .get(kind.type_tag())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All type tags present, including unrecognized ones
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
