//! Resource envelope type definitions.
//!
//! This file contains the object metadata carried by every generated
//! resource and the `ResourceList` document read from and written back to
//! the configuration pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API version of the `ResourceList` envelope
pub const RESOURCE_LIST_API_VERSION: &str = "config.kubernetes.io/v1";
/// Kind of the `ResourceList` envelope
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

// ============================================================================
// Object Metadata
// ============================================================================

/// API group/version and kind of a resource.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

impl TypeMeta {
    pub fn new(api_version: &str, kind: &str) -> Self {
        TypeMeta {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Type tag used to group input items, e.g. `Template.v1alpha1.topo.yndd.io`.
    ///
    /// Core API objects (no group) yield `Kind.version`.
    pub fn type_tag(&self) -> String {
        match self.api_version.split_once('/') {
            Some((group, version)) => format!("{}.{}.{}", self.kind, version, group),
            None => format!("{}.{}", self.kind, self.api_version),
        }
    }
}

/// Identity and labels of a resource.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: &str, namespace: &str) -> Self {
        ObjectMeta {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }
}

// ============================================================================
// Output Parameters
// ============================================================================

/// Annotation marking a resource as consumed inside the pipeline only
pub const ANNOTATION_INTERNAL: &str = "fabricgen.io/internal";
/// Annotation marking a resource whose readiness gates later pipeline stages
pub const ANNOTATION_CONDITIONED: &str = "fabricgen.io/conditioned";

/// How the pipeline should treat a generated resource.
///
/// Allocation requests are internal and conditioned; topology resources are
/// neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceParameters {
    pub internal: bool,
    pub conditioned: bool,
}

impl ResourceParameters {
    pub const INTERNAL_CONDITIONED: ResourceParameters = ResourceParameters {
        internal: true,
        conditioned: true,
    };

    /// Record the parameters as `metadata.annotations` of a rendered resource.
    ///
    /// Unset parameters add nothing; a resource without a metadata mapping is
    /// left alone.
    pub fn annotate(&self, resource: &mut serde_yaml::Value) {
        let flags = [(ANNOTATION_INTERNAL, self.internal), (ANNOTATION_CONDITIONED, self.conditioned)];
        if !flags.iter().any(|(_, set)| *set) {
            return;
        }
        let Some(metadata) = resource.get_mut("metadata").and_then(serde_yaml::Value::as_mapping_mut) else {
            return;
        };
        if !metadata.contains_key("annotations") {
            metadata.insert(
                serde_yaml::Value::String("annotations".to_string()),
                serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
            );
        }
        let Some(annotations) = metadata.get_mut("annotations").and_then(serde_yaml::Value::as_mapping_mut) else {
            return;
        };
        for (key, set) in flags {
            if set {
                annotations.insert(
                    serde_yaml::Value::String(key.to_string()),
                    serde_yaml::Value::String("true".to_string()),
                );
            }
        }
    }
}

// ============================================================================
// ResourceList Envelope
// ============================================================================

/// Severity of a reported result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Reference to the resource a result is about
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// A single entry of `ResourceList.results`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_ref: Option<ResourceRef>,
}

/// The document a KRM function receives on input and produces on output.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_config: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ResultItem>,
}

fn default_api_version() -> String {
    RESOURCE_LIST_API_VERSION.to_string()
}

fn default_kind() -> String {
    RESOURCE_LIST_KIND.to_string()
}

impl Default for ResourceList {
    fn default() -> Self {
        ResourceList {
            api_version: default_api_version(),
            kind: default_kind(),
            items: Vec::new(),
            function_config: None,
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_with_group() {
        let tm = TypeMeta::new("topo.yndd.io/v1alpha1", "Template");
        assert_eq!(tm.type_tag(), "Template.v1alpha1.topo.yndd.io");
    }

    #[test]
    fn test_type_tag_core_group() {
        let tm = TypeMeta::new("v1", "ConfigMap");
        assert_eq!(tm.type_tag(), "ConfigMap.v1");
    }

    #[test]
    fn test_parse_resource_list_defaults() {
        let yaml = r#"
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: cm
"#;
        let rl: ResourceList = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rl.api_version, RESOURCE_LIST_API_VERSION);
        assert_eq!(rl.kind, RESOURCE_LIST_KIND);
        assert_eq!(rl.items.len(), 1);
        assert!(rl.function_config.is_none());
        assert!(rl.results.is_empty());
    }

    #[test]
    fn test_object_meta_omits_empty_fields() {
        let meta = ObjectMeta::new("leaf1", "");
        let yaml = serde_yaml::to_string(&meta).unwrap();
        assert!(yaml.contains("name: leaf1"));
        assert!(!yaml.contains("namespace"));
        assert!(!yaml.contains("labels"));
    }

    #[test]
    fn test_annotate_internal_conditioned() {
        let mut resource: serde_yaml::Value =
            serde_yaml::from_str("metadata: {name: alloc, namespace: default}").unwrap();
        ResourceParameters::INTERNAL_CONDITIONED.annotate(&mut resource);

        let annotations = &resource["metadata"]["annotations"];
        assert_eq!(annotations[ANNOTATION_INTERNAL], "true");
        assert_eq!(annotations[ANNOTATION_CONDITIONED], "true");
        assert_eq!(resource["metadata"]["name"], "alloc");
    }

    #[test]
    fn test_annotate_default_is_noop() {
        let mut resource: serde_yaml::Value = serde_yaml::from_str("metadata: {name: leaf1}").unwrap();
        let before = resource.clone();
        ResourceParameters::default().annotate(&mut resource);
        assert_eq!(resource, before);
    }

    #[test]
    fn test_result_item_serialization() {
        let item = ResultItem {
            message: "boom".to_string(),
            severity: Severity::Warning,
            resource_ref: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["severity"], "warning");
        assert!(json.get("resourceRef").is_none());
    }
}
