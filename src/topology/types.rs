//! Topology type definitions.
//!
//! This file contains the input resources that describe a fabric
//! (Definition, Template) and the resources generated from them
//! (Node, Link), all in the `topo.yndd.io/v1alpha1` API group.

use crate::resource::{ObjectMeta, TypeMeta};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API version of every topology resource
pub const TOPO_API_VERSION: &str = "topo.yndd.io/v1alpha1";
pub const NODE_KIND: &str = "Node";
pub const LINK_KIND: &str = "Link";

/// Label carrying the name of the definition a resource was generated from
pub const LABEL_DEFINITION: &str = "topo.yndd.io/definition";
/// Label carrying the position of a node in the fabric
pub const LABEL_POSITION: &str = "topo.yndd.io/position";
/// Label carrying the pod a node belongs to
pub const LABEL_POD_INDEX: &str = "topo.yndd.io/pod-index";

fn one() -> u32 {
    1
}

// ============================================================================
// Definition
// ============================================================================

/// Geographic location of a fabric
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionSpec {
    #[serde(default)]
    pub properties: DefinitionProperties,
}

/// Identifies one fabric instance. Exactly one governs a run.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DefinitionSpec,
}

impl Definition {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn location(&self) -> Option<&Location> {
        self.spec.properties.location.as_ref()
    }
}

// ============================================================================
// Template
// ============================================================================

/// Vendor and platform assigned to the nodes of a tier
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VendorInfo {
    pub vendor_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// One tier of the fabric (leaves, spines or superspines)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierTemplate {
    /// Number of nodes in the tier
    pub num: u32,
    /// Parallel links from each node of this tier to each node of the tier above
    #[serde(default = "one")]
    pub uplinks_per_node: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vendor_info: Vec<VendorInfo>,
}

impl TierTemplate {
    /// Vendor info for the node at 1-based `index`, cycling through the list
    pub fn vendor_for(&self, index: u32) -> Option<&VendorInfo> {
        if self.vendor_info.is_empty() {
            return None;
        }
        let slot = (index.saturating_sub(1) as usize) % self.vendor_info.len();
        self.vendor_info.get(slot)
    }
}

/// Reference from a master template to a child template
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A group of identical pods
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplate {
    #[serde(default = "one")]
    pub num: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<TemplateRef>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FabricTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier3: Option<TierTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier2: Option<TierTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier1: Option<TierTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pods: Vec<PodTemplate>,
}

impl FabricTemplate {
    /// True when any pod references another template
    pub fn has_reference(&self) -> bool {
        self.pods.iter().any(|pod| pod.template_ref.is_some())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProperties {
    #[serde(default)]
    pub fabric: FabricTemplate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[serde(default)]
    pub properties: TemplateProperties,
}

/// Reusable topology building block
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TemplateSpec,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn fabric(&self) -> &FabricTemplate {
        &self.spec.properties.fabric
    }

    /// A master template defines top-level fabric structure
    pub fn is_master(&self) -> bool {
        self.fabric().has_reference()
    }
}

// ============================================================================
// Generated resources
// ============================================================================

/// Position of a node in the fabric
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Superspine,
    Spine,
    Leaf,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Superspine => write!(f, "superspine"),
            Position::Spine => write!(f, "spine"),
            Position::Leaf => write!(f, "leaf"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_index: Option<u32>,
    /// 1-based index within the tier (and pod, when the node belongs to one)
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub location: Location,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub properties: NodeProperties,
}

/// A generated topology vertex
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: NodeSpec,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn position(&self) -> Position {
        self.spec.properties.position
    }

    pub fn pod_index(&self) -> Option<u32> {
        self.spec.properties.pod_index
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub node_name: String,
    pub interface_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpec {
    /// Lower-tier endpoint first
    pub endpoints: Vec<Endpoint>,
}

/// A generated topology edge between two nodes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: LinkSpec,
}

impl Link {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.spec.endpoints
    }
}

/// The expanded topology of one definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fabric {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Fabric {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Fabric { nodes, links }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
