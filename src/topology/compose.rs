//! Fabric composition.
//!
//! Expands a definition and its master/child templates into an ordered set
//! of nodes and links. The expansion is deterministic: node order drives the
//! per-node allocation index downstream, so identical inputs must always give
//! identical sequences.
//!
//! Layout:
//! - each master contributes its superspines (`tier3`), then its pods;
//! - each pod is one instantiation of a child template: spines (`tier2`),
//!   then leaves (`tier1`);
//! - without masters, every child template becomes exactly one pod.
//!
//! Every leaf connects to every spine of its pod (or to the superspines when
//! the pod has no spines), and every spine connects to every superspine of
//! its master.

use super::types::{
    Definition, Endpoint, Fabric, Link, LinkSpec, Location, Node, NodeProperties, NodeSpec,
    Position, Template, TierTemplate, LABEL_DEFINITION, LABEL_POD_INDEX, LABEL_POSITION,
    LINK_KIND, NODE_KIND, TOPO_API_VERSION,
};
use crate::resource::{ObjectMeta, TypeMeta};
use crate::utils::validation::validate_dns_label;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("Definition has no name")]
    MissingName,
    #[error("Definition '{0}' has no namespace")]
    MissingNamespace(String),
    #[error("Definition '{0}' has no location")]
    MissingLocation(String),
    #[error("Generated node name '{name}' is invalid: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("Master template '{template}' has a pod without templateRef")]
    MissingTemplateRef { template: String },
    #[error("Master template '{template}' references unknown template '{namespace}/{name}'")]
    UnresolvedTemplateRef { template: String, name: String, namespace: String },
    #[error("Template '{namespace}/{name}' is defined more than once")]
    DuplicateTemplate { name: String, namespace: String },
    #[error("Child template '{0}' is not referenced by any master template")]
    UnattachedChild(String),
    #[error("Child template '{0}' defines no tier1 nodes")]
    EmptyPod(String),
    #[error("Child template '{0}' defines pods without templateRef")]
    UnexpectedPods(String),
    #[error("Template '{template}' {tier} has uplinksPerNode set to 0")]
    ZeroUplinks { template: String, tier: &'static str },
}

/// Superspines of one master and the pods that hang off them
#[derive(Debug)]
struct Segment<'a> {
    superspines: Option<&'a TierTemplate>,
    pods: Vec<&'a Template>,
}

/// Compose the fabric of `definition` from its master and child templates
pub fn compose(
    definition: &Definition,
    masters: &[Template],
    children: &[Template],
) -> Result<Fabric, ComposeError> {
    let location = validate_definition(definition)?;
    check_unique_templates(definition, masters.iter().chain(children))?;
    for child in children {
        validate_child(child)?;
    }

    let segments = plan_segments(definition, masters, children)?;

    let mut builder = FabricBuilder::new(definition, location);
    for segment in &segments {
        builder.add_segment(segment)?;
    }
    let fabric = builder.finish();

    log::info!(
        "Composed fabric '{}': {} nodes, {} links",
        definition.name(),
        fabric.nodes().len(),
        fabric.links().len()
    );
    Ok(fabric)
}

fn validate_definition(definition: &Definition) -> Result<Location, ComposeError> {
    if definition.name().is_empty() {
        return Err(ComposeError::MissingName);
    }
    if definition.namespace().is_empty() {
        return Err(ComposeError::MissingNamespace(definition.name().to_string()));
    }
    definition
        .location()
        .cloned()
        .ok_or_else(|| ComposeError::MissingLocation(definition.name().to_string()))
}

/// Namespace a template lives in; templates without one inherit the definition's
fn template_namespace<'a>(definition: &'a Definition, template: &'a Template) -> &'a str {
    if template.namespace().is_empty() {
        definition.namespace()
    } else {
        template.namespace()
    }
}

/// Template references resolve by name and namespace, so both must be unique
fn check_unique_templates<'a>(
    definition: &Definition,
    templates: impl IntoIterator<Item = &'a Template>,
) -> Result<(), ComposeError> {
    let mut seen = HashSet::new();
    for template in templates {
        let namespace = template_namespace(definition, template);
        if !seen.insert((namespace, template.name())) {
            return Err(ComposeError::DuplicateTemplate {
                name: template.name().to_string(),
                namespace: namespace.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_child(child: &Template) -> Result<(), ComposeError> {
    let fabric = child.fabric();
    if !fabric.pods.is_empty() {
        return Err(ComposeError::UnexpectedPods(child.name().to_string()));
    }
    match &fabric.tier1 {
        Some(tier1) if tier1.num > 0 => {}
        _ => return Err(ComposeError::EmptyPod(child.name().to_string())),
    }
    if fabric.tier3.is_some() {
        log::warn!("Ignoring tier3 of child template '{}'", child.name());
    }
    Ok(())
}

/// Resolve pod references into an ordered list of segments
fn plan_segments<'a>(
    definition: &Definition,
    masters: &'a [Template],
    children: &'a [Template],
) -> Result<Vec<Segment<'a>>, ComposeError> {
    if masters.is_empty() {
        return Ok(vec![Segment {
            superspines: None,
            pods: children.iter().collect(),
        }]);
    }

    let mut attached = vec![false; children.len()];
    let mut segments = Vec::with_capacity(masters.len());

    for master in masters {
        let fabric = master.fabric();
        if fabric.tier1.is_some() || fabric.tier2.is_some() {
            log::warn!("Ignoring tier1/tier2 of master template '{}'", master.name());
        }

        let mut pods = Vec::new();
        for pod in &fabric.pods {
            let reference = pod.template_ref.as_ref().ok_or_else(|| {
                ComposeError::MissingTemplateRef { template: master.name().to_string() }
            })?;
            let namespace = reference
                .namespace
                .clone()
                .unwrap_or_else(|| definition.namespace().to_string());

            let position = children
                .iter()
                .position(|c| c.name() == reference.name && template_namespace(definition, c) == namespace)
                .ok_or_else(|| ComposeError::UnresolvedTemplateRef {
                    template: master.name().to_string(),
                    name: reference.name.clone(),
                    namespace: namespace.clone(),
                })?;

            attached[position] = true;
            for _ in 0..pod.num {
                pods.push(&children[position]);
            }
        }

        segments.push(Segment {
            superspines: fabric.tier3.as_ref(),
            pods,
        });
    }

    if let Some(idx) = attached.iter().position(|a| !a) {
        return Err(ComposeError::UnattachedChild(children[idx].name().to_string()));
    }

    Ok(segments)
}

struct FabricBuilder<'a> {
    definition: &'a Definition,
    location: Location,
    nodes: Vec<Node>,
    links: Vec<Link>,
    /// Next free interface per node
    ports: HashMap<String, u32>,
    superspine_count: u32,
    pod_count: u32,
}

impl<'a> FabricBuilder<'a> {
    fn new(definition: &'a Definition, location: Location) -> Self {
        FabricBuilder {
            definition,
            location,
            nodes: Vec::new(),
            links: Vec::new(),
            ports: HashMap::new(),
            superspine_count: 0,
            pod_count: 0,
        }
    }

    fn add_segment(&mut self, segment: &Segment<'_>) -> Result<(), ComposeError> {
        let mut superspines = Vec::new();
        if let Some(tier3) = segment.superspines {
            for _ in 0..tier3.num {
                self.superspine_count += 1;
                superspines.push(self.add_node(Position::Superspine, None, self.superspine_count, tier3)?);
            }
        }

        for child in &segment.pods {
            self.add_pod(child, &superspines)?;
        }
        Ok(())
    }

    fn add_pod(&mut self, child: &Template, superspines: &[String]) -> Result<(), ComposeError> {
        self.pod_count += 1;
        let pod_index = self.pod_count;
        let fabric = child.fabric();
        let tier1 = fabric
            .tier1
            .as_ref()
            .ok_or_else(|| ComposeError::EmptyPod(child.name().to_string()))?;

        let mut spines = Vec::new();
        if let Some(tier2) = &fabric.tier2 {
            for i in 1..=tier2.num {
                spines.push(self.add_node(Position::Spine, Some(pod_index), i, tier2)?);
            }
        }
        let mut leaves = Vec::new();
        for i in 1..=tier1.num {
            leaves.push(self.add_node(Position::Leaf, Some(pod_index), i, tier1)?);
        }

        let leaf_uplinks = if spines.is_empty() { superspines } else { spines.as_slice() };
        if !leaf_uplinks.is_empty() && tier1.uplinks_per_node == 0 {
            return Err(ComposeError::ZeroUplinks { template: child.name().to_string(), tier: "tier1" });
        }
        for leaf in &leaves {
            for upper in leaf_uplinks {
                self.connect(leaf, upper, tier1.uplinks_per_node);
            }
        }

        if let Some(tier2) = &fabric.tier2 {
            if !spines.is_empty() && !superspines.is_empty() && tier2.uplinks_per_node == 0 {
                return Err(ComposeError::ZeroUplinks { template: child.name().to_string(), tier: "tier2" });
            }
            for spine in &spines {
                for upper in superspines {
                    self.connect(spine, upper, tier2.uplinks_per_node);
                }
            }
        }
        Ok(())
    }

    fn add_node(
        &mut self,
        position: Position,
        pod_index: Option<u32>,
        index: u32,
        tier: &TierTemplate,
    ) -> Result<String, ComposeError> {
        let name = match pod_index {
            Some(pod) => format!("{}-pod{}-{}{}", self.definition.name(), pod, position, index),
            None => format!("{}-{}{}", self.definition.name(), position, index),
        };
        validate_dns_label(&name)
            .map_err(|reason| ComposeError::InvalidName { name: name.clone(), reason })?;

        let mut metadata = ObjectMeta::new(&name, self.definition.namespace())
            .with_label(LABEL_DEFINITION, self.definition.name())
            .with_label(LABEL_POSITION, &position.to_string());
        if let Some(pod) = pod_index {
            metadata = metadata.with_label(LABEL_POD_INDEX, &pod.to_string());
        }

        let vendor = tier.vendor_for(index);
        let node = Node {
            type_meta: TypeMeta::new(TOPO_API_VERSION, NODE_KIND),
            metadata,
            spec: NodeSpec {
                properties: NodeProperties {
                    position,
                    pod_index,
                    index,
                    vendor_type: vendor.map(|v| v.vendor_type.clone()),
                    platform: vendor.and_then(|v| v.platform.clone()),
                    location: self.location.clone(),
                },
            },
        };
        log::debug!("Generated {} node {}", position, name);
        self.nodes.push(node);
        Ok(name)
    }

    fn next_interface(&mut self, node: &str) -> String {
        let port = self.ports.entry(node.to_string()).or_insert(0);
        *port += 1;
        format!("e1-{}", port)
    }

    fn connect(&mut self, lower: &str, upper: &str, parallel: u32) {
        for k in 1..=parallel {
            let lower_if = self.next_interface(lower);
            let upper_if = self.next_interface(upper);
            let name = format!("{}-{}-{}", lower, upper, k);
            log::debug!("Generated link {} ({}:{} <-> {}:{})", name, lower, lower_if, upper, upper_if);

            self.links.push(Link {
                type_meta: TypeMeta::new(TOPO_API_VERSION, LINK_KIND),
                metadata: ObjectMeta::new(&name, self.definition.namespace())
                    .with_label(LABEL_DEFINITION, self.definition.name()),
                spec: LinkSpec {
                    endpoints: vec![
                        Endpoint { node_name: lower.to_string(), interface_name: lower_if },
                        Endpoint { node_name: upper.to_string(), interface_name: upper_if },
                    ],
                },
            });
        }
    }

    fn finish(self) -> Fabric {
        Fabric::new(self.nodes, self.links)
    }
}
