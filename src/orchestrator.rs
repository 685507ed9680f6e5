//! Run orchestrator.
//!
//! This module coordinates one invocation of the function: decode the input
//! bundle, compose the fabric, and emit nodes, links and allocation requests
//! in a fixed order (nodes, links, shared prefix, per-node addresses).
//! Allocation requests are marked internal and conditioned for the pipeline.

use crate::config::FunctionConfig;
use crate::ip::{management_prefix_request, node_requests, AllocationRequestInfo};
use crate::resource::{BundleItem, InputKind, ResourceBundle, ResourceParameters};
use crate::results::{is_success, RunError};
use crate::topology::{classify, compose, Classified, Definition};
use log::{debug, error, info, warn};
use serde::Serialize;

/// A rendered resource and how the pipeline should treat it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResource {
    pub resource: serde_yaml::Value,
    pub parameters: ResourceParameters,
}

impl GeneratedResource {
    /// The resource as a `ResourceList` item, parameters recorded as annotations
    pub fn into_item(self) -> serde_yaml::Value {
        let mut resource = self.resource;
        self.parameters.annotate(&mut resource);
        resource
    }
}

/// Everything produced by one run
#[derive(Debug)]
pub struct RunOutput {
    /// Generated resources, in emission order
    pub outputs: Vec<GeneratedResource>,
    /// Every error recorded during the run, fatal or not
    pub errors: Vec<RunError>,
    pub success: bool,
}

/// Select the governing definition: the first one decoded wins, every
/// further definition is reported as an error.
fn select_definition(items: &[BundleItem], errors: &mut Vec<RunError>) -> Option<Definition> {
    let mut selected: Option<Definition> = None;

    for item in items {
        let definition = match serde_yaml::from_value::<Definition>(item.raw.clone()) {
            Ok(definition) => definition,
            Err(source) => {
                warn!("Skipping undecodable definition at items[{}]: {}", item.position, source);
                errors.push(RunError::Decode { kind: InputKind::Definition, position: item.position, source });
                continue;
            }
        };

        match &selected {
            None => {
                info!("Using definition '{}/{}'", definition.namespace(), definition.name());
                selected = Some(definition);
            }
            Some(kept) => {
                error!("Duplicate definition '{}' ignored", definition.name());
                errors.push(RunError::DuplicateDefinition {
                    name: definition.name().to_string(),
                    kept: kept.name().to_string(),
                });
            }
        }
    }

    selected
}

fn emit<T: Serialize>(
    outputs: &mut Vec<GeneratedResource>,
    errors: &mut Vec<RunError>,
    what: &str,
    resource: &T,
    parameters: ResourceParameters,
) {
    match serde_yaml::to_value(resource) {
        Ok(resource) => outputs.push(GeneratedResource { resource, parameters }),
        Err(source) => {
            error!("Failed to encode {}: {}", what, source);
            errors.push(RunError::Encode { what: what.to_string(), source });
        }
    }
}

fn emit_allocation(
    outputs: &mut Vec<GeneratedResource>,
    errors: &mut Vec<RunError>,
    request: &AllocationRequestInfo,
) {
    match request.build_allocation() {
        Ok(allocation) => {
            debug!("Generated allocation {}", allocation.metadata.name);
            emit(
                outputs,
                errors,
                &format!("allocation {}", allocation.metadata.name),
                &allocation,
                ResourceParameters::INTERNAL_CONDITIONED,
            );
        }
        Err(source) => {
            error!("Allocation request '{}' failed: {}", request.name, source);
            errors.push(RunError::Allocation { request: request.name.clone(), source });
        }
    }
}

fn finish(outputs: Vec<GeneratedResource>, errors: Vec<RunError>) -> RunOutput {
    let success = is_success(&errors);
    info!(
        "Run finished: {} resources generated, {} errors recorded, success={}",
        outputs.len(),
        errors.len(),
        success
    );
    RunOutput { outputs, errors, success }
}

/// Run the function over an input bundle
pub fn run(bundle: &ResourceBundle, config: &FunctionConfig) -> RunOutput {
    let mut errors: Vec<RunError> = Vec::new();
    let mut outputs: Vec<GeneratedResource> = Vec::new();

    let mut definition = None;
    let mut classified = Classified::default();

    for tag in bundle.type_tags() {
        match InputKind::from_type_tag(tag) {
            Some(InputKind::Definition) => {
                definition = select_definition(bundle.items_of(InputKind::Definition), &mut errors);
            }
            Some(InputKind::Template) => {
                let (templates, decode_errors) = classify(bundle.items_of(InputKind::Template));
                classified = templates;
                errors.extend(decode_errors);
            }
            None => debug!("Ignoring input kind {}", tag),
        }
    }

    let Some(definition) = definition else {
        error!("No definition found in input");
        errors.push(RunError::MissingDefinition);
        return finish(outputs, errors);
    };

    let fabric = match compose(&definition, &classified.masters, &classified.children) {
        Ok(fabric) => fabric,
        Err(e) => {
            error!("Fabric composition failed: {}", e);
            errors.push(e.into());
            return finish(outputs, errors);
        }
    };

    for node in fabric.nodes() {
        emit(&mut outputs, &mut errors, &format!("node {}", node.name()), node, ResourceParameters::default());
    }
    for link in fabric.links() {
        emit(&mut outputs, &mut errors, &format!("link {}", link.name()), link, ResourceParameters::default());
    }

    let prefix = management_prefix_request(&definition, config);
    emit_allocation(&mut outputs, &mut errors, &prefix);
    for request in node_requests(fabric.nodes(), &definition, config) {
        emit_allocation(&mut outputs, &mut errors, &request);
    }

    finish(outputs, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ANNOTATION_CONDITIONED, ANNOTATION_INTERNAL};

    const DEFINITION: &str = r#"
apiVersion: topo.yndd.io/v1alpha1
kind: Definition
metadata: {name: dc1, namespace: default}
spec:
  properties:
    location: {latitude: "52.37", longitude: "4.89"}
"#;

    fn pod(name: &str, leaves: u32) -> String {
        format!(
            r#"
apiVersion: topo.yndd.io/v1alpha1
kind: Template
metadata: {{name: {name}, namespace: default}}
spec:
  properties:
    fabric:
      tier1: {{num: {leaves}}}
"#
        )
    }

    fn bundle(docs: &[&str]) -> ResourceBundle {
        let items: Vec<serde_yaml::Value> = docs.iter().map(|d| serde_yaml::from_str(d).unwrap()).collect();
        ResourceBundle::from_items(&items)
    }

    fn resources(output: &RunOutput) -> Vec<&serde_yaml::Value> {
        output.outputs.iter().map(|o| &o.resource).collect()
    }

    fn kinds(output: &RunOutput) -> Vec<&str> {
        resources(output).iter().map(|o| o["kind"].as_str().unwrap()).collect()
    }

    fn prefix_requests(output: &RunOutput) -> usize {
        resources(output)
            .iter()
            .filter(|o| o["kind"] == "IPAllocation" && o["spec"]["createPrefix"] == true)
            .count()
    }

    #[test]
    fn test_emission_order() {
        let pod = pod("pod", 2);
        let output = run(&bundle(&[DEFINITION, &pod]), &FunctionConfig::default());

        assert!(output.success);
        assert!(output.errors.is_empty());
        assert_eq!(kinds(&output), vec!["Node", "Node", "IPAllocation", "IPAllocation", "IPAllocation"]);
        let out = resources(&output);
        assert_eq!(out[2]["metadata"]["name"], "dc1.us-central-1.vpc-mgmt-fabric.mgmt");
        assert_eq!(out[3]["spec"]["index"], 0);
        assert_eq!(out[4]["spec"]["index"], 1);
        assert_eq!(out[4]["metadata"]["name"], "dc1-pod1-leaf2.us-central-1.vpc-mgmt-fabric.mgmt");
    }

    #[test]
    fn test_only_allocations_are_internal() {
        let master = r#"
apiVersion: topo.yndd.io/v1alpha1
kind: Template
metadata: {name: master, namespace: default}
spec:
  properties:
    fabric:
      tier3: {num: 1}
      pods:
        - templateRef: {name: pod}
"#;
        let pod = pod("pod", 2);
        let output = run(&bundle(&[DEFINITION, master, &pod]), &FunctionConfig::default());
        assert!(output.success, "errors: {:?}", output.errors);
        assert_eq!(kinds(&output).iter().filter(|k| **k == "Link").count(), 2);

        for generated in &output.outputs {
            let is_allocation = generated.resource["kind"] == "IPAllocation";
            assert_eq!(generated.parameters.internal, is_allocation);
            assert_eq!(generated.parameters.conditioned, is_allocation);

            let item = generated.clone().into_item();
            let annotations = &item["metadata"]["annotations"];
            if is_allocation {
                assert_eq!(annotations[ANNOTATION_INTERNAL], "true");
                assert_eq!(annotations[ANNOTATION_CONDITIONED], "true");
            } else {
                assert!(annotations.is_null());
            }
        }
    }

    #[test]
    fn test_single_prefix_request_for_any_node_count() {
        for leaves in [0usize, 1, 5] {
            let docs: Vec<String> = if leaves == 0 { vec![] } else { vec![pod("pod", leaves as u32)] };
            let mut all: Vec<&str> = vec![DEFINITION];
            all.extend(docs.iter().map(String::as_str));

            let output = run(&bundle(&all), &FunctionConfig::default());
            assert!(output.success, "run with {} nodes failed: {:?}", leaves, output.errors);
            assert_eq!(prefix_requests(&output), 1);
            assert_eq!(output.outputs.len(), leaves + 1 + leaves);
        }
    }

    #[test]
    fn test_missing_definition_fails() {
        let pod = pod("pod", 2);
        let output = run(&bundle(&[&pod]), &FunctionConfig::default());

        assert!(!output.success);
        assert!(output.outputs.is_empty());
        assert!(matches!(output.errors.as_slice(), [RunError::MissingDefinition]));
    }

    #[test]
    fn test_duplicate_definition_first_wins() {
        let second = DEFINITION.replace("name: dc1", "name: dc2");
        let pod = pod("pod", 1);
        let output = run(&bundle(&[DEFINITION, &second, &pod]), &FunctionConfig::default());

        assert!(!output.success);
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(
            &output.errors[0],
            RunError::DuplicateDefinition { name, kept } if name == "dc2" && kept == "dc1"
        ));
        // composition still ran against the first definition
        assert_eq!(output.outputs[0].resource["metadata"]["name"], "dc1-pod1-leaf1");
    }

    #[test]
    fn test_undecodable_definition_is_skipped() {
        let broken = r#"
apiVersion: topo.yndd.io/v1alpha1
kind: Definition
metadata:
  name: [not, a, name]
"#;
        let pod = pod("pod", 1);
        let output = run(&bundle(&[broken, &pod, DEFINITION]), &FunctionConfig::default());

        // the later valid definition governs the run
        assert!(output.success, "errors: {:?}", output.errors);
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(
            output.errors[0],
            RunError::Decode { kind: InputKind::Definition, position: 0, .. }
        ));
        assert!(!output.errors[0].is_fatal());
        assert_eq!(output.outputs[0].resource["metadata"]["name"], "dc1-pod1-leaf1");
    }

    #[test]
    fn test_composition_error_emits_nothing() {
        let master = r#"
apiVersion: topo.yndd.io/v1alpha1
kind: Template
metadata: {name: master, namespace: default}
spec:
  properties:
    fabric:
      pods:
        - templateRef: {name: missing}
"#;
        let output = run(&bundle(&[DEFINITION, master]), &FunctionConfig::default());

        assert!(!output.success);
        assert!(output.outputs.is_empty());
        assert!(matches!(output.errors.as_slice(), [RunError::Compose(_)]));
    }

    #[test]
    fn test_allocation_failure_keeps_topology() {
        let config = FunctionConfig { region: String::new(), ..FunctionConfig::default() };
        let pod = pod("pod", 2);
        let output = run(&bundle(&[DEFINITION, &pod]), &config);

        assert!(!output.success);
        // nodes are still emitted, every allocation failed
        assert_eq!(kinds(&output), vec!["Node", "Node"]);
        assert_eq!(output.errors.len(), 3);
        assert!(output.errors.iter().all(|e| matches!(e, RunError::Allocation { .. })));
    }

    #[test]
    fn test_unknown_kinds_are_ignored() {
        let cm = r#"
apiVersion: v1
kind: ConfigMap
metadata: {name: unrelated}
"#;
        let output = run(&bundle(&[DEFINITION, cm]), &FunctionConfig::default());
        assert!(output.success);
        assert_eq!(kinds(&output), vec!["IPAllocation"]);
    }
}
