//! Allocation request construction.
//!
//! One shared management prefix is requested per fabric, plus one address
//! per node out of that prefix. The per-node index is the node's position in
//! the fabric node sequence, which is what gives every node a distinct
//! address from the shared pool.

use super::allocation::{
    AddressFamily, AllocationRequestInfo, IpAllocationSpec, NetworkInstanceRef, PrefixKind,
    LABEL_AVAILABILITY_ZONE, LABEL_PURPOSE, LABEL_REGION, LABEL_SITE,
};
use crate::config::FunctionConfig;
use crate::topology::{Definition, Node};
use std::collections::BTreeMap;

/// Labels from which allocation names are derived
pub fn naming_labels(config: &FunctionConfig) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(LABEL_REGION.to_string(), config.region.clone());
    labels.insert(LABEL_SITE.to_string(), config.site.clone());
    labels.insert(LABEL_PURPOSE.to_string(), config.purpose.clone());
    if let Some(az) = &config.availability_zone {
        labels.insert(LABEL_AVAILABILITY_ZONE.to_string(), az.clone());
    }
    labels
}

fn network_instance_ref(definition: &Definition, config: &FunctionConfig) -> NetworkInstanceRef {
    NetworkInstanceRef {
        name: config.network_instance.clone(),
        namespace: definition.namespace().to_string(),
    }
}

/// Request for the fabric-wide management prefix
pub fn management_prefix_request(definition: &Definition, config: &FunctionConfig) -> AllocationRequestInfo {
    AllocationRequestInfo {
        name: definition.name().to_string(),
        namespace: definition.namespace().to_string(),
        spec: IpAllocationSpec {
            prefix_kind: PrefixKind::Loopback,
            network_instance_ref: network_instance_ref(definition, config),
            address_family: AddressFamily::Ipv4,
            prefix_length: Some(config.prefix_length),
            create_prefix: true,
            index: None,
            labels: naming_labels(config),
        },
    }
}

/// Request for the management address of the node at `index` in the fabric
pub fn node_request(
    node: &Node,
    index: u32,
    definition: &Definition,
    config: &FunctionConfig,
) -> AllocationRequestInfo {
    AllocationRequestInfo {
        name: node.name().to_string(),
        namespace: definition.namespace().to_string(),
        spec: IpAllocationSpec {
            prefix_kind: PrefixKind::Loopback,
            network_instance_ref: network_instance_ref(definition, config),
            address_family: AddressFamily::Ipv4,
            prefix_length: None,
            create_prefix: false,
            index: Some(index),
            labels: naming_labels(config),
        },
    }
}

/// Requests for every node, indexed by node position
pub fn node_requests(
    nodes: &[Node],
    definition: &Definition,
    config: &FunctionConfig,
) -> Vec<AllocationRequestInfo> {
    nodes
        .iter()
        .zip(0u32..)
        .map(|(node, index)| node_request(node, index, definition, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::compose;

    fn definition() -> Definition {
        serde_yaml::from_str(
            r#"
metadata: {name: dc1, namespace: fabric}
spec:
  properties:
    location: {latitude: "1", longitude: "2"}
"#,
        )
        .unwrap()
    }

    fn nodes(leaves: u32) -> Vec<Node> {
        let child = serde_yaml::from_str(&format!(
            "metadata: {{name: pod}}\nspec: {{properties: {{fabric: {{tier1: {{num: {}}}}}}}}}",
            leaves
        ))
        .unwrap();
        compose(&definition(), &[], &[child]).unwrap().nodes().to_vec()
    }

    #[test]
    fn test_management_prefix_request() {
        let req = management_prefix_request(&definition(), &FunctionConfig::default());

        assert_eq!(req.name, "dc1");
        assert_eq!(req.namespace, "fabric");
        assert_eq!(req.spec.prefix_kind, PrefixKind::Loopback);
        assert_eq!(req.spec.network_instance_ref.name, "vpc-mgmt-fabric");
        assert_eq!(req.spec.network_instance_ref.namespace, "fabric");
        assert_eq!(req.spec.prefix_length, Some(24));
        assert_eq!(req.spec.address_family, AddressFamily::Ipv4);
        assert!(req.spec.create_prefix);
        assert_eq!(req.spec.index, None);
        assert_eq!(req.spec.labels.get(LABEL_REGION).map(String::as_str), Some("us-central-1"));
        assert_eq!(req.spec.labels.get(LABEL_SITE).map(String::as_str), Some("edge1"));
        assert_eq!(req.spec.labels.get(LABEL_PURPOSE).map(String::as_str), Some("mgmt"));
        assert_eq!(req.allocation_name().unwrap(), "dc1.us-central-1.vpc-mgmt-fabric.mgmt");
    }

    #[test]
    fn test_node_request_index_matches_position() {
        let nodes = nodes(4);
        let requests = node_requests(&nodes, &definition(), &FunctionConfig::default());

        assert_eq!(requests.len(), nodes.len());
        for (position, (req, node)) in requests.iter().zip(&nodes).enumerate() {
            assert_eq!(req.spec.index, Some(position as u32));
            assert_eq!(req.name, node.name());
            assert_eq!(req.spec.prefix_length, None);
            assert!(!req.spec.create_prefix);
        }
        assert_eq!(
            requests[2].allocation_name().unwrap(),
            "dc1-pod1-leaf3.us-central-1.vpc-mgmt-fabric.mgmt"
        );
    }

    #[test]
    fn test_availability_zone_enters_name() {
        let config = FunctionConfig {
            availability_zone: Some("az1".to_string()),
            ..FunctionConfig::default()
        };
        let nodes = nodes(1);
        let req = node_request(&nodes[0], 0, &definition(), &config);
        assert_eq!(req.allocation_name().unwrap(), "dc1-pod1-leaf1.us-central-1.az1.vpc-mgmt-fabric.mgmt");
    }
}
