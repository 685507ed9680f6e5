//! IP allocation request types.
//!
//! An allocation request is a declarative ask for a prefix or an address,
//! fulfilled by an external IPAM controller. This file defines the emitted
//! `IPAllocation` resource and the deterministic naming of those resources.

use crate::resource::{ObjectMeta, TypeMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const IPAM_API_VERSION: &str = "ipam.nephio.org/v1alpha1";
pub const IP_ALLOCATION_KIND: &str = "IPAllocation";

pub const LABEL_REGION: &str = "nephio.org/region";
pub const LABEL_SITE: &str = "nephio.org/site";
pub const LABEL_PURPOSE: &str = "nephio.org/purpose";
pub const LABEL_AVAILABILITY_ZONE: &str = "nephio.org/availability-zone";

/// Separator between the parts of an allocation name
pub const NAME_DELIMITER: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("allocation request has no base name")]
    MissingName,
    #[error("required label '{0}' is missing")]
    MissingLabel(&'static str),
    #[error("network instance reference has no name")]
    MissingNetworkInstance,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrefixKind {
    Network,
    Loopback,
    Pool,
    Aggregate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInstanceRef {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpAllocationSpec {
    #[serde(rename = "kind")]
    pub prefix_kind: PrefixKind,
    pub network_instance_ref: NetworkInstanceRef,
    pub address_family: AddressFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
    /// Ask the allocator to create the prefix rather than pick from an existing one
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_prefix: bool,
    /// Position of the address within the parent prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// The emitted allocation resource
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpAllocation {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: IpAllocationSpec,
}

/// Intermediate allocation request, rendered into an [`IpAllocation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequestInfo {
    pub name: String,
    pub namespace: String,
    pub spec: IpAllocationSpec,
}

impl AllocationRequestInfo {
    fn label(&self, key: &'static str) -> Result<&str, AllocationError> {
        match self.spec.labels.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(AllocationError::MissingLabel(key)),
        }
    }

    /// Name of the emitted resource.
    ///
    /// `base.region.availabilityZone.networkInstance.purpose` when an
    /// availability zone label is present, `base.region.networkInstance.purpose`
    /// otherwise. Existing allocation consumers key on this name.
    pub fn allocation_name(&self) -> Result<String, AllocationError> {
        if self.name.is_empty() {
            return Err(AllocationError::MissingName);
        }
        let network_instance = self.spec.network_instance_ref.name.as_str();
        if network_instance.is_empty() {
            return Err(AllocationError::MissingNetworkInstance);
        }
        let region = self.label(LABEL_REGION)?;
        let purpose = self.label(LABEL_PURPOSE)?;

        let parts: Vec<&str> = match self.spec.labels.get(LABEL_AVAILABILITY_ZONE) {
            Some(az) => vec![self.name.as_str(), region, az.as_str(), network_instance, purpose],
            None => vec![self.name.as_str(), region, network_instance, purpose],
        };
        Ok(parts.join(NAME_DELIMITER))
    }

    /// Labels set on the emitted resource's metadata.
    ///
    /// Empty for now; naming labels stay in the spec.
    // TODO: add a dependsOn label pointing at the shared prefix allocation once consumers support it
    pub fn metadata_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Render the request into an `IPAllocation` resource
    pub fn build_allocation(&self) -> Result<IpAllocation, AllocationError> {
        let mut metadata = ObjectMeta::new(&self.allocation_name()?, &self.namespace);
        metadata.labels = self.metadata_labels();

        Ok(IpAllocation {
            type_meta: TypeMeta::new(IPAM_API_VERSION, IP_ALLOCATION_KIND),
            metadata,
            spec: self.spec.clone(),
        })
    }
}
