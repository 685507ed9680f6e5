//! IP allocation request module.
//!
//! This module builds the management IP allocation requests for a composed
//! fabric: one shared prefix per fabric and one indexed address per node.
//! Requests are only emitted here; an external IPAM controller fulfills them.

pub mod allocation;
pub mod builder;

// Re-export commonly used types
pub use allocation::{AllocationError, AllocationRequestInfo, IpAllocation, IpAllocationSpec, PrefixKind};
pub use builder::{management_prefix_request, node_request, node_requests};
