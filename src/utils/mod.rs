//! Shared utilities: name and value validation.

pub mod validation;

pub use validation::{validate_dns_label, validate_ipv4_prefix_length};
