//! Validation utilities.
//!
//! This module provides validation functions for names and values that end
//! up in generated resources.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of a DNS-1123 label
pub const DNS_LABEL_MAX_LEN: usize = 63;

fn dns_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("DNS label pattern is valid")
    })
}

/// Validate that a name is a DNS-1123 label
///
/// Generated node names and network instance names must be usable as
/// resource names, so they are restricted to lowercase alphanumerics and
/// '-', starting and ending with an alphanumeric, at most 63 characters.
///
/// # Arguments
/// * `name` - The name to validate
///
/// # Returns
/// * `Ok(())` if the name is a valid label
/// * `Err(String)` with the reason otherwise
///
/// # Examples
/// ```
/// use fabricgen::utils::validation::validate_dns_label;
///
/// assert!(validate_dns_label("dc1-pod1-leaf1").is_ok());
/// assert!(validate_dns_label("DC1").is_err());
/// assert!(validate_dns_label("-leaf").is_err());
/// ```
pub fn validate_dns_label(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if name.len() > DNS_LABEL_MAX_LEN {
        return Err(format!(
            "name is {} characters long (max {})",
            name.len(),
            DNS_LABEL_MAX_LEN
        ));
    }
    if !dns_label_regex().is_match(name) {
        return Err(
            "must consist of lowercase alphanumeric characters or '-', and start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Validate an IPv4 prefix length
///
/// # Examples
/// ```
/// use fabricgen::utils::validation::validate_ipv4_prefix_length;
///
/// assert!(validate_ipv4_prefix_length(24).is_ok());
/// assert!(validate_ipv4_prefix_length(0).is_err());
/// assert!(validate_ipv4_prefix_length(33).is_err());
/// ```
pub fn validate_ipv4_prefix_length(prefix_length: u8) -> Result<(), String> {
    if prefix_length == 0 || prefix_length > 32 {
        return Err(format!(
            "prefix length {} out of valid range (must be 1-32)",
            prefix_length
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_label_accepts_generated_names() {
        for name in ["dc1", "dc1-superspine1", "dc1-pod12-leaf4", "vpc-mgmt-fabric", "0a"] {
            assert!(validate_dns_label(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_dns_label_rejects_invalid_names() {
        for name in ["", "Leaf1", "leaf_1", "leaf-", "leaf.1", "a b"] {
            assert!(validate_dns_label(name).is_err(), "{:?} should be invalid", name);
        }
    }

    #[test]
    fn test_dns_label_length_limit() {
        let ok = "a".repeat(DNS_LABEL_MAX_LEN);
        let too_long = "a".repeat(DNS_LABEL_MAX_LEN + 1);
        assert!(validate_dns_label(&ok).is_ok());
        let err = validate_dns_label(&too_long).unwrap_err();
        assert!(err.contains("64 characters"));
    }
}
