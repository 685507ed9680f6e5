//! Function configuration.
//!
//! Settings that shape the generated allocation requests. They are read from
//! the `data` of the ConfigMap passed as `ResourceList.functionConfig`; every
//! setting falls back to the management-network defaults when absent.

use crate::utils::validation::{validate_dns_label, validate_ipv4_prefix_length};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_NETWORK_INSTANCE: &str = "vpc-mgmt-fabric";
pub const DEFAULT_REGION: &str = "us-central-1";
pub const DEFAULT_SITE: &str = "edge1";
pub const DEFAULT_PURPOSE: &str = "mgmt";
pub const DEFAULT_PREFIX_LENGTH: u8 = 24;

/// Settings for the management allocation requests
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    /// Network instance the management prefix is allocated from
    pub network_instance: String,
    pub region: String,
    pub site: String,
    pub purpose: String,
    /// Included in allocation names when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Length of the shared management prefix
    pub prefix_length: u8,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            network_instance: DEFAULT_NETWORK_INSTANCE.to_string(),
            region: DEFAULT_REGION.to_string(),
            site: DEFAULT_SITE.to_string(),
            purpose: DEFAULT_PURPOSE.to_string(),
            availability_zone: None,
            prefix_length: DEFAULT_PREFIX_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid network instance: {0}")]
    InvalidNetworkInstance(String),
    #[error("Invalid label configuration: {0}")]
    InvalidLabel(String),
    #[error("Invalid prefix length: {0}")]
    InvalidPrefixLength(String),
    #[error("Invalid function config: {0}")]
    InvalidFunctionConfig(String),
}

impl FunctionConfig {
    /// Build a configuration from ConfigMap-style `data`, on top of the defaults
    pub fn from_data(data: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let mut config = FunctionConfig::default();

        for (key, value) in data {
            match key.as_str() {
                "networkInstance" => config.network_instance = value.clone(),
                "region" => config.region = value.clone(),
                "site" => config.site = value.clone(),
                "purpose" => config.purpose = value.clone(),
                "availabilityZone" => {
                    config.availability_zone = if value.is_empty() { None } else { Some(value.clone()) };
                }
                "prefixLength" => {
                    config.prefix_length = value.trim().parse::<u8>().map_err(|_| {
                        ValidationError::InvalidPrefixLength(format!("'{}' is not a number", value))
                    })?;
                }
                other => {
                    log::warn!("Ignoring unknown function config key '{}'", other);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dns_label(&self.network_instance).map_err(|reason| {
            ValidationError::InvalidNetworkInstance(format!("'{}': {}", self.network_instance, reason))
        })?;

        if self.region.is_empty() {
            return Err(ValidationError::InvalidLabel("region cannot be empty".to_string()));
        }
        if self.purpose.is_empty() {
            return Err(ValidationError::InvalidLabel("purpose cannot be empty".to_string()));
        }

        validate_ipv4_prefix_length(self.prefix_length).map_err(ValidationError::InvalidPrefixLength)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = FunctionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network_instance, "vpc-mgmt-fabric");
        assert_eq!(config.region, "us-central-1");
        assert_eq!(config.site, "edge1");
        assert_eq!(config.purpose, "mgmt");
        assert_eq!(config.prefix_length, 24);
        assert!(config.availability_zone.is_none());
    }

    #[test]
    fn test_from_data_overrides() {
        let config = FunctionConfig::from_data(&data(&[
            ("networkInstance", "vpc-oob"),
            ("region", "eu-west-1"),
            ("availabilityZone", "az1"),
            ("prefixLength", "22"),
            ("somethingElse", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.network_instance, "vpc-oob");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.availability_zone.as_deref(), Some("az1"));
        assert_eq!(config.prefix_length, 22);
        assert_eq!(config.site, DEFAULT_SITE);
    }

    #[test]
    fn test_invalid_prefix_length() {
        let err = FunctionConfig::from_data(&data(&[("prefixLength", "40")])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrefixLength(_)));

        let err = FunctionConfig::from_data(&data(&[("prefixLength", "wide")])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrefixLength(_)));
    }

    #[test]
    fn test_invalid_network_instance() {
        let err = FunctionConfig::from_data(&data(&[("networkInstance", "VPC_MGMT")])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidNetworkInstance(_)));
    }

    #[test]
    fn test_empty_region_rejected() {
        let err = FunctionConfig::from_data(&data(&[("region", "")])).unwrap_err();
        assert_eq!(err, ValidationError::InvalidLabel("region cannot be empty".to_string()));
    }
}
