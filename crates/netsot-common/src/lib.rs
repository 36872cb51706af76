//! netsot Common - Shared types, errors, and utilities
//!
//! This crate provides the foundational types used across all netsot components:
//! - Error types and error codes
//! - Content type identifiers
//! - The content-type feature registry
//! - Slug and identifier helpers

pub mod error;
pub mod features;
pub mod utils;

// Re-exports for convenience
pub use error::{AppError, ErrorCode, NetsotError};
pub use features::{Feature, FeatureRegistry};
pub use utils::{is_valid_slug, slugify};

use serde::{Deserialize, Serialize};

/// Default weight assigned to a config context when none is given
pub const DEFAULT_CONFIG_CONTEXT_WEIGHT: u32 = 1000;

/// Default weight assigned to a computed field when none is given
pub const DEFAULT_COMPUTED_FIELD_WEIGHT: u32 = 100;

/// Content types known to the inventory, in `app_label.model` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "dcim.device")]
    Device,
    #[serde(rename = "dcim.devicerole")]
    DeviceRole,
    #[serde(rename = "dcim.platform")]
    Platform,
    #[serde(rename = "dcim.region")]
    Region,
    #[serde(rename = "dcim.site")]
    Site,
    #[serde(rename = "tenancy.tenant")]
    Tenant,
    #[serde(rename = "tenancy.tenantgroup")]
    TenantGroup,
    #[serde(rename = "virtualization.cluster")]
    Cluster,
    #[serde(rename = "virtualization.clustergroup")]
    ClusterGroup,
    #[serde(rename = "virtualization.virtualmachine")]
    VirtualMachine,
    #[serde(rename = "extras.configcontext")]
    ConfigContext,
    #[serde(rename = "extras.tag")]
    Tag,
}

impl ContentType {
    pub const ALL: [ContentType; 12] = [
        ContentType::Device,
        ContentType::DeviceRole,
        ContentType::Platform,
        ContentType::Region,
        ContentType::Site,
        ContentType::Tenant,
        ContentType::TenantGroup,
        ContentType::Cluster,
        ContentType::ClusterGroup,
        ContentType::VirtualMachine,
        ContentType::ConfigContext,
        ContentType::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Device => "dcim.device",
            ContentType::DeviceRole => "dcim.devicerole",
            ContentType::Platform => "dcim.platform",
            ContentType::Region => "dcim.region",
            ContentType::Site => "dcim.site",
            ContentType::Tenant => "tenancy.tenant",
            ContentType::TenantGroup => "tenancy.tenantgroup",
            ContentType::Cluster => "virtualization.cluster",
            ContentType::ClusterGroup => "virtualization.clustergroup",
            ContentType::VirtualMachine => "virtualization.virtualmachine",
            ContentType::ConfigContext => "extras.configcontext",
            ContentType::Tag => "extras.tag",
        }
    }

    /// The `app_label` half of the identifier
    pub fn app_label(&self) -> &'static str {
        self.as_str().split('.').next().unwrap_or_default()
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| format!("Invalid content type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trip() {
        for ct in ContentType::ALL {
            assert_eq!(ct.as_str().parse::<ContentType>().unwrap(), ct);
        }
        assert!("dcim.cable".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_content_type_app_label() {
        assert_eq!(ContentType::Device.app_label(), "dcim");
        assert_eq!(ContentType::VirtualMachine.app_label(), "virtualization");
        assert_eq!(ContentType::Tag.to_string(), "extras.tag");
    }

    #[test]
    fn test_content_type_serde_uses_dotted_name() {
        let json = serde_json::to_string(&ContentType::TenantGroup).unwrap();
        assert_eq!(json, "\"tenancy.tenantgroup\"");
        let parsed: ContentType = serde_json::from_str("\"dcim.site\"").unwrap();
        assert_eq!(parsed, ContentType::Site);
    }
}
