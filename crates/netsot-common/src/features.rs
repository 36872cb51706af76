//! Content-type feature registry
//!
//! Records which content types take part in each extensibility feature
//! (config contexts, custom/computed fields, tags). The registry is built once
//! from configuration and handed to the store and services that need it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{ContentType, NetsotError};

/// Extensibility features gated per content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ConfigContext,
    CustomFields,
    Tags,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::ConfigContext, Feature::CustomFields, Feature::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ConfigContext => "config_context",
            Feature::CustomFields => "custom_fields",
            Feature::Tags => "tags",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config_context" => Ok(Feature::ConfigContext),
            "custom_fields" => Ok(Feature::CustomFields),
            "tags" => Ok(Feature::Tags),
            _ => Err(format!("Invalid feature: {}", s)),
        }
    }
}

/// Explicit mapping from feature to the content types that support it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRegistry {
    features: BTreeMap<Feature, BTreeSet<ContentType>>,
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        let targets = [ContentType::Device, ContentType::VirtualMachine];
        let organizational = [
            ContentType::Device,
            ContentType::VirtualMachine,
            ContentType::Site,
            ContentType::Region,
            ContentType::Tenant,
            ContentType::TenantGroup,
            ContentType::Cluster,
            ContentType::ClusterGroup,
            ContentType::Platform,
            ContentType::DeviceRole,
        ];

        Self::empty()
            .with(Feature::ConfigContext, targets)
            .with(Feature::CustomFields, organizational)
            .with(
                Feature::Tags,
                [
                    ContentType::Device,
                    ContentType::VirtualMachine,
                    ContentType::Site,
                    ContentType::Tenant,
                    ContentType::Cluster,
                ],
            )
    }
}

impl FeatureRegistry {
    /// A registry with every feature disabled
    pub fn empty() -> Self {
        Self {
            features: BTreeMap::new(),
        }
    }

    /// Builder-style variant of [`FeatureRegistry::enable`]
    pub fn with(
        mut self,
        feature: Feature,
        content_types: impl IntoIterator<Item = ContentType>,
    ) -> Self {
        for ct in content_types {
            self.enable(feature, ct);
        }
        self
    }

    pub fn enable(&mut self, feature: Feature, content_type: ContentType) {
        self.features.entry(feature).or_default().insert(content_type);
    }

    pub fn disable(&mut self, feature: Feature, content_type: ContentType) {
        if let Some(types) = self.features.get_mut(&feature) {
            types.remove(&content_type);
        }
    }

    /// Replace the content types of one feature wholesale
    pub fn set(&mut self, feature: Feature, content_types: impl IntoIterator<Item = ContentType>) {
        self.features.insert(feature, content_types.into_iter().collect());
    }

    pub fn is_enabled(&self, feature: Feature, content_type: ContentType) -> bool {
        self.features
            .get(&feature)
            .is_some_and(|types| types.contains(&content_type))
    }

    /// Content types enabled for a feature, in stable order
    pub fn content_types(&self, feature: Feature) -> Vec<ContentType> {
        self.features
            .get(&feature)
            .map(|types| types.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Fail with `FeatureNotEnabled` when the content type lacks the feature
    pub fn require(&self, feature: Feature, content_type: ContentType) -> Result<(), NetsotError> {
        if self.is_enabled(feature, content_type) {
            Ok(())
        } else {
            Err(NetsotError::FeatureNotEnabled(
                feature.to_string(),
                content_type.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = FeatureRegistry::default();
        assert!(registry.is_enabled(Feature::ConfigContext, ContentType::Device));
        assert!(registry.is_enabled(Feature::ConfigContext, ContentType::VirtualMachine));
        assert!(!registry.is_enabled(Feature::ConfigContext, ContentType::Site));
        assert!(registry.is_enabled(Feature::CustomFields, ContentType::Site));
        assert!(!registry.is_enabled(Feature::CustomFields, ContentType::Tag));
    }

    #[test]
    fn test_enable_disable() {
        let mut registry = FeatureRegistry::empty();
        assert!(!registry.is_enabled(Feature::Tags, ContentType::Device));

        registry.enable(Feature::Tags, ContentType::Device);
        assert!(registry.is_enabled(Feature::Tags, ContentType::Device));

        registry.disable(Feature::Tags, ContentType::Device);
        assert!(!registry.is_enabled(Feature::Tags, ContentType::Device));
        assert!(registry.content_types(Feature::Tags).is_empty());
    }

    #[test]
    fn test_require() {
        let registry = FeatureRegistry::empty().with(Feature::CustomFields, [ContentType::Device]);
        assert!(registry.require(Feature::CustomFields, ContentType::Device).is_ok());

        let err = registry
            .require(Feature::CustomFields, ContentType::Tag)
            .unwrap_err();
        assert!(matches!(err, NetsotError::FeatureNotEnabled(..)));
    }

    #[test]
    fn test_set_replaces() {
        let mut registry = FeatureRegistry::default();
        registry.set(Feature::ConfigContext, [ContentType::Device]);
        assert_eq!(
            registry.content_types(Feature::ConfigContext),
            vec![ContentType::Device]
        );
    }

    #[test]
    fn test_feature_from_str() {
        assert_eq!("tags".parse::<Feature>().unwrap(), Feature::Tags);
        assert!("graphs".parse::<Feature>().is_err());
    }
}
