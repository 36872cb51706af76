// Config context resolution service
// Combines association matching, ordering and deep merge over a persistence backend

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use netsot_common::{Feature, NetsotError};
use netsot_persistence::{ConfigContext, ContextData, PersistenceService, TargetAxes, TargetRef};

use crate::association::applicable_contexts;
use crate::index::AssociationIndex;
use crate::merge::{deep_merge, merge};
use crate::ordering::ordered;

/// Merge ordered contexts, then lay local context data on top
fn render_context(contexts: &[&ConfigContext], local: Option<&ContextData>) -> ContextData {
    let mut data = merge(contexts.iter().map(|c| &c.data));
    if let Some(local) = local {
        deep_merge(&mut data, local);
    }
    data
}

#[derive(Clone)]
pub struct ConfigContextService {
    persistence: Arc<dyn PersistenceService>,
}

impl ConfigContextService {
    pub fn new(persistence: Arc<dyn PersistenceService>) -> Self {
        Self { persistence }
    }

    fn resolve(&self, target: TargetRef) -> anyhow::Result<TargetAxes> {
        self.persistence
            .features()
            .require(Feature::ConfigContext, target.kind.content_type())?;

        self.persistence
            .target_axes(target)?
            .ok_or_else(|| NetsotError::TargetNotExist(target.to_string()).into())
    }

    /// Applicable contexts for one target, in merge order
    pub fn get_for_object(&self, target: TargetRef) -> anyhow::Result<Vec<ConfigContext>> {
        let axes = self.resolve(target)?;
        let active = self.persistence.config_context_find_active()?;

        let contexts = ordered(applicable_contexts(&active, &axes));
        debug!(%target, count = contexts.len(), "Resolved applicable config contexts");
        Ok(contexts.into_iter().cloned().collect())
    }

    /// Rendered configuration of one target, local context data included
    pub fn get_config_context(&self, target: TargetRef) -> anyhow::Result<ContextData> {
        let axes = self.resolve(target)?;
        let active = self.persistence.config_context_find_active()?;

        let contexts = ordered(applicable_contexts(&active, &axes));
        Ok(render_context(&contexts, axes.local_context_data.as_ref()))
    }

    /// Rendered configuration for a batch of targets
    ///
    /// Builds one association index for the whole batch. Every target must
    /// exist; the first unknown one fails the call.
    pub fn annotate(
        &self,
        targets: &[TargetRef],
    ) -> anyhow::Result<BTreeMap<TargetRef, ContextData>> {
        let resolved = targets
            .iter()
            .map(|target| self.resolve(*target))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let active = self.persistence.config_context_find_active()?;
        let index = AssociationIndex::build(&active);
        debug!(
            targets = resolved.len(),
            contexts = index.len(),
            "Annotating config contexts"
        );

        Ok(resolved
            .iter()
            .map(|axes| {
                let contexts = index.lookup(axes);
                (
                    axes.target,
                    render_context(&contexts, axes.local_context_data.as_ref()),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use netsot_common::{ContentType, FeatureRegistry};
    use netsot_persistence::{
        Axis, ConfigContextForm, DeviceForm, ExtrasPersistence, MemoryPersistService,
    };
    use serde_json::{Value, json};
    use uuid::Uuid;

    fn setup() -> (MemoryPersistService, TargetRef) {
        let store = MemoryPersistService::default();
        let site = store.site_create("Site-1", None).unwrap();
        let role = store.device_role_create("Role").unwrap();
        let device = store
            .device_create(DeviceForm::new("Device 1", site.id, role.id))
            .unwrap();
        (store, TargetRef::device(device.id))
    }

    #[test]
    fn test_zero_contexts_is_empty_mapping() {
        let (store, target) = setup();
        let service = ConfigContextService::new(Arc::new(store));
        assert!(service.get_config_context(target).unwrap().is_empty());
        assert!(service.get_for_object(target).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_target() {
        let (store, _) = setup();
        let service = ConfigContextService::new(Arc::new(store));
        let missing = TargetRef::device(Uuid::new_v4());

        let err = service.get_config_context(missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NetsotError>(),
            Some(NetsotError::TargetNotExist(_))
        ));
        assert!(service.annotate(&[missing]).is_err());
    }

    #[test]
    fn test_feature_disabled() {
        let mut features = FeatureRegistry::default();
        features.disable(Feature::ConfigContext, ContentType::Device);
        let store = MemoryPersistService::new(features);
        let site = store.site_create("Site-1", None).unwrap();
        let role = store.device_role_create("Role").unwrap();
        let device = store
            .device_create(DeviceForm::new("Device 1", site.id, role.id))
            .unwrap();

        let service = ConfigContextService::new(Arc::new(store));
        let err = service
            .get_config_context(TargetRef::device(device.id))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NetsotError>(),
            Some(NetsotError::FeatureNotEnabled(..))
        ));
    }

    #[test]
    fn test_site_scoped_context() {
        let (store, target) = setup();
        let site = store.site_find_by_name("Site-1").unwrap();
        store
            .config_context_create(
                ConfigContextForm::new("site", 100, json!({"ntp": "10.0.0.1"}))
                    .with(Axis::Site, site.id),
            )
            .unwrap();

        let service = ConfigContextService::new(Arc::new(store));
        assert_eq!(
            Value::Object(service.get_config_context(target).unwrap()),
            json!({"ntp": "10.0.0.1"})
        );
    }
}
