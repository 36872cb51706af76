//! Extras persistence trait
//!
//! Config contexts, tags, and computed fields.

use std::collections::BTreeSet;

use uuid::Uuid;

use netsot_common::ContentType;

use crate::model::{ComputedField, ConfigContext, ConfigContextForm, Tag, TargetRef};

pub trait ExtrasPersistence: Send + Sync {
    /// Validate and store a new config context
    fn config_context_create(&self, form: ConfigContextForm) -> anyhow::Result<ConfigContext>;

    /// Replace every field of an existing config context
    fn config_context_update(
        &self,
        id: Uuid,
        form: ConfigContextForm,
    ) -> anyhow::Result<ConfigContext>;

    fn config_context_delete(&self, id: Uuid) -> anyhow::Result<bool>;

    fn config_context_find_by_name(&self, name: &str) -> anyhow::Result<Option<ConfigContext>>;

    fn config_context_find_all(&self) -> anyhow::Result<Vec<ConfigContext>>;

    /// Every context with `is_active` set, in no particular order
    fn config_context_find_active(&self) -> anyhow::Result<Vec<ConfigContext>>;

    fn tag_find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Tag>>;

    /// Ids of the tags assigned to a target
    fn tags_for(&self, target: TargetRef) -> anyhow::Result<BTreeSet<Uuid>>;

    /// Targets carrying a tag
    fn tagged_with(&self, tag: Uuid) -> anyhow::Result<BTreeSet<TargetRef>>;

    /// Computed fields of a content type ordered by `(weight, slug)`
    fn computed_field_find_by_content_type(
        &self,
        content_type: ContentType,
    ) -> anyhow::Result<Vec<ComputedField>>;
}
