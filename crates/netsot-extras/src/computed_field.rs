//! Computed field rendering
//!
//! Templates reference the object through `{{ obj.<path> }}` placeholders,
//! where `<path>` is a dotted walk through the object's JSON view. Numeric
//! segments index into lists. A placeholder that cannot be resolved, or a
//! template with stray braces, renders the field's fallback value instead.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use netsot_common::{ContentType, Feature, NetsotError};
use netsot_persistence::{ComputedField, PersistenceService, TargetRef};

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("Invalid placeholder regex pattern"));

static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^obj((?:\.[\w-]+)+)$").expect("Invalid placeholder path regex pattern")
});

/// Why a template could not be rendered
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("malformed template")]
    Malformed,

    #[error("unresolved placeholder '{0}'")]
    Unresolved(String),
}

fn lookup<'v>(view: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(view, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a template against an object view
pub fn render_template(template: &str, view: &Value) -> Result<String, RenderError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for captures in PLACEHOLDER_PATTERN.captures_iter(template) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            return Err(RenderError::Malformed);
        };
        let expr = inner.as_str().trim();
        let path = PATH_PATTERN
            .captures(expr)
            .and_then(|c| c.get(1))
            .ok_or_else(|| RenderError::Unresolved(expr.to_string()))?;
        let value =
            lookup(view, path.as_str()).ok_or_else(|| RenderError::Unresolved(expr.to_string()))?;

        let literal = &template[last..whole.start()];
        if literal.contains("{{") || literal.contains("}}") {
            return Err(RenderError::Malformed);
        }
        rendered.push_str(literal);
        rendered.push_str(&to_text(value));
        last = whole.end();
    }

    let tail = &template[last..];
    if tail.contains("{{") || tail.contains("}}") {
        return Err(RenderError::Malformed);
    }
    rendered.push_str(tail);
    Ok(rendered)
}

/// Render a field, falling back to its `fallback_value` on any failure
pub fn render(field: &ComputedField, view: &Value) -> String {
    match render_template(&field.template, view) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                field = %field.slug,
                error = %e,
                "Failed to render computed field, using fallback"
            );
            field.fallback_value.clone()
        }
    }
}

/// A computed field paired with its rendered value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    pub slug: String,
    pub label: String,
    pub value: String,
}

#[derive(Clone)]
pub struct ComputedFieldService {
    persistence: Arc<dyn PersistenceService>,
}

impl ComputedFieldService {
    pub fn new(persistence: Arc<dyn PersistenceService>) -> Self {
        Self { persistence }
    }

    /// Fields defined for a content type, ordered by `(weight, slug)`
    pub fn computed_fields_for(
        &self,
        content_type: ContentType,
    ) -> anyhow::Result<Vec<ComputedField>> {
        self.persistence
            .features()
            .require(Feature::CustomFields, content_type)?;
        self.persistence
            .computed_field_find_by_content_type(content_type)
    }

    /// Render every computed field of a target's content type
    pub fn render_for(&self, target: TargetRef) -> anyhow::Result<Vec<RenderedField>> {
        let fields = self.computed_fields_for(target.kind.content_type())?;
        let view = self
            .persistence
            .target_view(target)?
            .ok_or_else(|| NetsotError::TargetNotExist(target.to_string()))?;

        Ok(fields
            .iter()
            .map(|field| RenderedField {
                slug: field.slug.clone(),
                label: field.label.clone(),
                value: render(field, &view),
            })
            .collect())
    }
}
