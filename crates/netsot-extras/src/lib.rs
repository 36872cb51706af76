//! netsot Extras - Config context resolution and computed fields
//!
//! This crate provides:
//! - Per-object config context applicability across association axes
//! - `(weight, name)` merge ordering
//! - Deep merge of context data
//! - An inverted association index for bulk annotation
//! - `ConfigContextService` and `ComputedFieldService` over a persistence backend

pub mod association;
pub mod computed_field;
pub mod index;
pub mod merge;
pub mod ordering;
pub mod service;

pub use association::{applicable_contexts, is_applicable};
pub use computed_field::{ComputedFieldService, RenderError, RenderedField, render, render_template};
pub use index::AssociationIndex;
pub use merge::{deep_merge, merge};
pub use ordering::{merge_order, ordered};
pub use service::ConfigContextService;
