//! Per-object config context applicability
//!
//! A context applies to a target when every axis it constrains matches one of
//! the target's values on that axis. Unconstrained axes are wildcards.

use std::collections::HashSet;

use netsot_persistence::{Axis, ConfigContext, TargetAxes};

/// Whether one axis of `context` admits the target
pub fn axis_matches(context: &ConfigContext, axis: Axis, target: &TargetAxes) -> bool {
    if !axis.applies_to(target.target.kind) {
        return true;
    }

    let declared = context.associations.get(axis);
    if declared.is_empty() {
        return true;
    }

    // Regions carry the ancestor chain and tags are a set; any overlap is a match
    target.values(axis).iter().any(|value| declared.contains(value))
}

pub fn is_applicable(context: &ConfigContext, target: &TargetAxes) -> bool {
    context.is_active
        && Axis::ALL
            .iter()
            .all(|axis| axis_matches(context, *axis, target))
}

/// Filter `contexts` down to the ones applicable to `target`
///
/// Contexts sharing an id are kept once, in first-seen order.
pub fn applicable_contexts<'a, I>(contexts: I, target: &TargetAxes) -> Vec<&'a ConfigContext>
where
    I: IntoIterator<Item = &'a ConfigContext>,
{
    let mut seen = HashSet::new();
    contexts
        .into_iter()
        .filter(|context| is_applicable(context, target))
        .filter(|context| seen.insert(context.id))
        .collect()
}
