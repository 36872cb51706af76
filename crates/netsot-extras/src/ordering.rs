//! Merge ordering of config contexts
//!
//! Contexts merge in `(weight, name)` ascending order, so heavier contexts and
//! lexicographically later names land on top.

use std::cmp::Ordering;

use netsot_persistence::ConfigContext;

pub fn merge_order(a: &ConfigContext, b: &ConfigContext) -> Ordering {
    a.weight
        .cmp(&b.weight)
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort contexts into merge order; earlier entries are overridden by later ones
pub fn ordered<'a>(mut contexts: Vec<&'a ConfigContext>) -> Vec<&'a ConfigContext> {
    contexts.sort_by(|a, b| merge_order(a, b));
    contexts
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use netsot_persistence::ContextAssociations;
    use serde_json::Map;
    use uuid::Uuid;

    fn context(name: &str, weight: u32) -> ConfigContext {
        ConfigContext {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            weight,
            is_active: true,
            data: Map::new(),
            associations: ContextAssociations::default(),
            created: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    fn names(contexts: Vec<&ConfigContext>) -> Vec<&str> {
        contexts.into_iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_weight_then_name() {
        let a = context("context 2", 100);
        let b = context("context 1", 100);
        let c = context("context 0", 101);
        let d = context("zzz", 50);

        assert_eq!(
            names(ordered(vec![&a, &b, &c, &d])),
            vec!["zzz", "context 1", "context 2", "context 0"]
        );
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let a = context("same", 10);
        let b = context("same", 10);
        let sorted = ordered(vec![&a, &b]);
        assert_eq!(sorted[0].id, a.id);
        assert_eq!(sorted[1].id, b.id);
    }

    #[test]
    fn test_name_is_case_sensitive_bytewise() {
        let upper = context("Beta", 1);
        let lower = context("alpha", 1);
        assert_eq!(names(ordered(vec![&lower, &upper])), vec!["Beta", "alpha"]);
    }
}
