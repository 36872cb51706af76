//! Inverted association index for bulk resolution
//!
//! Built once per batch from the active contexts. Each axis maps a declared
//! value to the positions of the contexts declaring it, and keeps the
//! positions of contexts that leave the axis unconstrained. Looking a target
//! up intersects, per axis, the wildcard positions with the postings of the
//! target's values.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use netsot_persistence::{Axis, ConfigContext, TargetAxes};

use crate::ordering::merge_order;

#[derive(Debug, Default)]
struct AxisPostings {
    /// Key: declared value, Value: context positions
    postings: HashMap<Uuid, Vec<usize>>,
    /// Positions of contexts with nothing declared on this axis
    wildcard: Vec<usize>,
}

#[derive(Debug)]
pub struct AssociationIndex<'a> {
    /// Active contexts in merge order, one entry per id
    contexts: Vec<&'a ConfigContext>,
    axes: HashMap<Axis, AxisPostings>,
}

impl<'a> AssociationIndex<'a> {
    pub fn build<I>(contexts: I) -> Self
    where
        I: IntoIterator<Item = &'a ConfigContext>,
    {
        let mut seen = HashSet::new();
        let mut contexts: Vec<&'a ConfigContext> = contexts
            .into_iter()
            .filter(|c| c.is_active)
            .filter(|c| seen.insert(c.id))
            .collect();
        contexts.sort_by(|a, b| merge_order(a, b));

        let mut axes: HashMap<Axis, AxisPostings> = HashMap::new();
        for axis in Axis::ALL {
            let entry = axes.entry(axis).or_default();
            for (position, context) in contexts.iter().enumerate() {
                let declared = context.associations.get(axis);
                if declared.is_empty() {
                    entry.wildcard.push(position);
                } else {
                    for value in declared {
                        entry.postings.entry(*value).or_default().push(position);
                    }
                }
            }
        }

        Self { contexts, axes }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Contexts applicable to `target`, already in merge order
    pub fn lookup(&self, target: &TargetAxes) -> Vec<&'a ConfigContext> {
        let mut alive = vec![true; self.contexts.len()];

        for axis in Axis::ALL {
            if !axis.applies_to(target.target.kind) {
                continue;
            }
            let Some(entry) = self.axes.get(&axis) else {
                continue;
            };

            let mut matched = vec![false; self.contexts.len()];
            for position in &entry.wildcard {
                matched[*position] = true;
            }
            for value in target.values(axis) {
                if let Some(positions) = entry.postings.get(&value) {
                    for position in positions {
                        matched[*position] = true;
                    }
                }
            }

            for (keep, hit) in alive.iter_mut().zip(matched) {
                *keep &= hit;
            }
        }

        alive
            .into_iter()
            .zip(&self.contexts)
            .filter_map(|(keep, context)| keep.then_some(*context))
            .collect()
    }
}
