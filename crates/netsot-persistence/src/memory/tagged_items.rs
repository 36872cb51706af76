//! Tag join index
//!
//! Explicit two-way index between tags and the targets that carry them.

use std::collections::BTreeSet;

use dashmap::DashMap;
use uuid::Uuid;

use crate::model::TargetRef;

#[derive(Debug, Default)]
pub struct TaggedItemIndex {
    /// Key: tag id, Value: targets carrying the tag
    by_tag: DashMap<Uuid, BTreeSet<TargetRef>>,
    /// Key: target, Value: ids of its tags
    by_object: DashMap<TargetRef, BTreeSet<Uuid>>,
}

impl TaggedItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the assignment; returns false if it already existed
    pub fn assign(&self, target: TargetRef, tag: Uuid) -> bool {
        let added = self.by_object.entry(target).or_default().insert(tag);
        self.by_tag.entry(tag).or_default().insert(target);
        added
    }

    pub fn remove(&self, target: TargetRef, tag: Uuid) -> bool {
        let removed = self
            .by_object
            .get_mut(&target)
            .is_some_and(|mut tags| tags.remove(&tag));
        if let Some(mut targets) = self.by_tag.get_mut(&tag) {
            targets.remove(&target);
        }
        removed
    }

    /// Drop every row that references the target
    pub fn remove_target(&self, target: TargetRef) {
        if let Some((_, tags)) = self.by_object.remove(&target) {
            for tag in tags {
                if let Some(mut targets) = self.by_tag.get_mut(&tag) {
                    targets.remove(&target);
                }
            }
        }
    }

    pub fn tags_for(&self, target: TargetRef) -> BTreeSet<Uuid> {
        self.by_object
            .get(&target)
            .map(|tags| tags.clone())
            .unwrap_or_default()
    }

    pub fn tagged_with(&self, tag: Uuid) -> BTreeSet<TargetRef> {
        self.by_tag
            .get(&tag)
            .map(|targets| targets.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_is_idempotent() {
        let index = TaggedItemIndex::new();
        let target = TargetRef::device(Uuid::new_v4());
        let tag = Uuid::new_v4();

        assert!(index.assign(target, tag));
        assert!(!index.assign(target, tag));
        assert_eq!(index.tags_for(target).len(), 1);
        assert_eq!(index.tagged_with(tag).len(), 1);
    }

    #[test]
    fn test_remove() {
        let index = TaggedItemIndex::new();
        let target = TargetRef::device(Uuid::new_v4());
        let tag = Uuid::new_v4();

        index.assign(target, tag);
        assert!(index.remove(target, tag));
        assert!(!index.remove(target, tag));
        assert!(index.tags_for(target).is_empty());
        assert!(index.tagged_with(tag).is_empty());
    }

    #[test]
    fn test_remove_target() {
        let index = TaggedItemIndex::new();
        let target = TargetRef::virtual_machine(Uuid::new_v4());
        let tag1 = Uuid::new_v4();
        let tag2 = Uuid::new_v4();

        index.assign(target, tag1);
        index.assign(target, tag2);
        index.remove_target(target);

        assert!(index.tags_for(target).is_empty());
        assert!(index.tagged_with(tag1).is_empty());
        assert!(index.tagged_with(tag2).is_empty());
    }
}
