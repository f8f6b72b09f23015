//! Children waiting on a parent that has not been spawned yet.
//!
//! Invariant: an entity is parked here iff its parent is absent from the
//! ledger. The orchestrator drains a parent's list the moment the parent is
//! marked, so no list outlives its parent's arrival.

use crate::error::{ReplicationError, ReplicationResult};
use std::collections::HashMap;
use undertow_shared::{Entity, EntityId};

/// Parent id → children awaiting that parent, in arrival order.
#[derive(Debug, Default)]
pub struct PendingDependencyQueue {
    by_parent: HashMap<EntityId, Vec<Entity>>,
}

impl PendingDependencyQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `entity` under its parent id.
    ///
    /// # Errors
    ///
    /// [`ReplicationError::NoParent`] if `entity.parent_id` is unset.
    pub fn enqueue(&mut self, entity: Entity) -> ReplicationResult<()> {
        let parent_id = entity.parent_id.ok_or(ReplicationError::NoParent(entity.id))?;
        self.by_parent.entry(parent_id).or_default().push(entity);
        Ok(())
    }

    /// Removes and returns everything waiting on `parent_id`.
    pub fn drain(&mut self, parent_id: EntityId) -> Vec<Entity> {
        self.by_parent.remove(&parent_id).unwrap_or_default()
    }

    /// Puts `children` back at the front of `parent_id`'s list, ahead of
    /// anything parked since they were drained.
    pub fn restore(&mut self, parent_id: EntityId, children: Vec<Entity>) {
        if children.is_empty() {
            return;
        }
        let waiting = self.by_parent.entry(parent_id).or_default();
        waiting.splice(0..0, children);
    }

    /// Returns true if anything waits on `parent_id`.
    #[must_use]
    pub fn is_waiting(&self, parent_id: EntityId) -> bool {
        self.by_parent.contains_key(&parent_id)
    }

    /// Total number of parked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_parent.values().map(Vec::len).sum()
    }

    /// Number of distinct parents being waited on.
    #[must_use]
    pub fn parent_count(&self) -> usize {
        self.by_parent.len()
    }

    /// Returns true if nothing is parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_parent.is_empty()
    }

    /// Drops every parked entity.
    pub fn clear(&mut self) {
        self.by_parent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use undertow_shared::Kind;

    fn child(n: u128, parent: u128) -> Entity {
        Entity::new(EntityId::from_u128(n), Kind::InventoryItem).with_parent(EntityId::from_u128(parent))
    }

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = PendingDependencyQueue::new();
        assert_eq!(queue.enqueue(child(2, 1)), Ok(()));
        assert_eq!(queue.enqueue(child(3, 1)), Ok(()));
        assert_eq!(queue.enqueue(child(4, 9)), Ok(()));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.parent_count(), 2);

        let released: Vec<_> = queue.drain(EntityId::from_u128(1)).into_iter().map(|e| e.id).collect();
        assert_eq!(released, vec![EntityId::from_u128(2), EntityId::from_u128(3)]);
        assert!(!queue.is_waiting(EntityId::from_u128(1)));
        assert!(queue.is_waiting(EntityId::from_u128(9)));
    }

    #[test]
    fn test_drain_unknown_parent_is_empty() {
        let mut queue = PendingDependencyQueue::new();
        assert!(queue.drain(EntityId::from_u128(1)).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enqueue_without_parent() {
        let mut queue = PendingDependencyQueue::new();
        let orphan = Entity::new(EntityId::from_u128(5), Kind::World);

        assert_eq!(
            queue.enqueue(orphan),
            Err(ReplicationError::NoParent(EntityId::from_u128(5)))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_restore_goes_ahead_of_newcomers() {
        let mut queue = PendingDependencyQueue::new();
        assert_eq!(queue.enqueue(child(2, 1)), Ok(()));
        assert_eq!(queue.enqueue(child(3, 1)), Ok(()));

        let mut drained = queue.drain(EntityId::from_u128(1));
        drained.remove(0);
        assert_eq!(queue.enqueue(child(4, 1)), Ok(()));
        queue.restore(EntityId::from_u128(1), drained);
        queue.restore(EntityId::from_u128(7), Vec::new());

        let order: Vec<_> = queue.drain(EntityId::from_u128(1)).into_iter().map(|e| e.id).collect();
        assert_eq!(order, vec![EntityId::from_u128(3), EntityId::from_u128(4)]);
        assert!(!queue.is_waiting(EntityId::from_u128(7)));
    }
}
