//! Deferred world mutations requested while a tick is running.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;

use crate::body::EntityDesc;
use crate::types::{Action, EntityId};

/// A mutation applied when the current tick completes.
#[derive(Debug)]
pub enum Change {
    Spawn(EntityDesc),
    Despawn(EntityId),
    Action(EntityId, Action),
    Teleport(EntityId, Vec2),
}

/// Shared handle to the world's pending-change buffer.
///
/// Listeners cannot borrow the world, so they capture a clone of this handle
/// and queue their changes; the world flushes them in request order at the
/// end of [`crate::PhysicsWorldApi::resolve_tick`].
#[derive(Clone, Debug, Default)]
pub struct ChangeQueue {
    inner: Rc<RefCell<VecDeque<Change>>>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, change: Change) {
        self.inner.borrow_mut().push_back(change);
    }

    pub fn spawn(&self, desc: EntityDesc) {
        self.push(Change::Spawn(desc));
    }

    pub fn despawn(&self, id: EntityId) {
        self.push(Change::Despawn(id));
    }

    pub fn push_action(&self, id: EntityId, action: Action) {
        self.push(Change::Action(id, action));
    }

    pub fn teleport(&self, id: EntityId, position: Vec2) {
        self.push(Change::Teleport(id, position));
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Take every queued change, oldest first.
    pub fn drain(&self) -> Vec<Change> {
        self.inner.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_one_buffer() {
        let queue = ChangeQueue::new();
        let handle = queue.clone();
        handle.despawn(EntityId(4));
        handle.push_action(EntityId(1), Action::Jump);
        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert!(matches!(drained[0], Change::Despawn(EntityId(4))));
        assert!(matches!(drained[1], Change::Action(EntityId(1), Action::Jump)));
        assert!(handle.is_empty());
    }
}
