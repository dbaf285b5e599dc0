//! Per-entity physics state and the description used to register entities.

use crate::signal::Signal;
use crate::types::*;

/// Physics capabilities and per-tick requests of one entity.
#[derive(Debug)]
pub struct PhysicsState {
    /// Static entities never move but still block others.
    pub is_static: bool,
    /// Units per tick contributed by each `Go` action.
    pub move_speed: i32,
    /// Current gravity flag; suspended by a running jump.
    pub gravity_enabled: bool,
    pub collision_mask: CollisionMask,
    pub movement_type: MovementType,
    pub jump: Option<JumpState>,
    pub smoothing: Option<SmoothingState>,
    pub on_collision: Signal<CollisionEvent>,
    pub on_move: Signal<MoveEvent>,
    pending_actions: Vec<Action>,
}

impl PhysicsState {
    pub fn new(is_static: bool, move_speed: i32) -> Self {
        Self {
            is_static,
            move_speed,
            gravity_enabled: !is_static,
            collision_mask: CollisionMask::All,
            movement_type: MovementType::Linear,
            jump: None,
            smoothing: None,
            on_collision: Signal::new(),
            on_move: Signal::new(),
            pending_actions: Vec::new(),
        }
    }

    /// Immovable blocker (platforms, walls).
    pub fn fixed() -> Self {
        Self::new(true, 0)
    }

    /// Moving entity affected by gravity.
    pub fn dynamic(move_speed: i32) -> Self {
        Self::new(false, move_speed)
    }

    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.gravity_enabled = enabled;
        self
    }

    pub fn with_mask(mut self, mask: CollisionMask) -> Self {
        self.collision_mask = mask;
        self
    }

    pub fn with_jump(mut self, jump_height: i32) -> Self {
        self.jump = Some(JumpState::new(jump_height));
        self
    }

    pub fn with_movement(mut self, movement_type: MovementType) -> Self {
        self.movement_type = movement_type;
        self.smoothing = match movement_type {
            MovementType::Smooth => Some(SmoothingState::default()),
            MovementType::Linear => None,
        };
        self
    }

    pub fn is_sensor(&self) -> bool {
        self.collision_mask == CollisionMask::Sensor
    }

    /// Queue an action for the next tick. Duplicates collapse.
    pub fn push_action(&mut self, action: Action) {
        if !self.pending_actions.contains(&action) {
            self.pending_actions.push(action);
        }
    }

    pub fn pending_actions(&self) -> &[Action] {
        &self.pending_actions
    }

    pub(crate) fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }
}

/// Everything the world needs to register an entity.
#[derive(Debug)]
pub struct EntityDesc {
    pub bbox: BoundingBox,
    pub physics: PhysicsState,
    pub tag: EntityTag,
}

impl EntityDesc {
    pub fn new(bbox: BoundingBox, physics: PhysicsState) -> Self {
        Self { bbox, physics, tag: EntityTag::Other }
    }

    pub fn tagged(mut self, tag: EntityTag) -> Self {
        self.tag = tag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_static_flag() {
        assert!(!PhysicsState::fixed().gravity_enabled);
        assert!(PhysicsState::dynamic(5).gravity_enabled);
        assert!(!PhysicsState::dynamic(5).with_gravity(false).gravity_enabled);
        assert!(!PhysicsState::fixed().is_sensor());
        assert!(PhysicsState::fixed().with_mask(CollisionMask::Sensor).is_sensor());
    }

    #[test]
    fn test_actions_are_a_set() {
        let mut p = PhysicsState::dynamic(1);
        p.push_action(Action::Go(Direction::Left));
        p.push_action(Action::Jump);
        p.push_action(Action::Go(Direction::Left));
        assert_eq!(p.pending_actions(), &[Action::Go(Direction::Left), Action::Jump]);
        assert_eq!(p.take_actions().len(), 2);
        assert!(p.pending_actions().is_empty());
    }

    #[test]
    fn test_smooth_movement_allocates_state() {
        let p = PhysicsState::dynamic(1).with_movement(MovementType::Smooth);
        assert!(p.smoothing.is_some());
        let p = p.with_movement(MovementType::Linear);
        assert!(p.smoothing.is_none());
    }
}
