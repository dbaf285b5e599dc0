use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::api::NarrowphaseApi;
use crate::narrowphase::Narrowphase;

/// Stable handle for an entity registered with the world.
///
/// Ids are allocated monotonically and never reused, so ordering by id is
/// insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

/// Axis-aligned rectangle. `(x, y)` is the minimum corner; y grows upward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min.x, min.y, size.x, size.y)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.position() + self.size() * 0.5
    }

    /// Copy of this box moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self::from_min_size(self.position() + delta, self.size())
    }

    /// Copy of this box with its minimum corner at `position`.
    pub fn with_position(&self, position: Vec2) -> Self {
        Self::from_min_size(position, self.size())
    }

    /// Strict overlap: boxes sharing only an edge do not overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        Narrowphase::overlap_box_box(self, other)
    }

    /// Inclusive point containment (edges count).
    pub fn contains_point(&self, p: Vec2) -> bool {
        Narrowphase::box_contains_point(self, p)
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        Narrowphase::box_contains_box(self, other)
    }

    /// Finite coordinates and strictly positive extents.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// One cell of the world-covering grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub col: usize,
    pub row: usize,
}

impl GridCell {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Classification supplied by the entity container; masks filter on it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Player,
    Enemy,
    #[default]
    Other,
}

/// Which other entities may physically interact with this one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionMask {
    /// Blocks against everything.
    #[default]
    All,
    /// Only interacts with entities tagged [`EntityTag::Player`].
    OnlyPlayer,
    /// Only interacts with entities tagged [`EntityTag::Enemy`].
    OnlyEnemy,
    /// Reports contacts but never blocks movement.
    Sensor,
}

impl CollisionMask {
    /// Whether this mask is willing to interact with an entity carrying `tag`.
    pub fn accepts(self, tag: EntityTag) -> bool {
        match self {
            CollisionMask::All | CollisionMask::Sensor => true,
            CollisionMask::OnlyPlayer => tag == EntityTag::Player,
            CollisionMask::OnlyEnemy => tag == EntityTag::Enemy,
        }
    }
}

/// Outcome of filtering a pair of entities before the box test.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PairResponse {
    /// Overlap blocks movement and notifies both sides.
    Solid,
    /// Overlap notifies both sides but does not block.
    Contact,
    /// The pair never interacts.
    Ignore,
}

/// Side of the moving entity that touched the other entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CollisionSide {
    OnLeft,
    OnRight,
    OnUp,
    OnDown,
    Unknown,
}

impl CollisionSide {
    /// Side as seen from the entity that was hit.
    pub fn opposite(self) -> Self {
        match self {
            CollisionSide::OnLeft => CollisionSide::OnRight,
            CollisionSide::OnRight => CollisionSide::OnLeft,
            CollisionSide::OnUp => CollisionSide::OnDown,
            CollisionSide::OnDown => CollisionSide::OnUp,
            CollisionSide::Unknown => CollisionSide::Unknown,
        }
    }
}

impl std::ops::Neg for CollisionSide {
    type Output = CollisionSide;

    fn neg(self) -> Self::Output {
        self.opposite()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Physics request queued on an entity for the next tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Go(Direction),
    Gravity,
    /// Jump if resting on a surface; continues a running jump.
    Jump,
    /// Jump without the grounded check (springs, bouncing off enemies).
    ForceJump,
}

/// How folded velocities become displacement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MovementType {
    /// Displacement equals the folded velocity.
    #[default]
    Linear,
    /// Displacement follows the folded velocity through exponential smoothing.
    Smooth,
}

/// Per-entity jump progress.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JumpState {
    pub jump_height: i32,
    pub is_jumping: bool,
    pub target_height_y: f32,
    /// Set on the tick the ascent begins.
    pub just_started: bool,
}

impl JumpState {
    pub fn new(jump_height: i32) -> Self {
        Self { jump_height, is_jumping: false, target_height_y: 0.0, just_started: false }
    }
}

/// Target and interpolated velocity for smooth movement.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SmoothingState {
    pub target: Vec2,
    pub actual: Vec2,
}

/// Result of one step-decay displacement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Displacement attempted after limiting it to the world bounds.
    pub requested: IVec2,
    /// Displacement actually committed.
    pub applied: IVec2,
    pub blocked_x: bool,
    pub blocked_y: bool,
    /// Step-decay iterations, at most `max(|dx|, |dy|) + 1`.
    pub iterations: u32,
}

/// Delivered to both entities of an interacting pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CollisionEvent {
    /// Entity receiving the notification.
    pub entity: EntityId,
    pub other: EntityId,
    /// Side of `entity` that touched `other`.
    pub side: CollisionSide,
    /// True when the pair blocked movement (not a sensor contact).
    pub solid: bool,
}

/// Delivered after every committed axis step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveEvent {
    pub entity: EntityId,
    pub delta: IVec2,
}

/// World-level event buffered for [`crate::PhysicsWorldApi::drain_events`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhysicsEvent {
    Collision(CollisionEvent),
    Moved(MoveEvent),
}

/// World-level configuration for the resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid cell size in world units.
    pub cell_size: f32,
    /// Number of grid columns; world width is `columns * cell_size`.
    pub columns: usize,
    /// Number of grid rows; world height is `rows * cell_size`.
    pub rows: usize,
    /// Downward pull per tick, also the ascent speed of jumps.
    pub gravity: i32,
    /// Interpolation factor for smooth movement, in (0, 1].
    pub smoothing_factor: f32,
    /// Size of the box centered on the anchor that defines the active region.
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Buffer collision/move events for `drain_events`.
    pub enable_events: bool,
    /// Maximum number of buffered events; extra are dropped until drained.
    pub max_events: usize,
    /// Enable tick timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: 200.0,
            columns: 100,
            rows: 100,
            gravity: 15,
            smoothing_factor: 0.5,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            enable_events: false,
            max_events: 1024,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    pub fn world_width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    pub fn world_height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Rectangle covered by the grid.
    pub fn world_bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.world_width(), self.world_height())
    }

    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError;
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(ConfigError::NonPositiveCellSize(self.cell_size));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyGrid { columns: self.columns, rows: self.rows });
        }
        if self.gravity < 0 {
            return Err(ConfigError::NegativeGravity(self.gravity));
        }
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(ConfigError::SmoothingFactorOutOfRange(self.smoothing_factor));
        }
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(ConfigError::NonPositiveViewport {
                width: self.viewport_width,
                height: self.viewport_height,
            });
        }
        Ok(())
    }
}

/// Counters for the last completed tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickStats {
    pub delta_time: f32,
    pub entities_resolved: usize,
    /// Non-static entities skipped because they were inactive.
    pub entities_skipped: usize,
    pub probes: usize,
    /// Committed axis steps.
    pub moves: usize,
    /// Collision notifications delivered (both sides counted).
    pub collisions: usize,
    /// Step-decay iterations across all entities.
    pub iterations: usize,
}

/// Timing breakdown for the last tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct TickTiming {
    pub tick_ms: f64,
    pub resolve_ms: f64,
    pub flush_ms: f64,
    pub active_region_ms: f64,
}

/// Debug statistics for grid occupancy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    pub cells: usize,
    pub occupied_cells: usize,
    /// Sum of member counts over all cells; an entity spanning k cells counts k times.
    pub memberships: usize,
    pub max_cell_population: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_accessors() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b.position(), Vec2::new(10.0, 20.0));
        assert_eq!(b.max(), Vec2::new(40.0, 60.0));
        assert_eq!(b.center(), Vec2::new(25.0, 40.0));
        assert_eq!(b.translated(Vec2::new(-10.0, 5.0)).position(), Vec2::new(0.0, 25.0));
        assert!(b.is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!BoundingBox::new(f32::NAN, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_side_opposites() {
        assert_eq!(-CollisionSide::OnLeft, CollisionSide::OnRight);
        assert_eq!(-CollisionSide::OnDown, CollisionSide::OnUp);
        assert_eq!(-CollisionSide::Unknown, CollisionSide::Unknown);
    }

    #[test]
    fn test_mask_accepts() {
        assert!(CollisionMask::All.accepts(EntityTag::Other));
        assert!(CollisionMask::OnlyPlayer.accepts(EntityTag::Player));
        assert!(!CollisionMask::OnlyPlayer.accepts(EntityTag::Enemy));
        assert!(CollisionMask::OnlyEnemy.accepts(EntityTag::Enemy));
        assert!(!CollisionMask::OnlyEnemy.accepts(EntityTag::Other));
    }

    #[test]
    fn test_config_validation() {
        assert!(WorldConfig::default().validate().is_ok());
        let cfg = WorldConfig { cell_size: 0.0, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = WorldConfig { columns: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = WorldConfig { smoothing_factor: 1.5, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = WorldConfig { gravity: -1, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let cfg: WorldConfig =
            serde_json::from_str(r#"{ "cell_size": 100.0, "columns": 10, "rows": 10 }"#).unwrap();
        assert_eq!(cfg.world_width(), 1000.0);
        assert_eq!(cfg.gravity, WorldConfig::default().gravity);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: WorldConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
