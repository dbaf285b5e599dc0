use glam::{IVec2, Vec2};

use crate::body::EntityDesc;
use crate::error::Result;
use crate::types::*;

/// Public API contract for the grid-indexed movement world.
pub trait PhysicsWorldApi {
    /// Construct a new world; fails if the configuration is invalid.
    fn new(cfg: WorldConfig) -> Result<Self>
    where
        Self: Sized;

    // --- Entity lifecycle --------------------------------------------------

    /// Register an entity and its initial grid membership.
    fn insert(&mut self, desc: EntityDesc) -> Result<EntityId>;

    /// Deregister an entity from every cell it occupies and hand it back.
    fn remove(&mut self, id: EntityId) -> Result<EntityDesc>;

    // --- Simulation --------------------------------------------------------

    /// Queue an action for the entity's next resolution.
    fn push_action(&mut self, id: EntityId, action: Action) -> Result<()>;

    /// Advance every physics entity by one frame, in insertion order.
    fn resolve_tick(&mut self, delta_time: f32);

    /// Drain and return the buffered collision/move events.
    fn drain_events(&mut self) -> Vec<PhysicsEvent>;

    // --- Grid maintenance --------------------------------------------------

    /// Replace an entity's box outside the normal movement path and restore
    /// grid consistency.
    fn update_membership(&mut self, id: EntityId, bbox: BoundingBox) -> Result<()>;

    /// Move an entity's minimum corner to `position`, clamped into the world.
    fn teleport(&mut self, id: EntityId, position: Vec2) -> Result<()>;

    // --- Queries -----------------------------------------------------------

    /// Entities registered in any cell overlapped by `bbox` (broad phase).
    fn query_region(&self, bbox: &BoundingBox) -> Vec<EntityId>;

    /// Entities whose box actually overlaps `bbox`.
    fn query_overlapping(&self, bbox: &BoundingBox) -> Vec<EntityId>;

    /// Entities whose box contains the point `p`.
    fn query_point(&self, p: Vec2) -> Vec<EntityId>;

    // --- Movement primitives -----------------------------------------------

    /// Step-decay displacement of one entity, axis by axis.
    fn try_move(&mut self, id: EntityId, delta: IVec2) -> Result<MoveOutcome>;

    /// Whether translating the entity by `delta` would hit a solid entity.
    /// Notifies both sides of every interacting pair found.
    fn collide_on_move(&mut self, id: EntityId, delta: IVec2) -> Result<bool>;
}

/// Cell enumeration and membership bookkeeping for a uniform grid.
pub trait SpatialIndexApi {
    /// Every in-bounds cell whose rectangle overlaps `bbox`.
    fn cells_overlapping(&self, bbox: &BoundingBox) -> Vec<GridCell>;

    /// Move `id` from the cells in `record` to the cells overlapped by `bbox`,
    /// then store the new set in `record`.
    fn update_membership(&mut self, id: EntityId, record: &mut Vec<GridCell>, bbox: &BoundingBox);

    /// Remove `id` from every cell in `record` and clear it.
    fn remove_membership(&mut self, id: EntityId, record: &mut Vec<GridCell>);

    /// Union of members of the cells overlapped by `bbox`, sorted and unique.
    fn query_region(&self, bbox: &BoundingBox) -> Vec<EntityId>;
}

/// Box primitives and pair filtering.
pub trait NarrowphaseApi {
    fn overlap_box_box(a: &BoundingBox, b: &BoundingBox) -> bool;
    fn box_contains_point(b: &BoundingBox, p: Vec2) -> bool;
    fn box_contains_box(outer: &BoundingBox, inner: &BoundingBox) -> bool;

    /// Side of the mover derived from its probe displacement.
    fn collision_side(delta: IVec2) -> CollisionSide;

    fn pair_response(
        a_mask: CollisionMask,
        a_tag: EntityTag,
        b_mask: CollisionMask,
        b_tag: EntityTag,
    ) -> PairResponse;
}
