use glam::{IVec2, Vec2};
use log::{debug, trace, warn};

use std::collections::BTreeMap;
use std::time::Instant;

use crate::active::ActiveRegion;
use crate::api::{NarrowphaseApi, PhysicsWorldApi, SpatialIndexApi};
use crate::body::{EntityDesc, PhysicsState};
use crate::changes::{Change, ChangeQueue};
use crate::error::{PhysicsError, Result};
use crate::grid::SpatialGrid;
use crate::jump::{self, JumpStep};
use crate::narrowphase::Narrowphase;
use crate::signal::ListenerId;
use crate::types::*;

/// Frame-stepped world: entities, their grid membership and the resolver.
pub struct PhysicsWorld {
    cfg: WorldConfig,
    tick_counter: u64,
    next_id: u32,

    // Ordered by id, which is insertion order.
    entities: BTreeMap<EntityId, Entry>,
    grid: SpatialGrid,
    active: ActiveRegion,
    changes: ChangeQueue,

    // Event buffer until drained
    events: Vec<PhysicsEvent>,

    stats: TickStats,
    last_timing: Option<TickTiming>,
    last_spawned: Vec<EntityId>,
}

struct Entry {
    bbox: BoundingBox,
    physics: PhysicsState,
    tag: EntityTag,
    // Recorded grid membership; always equals cells_overlapping(bbox).
    cells: Vec<GridCell>,
    active: bool,
    on_ground: bool,
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig) -> Result<Self> {
        cfg.validate()?;
        let grid = SpatialGrid::from_config(&cfg);
        let active = ActiveRegion::new(Vec2::new(cfg.viewport_width, cfg.viewport_height));
        Ok(Self {
            cfg,
            tick_counter: 0,
            next_id: 0,
            entities: BTreeMap::new(),
            grid,
            active,
            changes: ChangeQueue::new(),
            events: Vec::new(),
            stats: TickStats::default(),
            last_timing: None,
            last_spawned: Vec::new(),
        })
    }

    fn insert(&mut self, desc: EntityDesc) -> Result<EntityId> {
        if !desc.bbox.is_valid() {
            return Err(PhysicsError::InvalidBox(desc.bbox));
        }
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let mut cells = Vec::new();
        self.grid.update_membership(id, &mut cells, &desc.bbox);
        debug!("insert {:?} {:?} tag={:?} cells={}", id, desc.bbox, desc.tag, cells.len());

        let tracking = self.active.anchor().is_some();
        self.entities.insert(
            id,
            Entry {
                bbox: desc.bbox,
                physics: desc.physics,
                tag: desc.tag,
                cells,
                active: !tracking,
                on_ground: false,
            },
        );
        if tracking {
            self.refresh_active_region();
        }
        Ok(id)
    }

    fn remove(&mut self, id: EntityId) -> Result<EntityDesc> {
        let mut entry = self.entities.remove(&id).ok_or(PhysicsError::UnknownEntity(id))?;
        self.grid.remove_membership(id, &mut entry.cells);

        let was_anchor = self.active.anchor() == Some(id);
        self.active.forget(id);
        if was_anchor {
            for e in self.entities.values_mut() {
                e.active = true;
            }
        }
        debug!("remove {:?} (anchor={})", id, was_anchor);
        Ok(EntityDesc { bbox: entry.bbox, physics: entry.physics, tag: entry.tag })
    }

    fn push_action(&mut self, id: EntityId, action: Action) -> Result<()> {
        self.entry_mut(id)?.physics.push_action(action);
        Ok(())
    }

    fn resolve_tick(&mut self, delta_time: f32) {
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.stats = TickStats { delta_time, ..Default::default() };
        self.tick_counter = self.tick_counter.wrapping_add(1);

        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            self.resolve_entity(id);
        }
        let resolve_ms = t_all.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        let t_flush = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.last_spawned = self.flush_changes();
        let flush_ms = t_flush.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        let t_active = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.refresh_active_region();
        let active_ms = t_active.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        if let Some(t_all) = t_all {
            self.last_timing = Some(TickTiming {
                tick_ms: t_all.elapsed().as_secs_f64() * 1000.0,
                resolve_ms,
                flush_ms,
                active_region_ms: active_ms,
            });
        }
        trace!(
            "tick {} dt={}: resolved={} skipped={} probes={} moves={} collisions={} iterations={}",
            self.tick_counter,
            delta_time,
            self.stats.entities_resolved,
            self.stats.entities_skipped,
            self.stats.probes,
            self.stats.moves,
            self.stats.collisions,
            self.stats.iterations
        );
    }

    fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    fn update_membership(&mut self, id: EntityId, bbox: BoundingBox) -> Result<()> {
        if !bbox.is_valid() {
            return Err(PhysicsError::InvalidBox(bbox));
        }
        let entry = self.entities.get_mut(&id).ok_or(PhysicsError::UnknownEntity(id))?;
        entry.bbox = bbox;
        self.grid.update_membership(id, &mut entry.cells, &entry.bbox);
        Ok(())
    }

    fn teleport(&mut self, id: EntityId, position: Vec2) -> Result<()> {
        let bbox = self.entry(id)?.bbox.with_position(position);
        let clamped = clamp_into(&bbox, &self.grid.bounds());
        debug!("teleport {:?} to {:?}", id, clamped.position());
        self.update_membership(id, clamped)
    }

    fn query_region(&self, bbox: &BoundingBox) -> Vec<EntityId> {
        self.grid.query_region(bbox)
    }

    fn query_overlapping(&self, bbox: &BoundingBox) -> Vec<EntityId> {
        self.grid
            .query_region(bbox)
            .into_iter()
            .filter(|id| self.entities.get(id).is_some_and(|e| e.bbox.overlaps(bbox)))
            .collect()
    }

    fn query_point(&self, p: Vec2) -> Vec<EntityId> {
        // A unit box around the point also reaches boxes whose edge sits on a cell boundary.
        let probe = BoundingBox::new(p.x - 0.5, p.y - 0.5, 1.0, 1.0);
        self.grid
            .query_region(&probe)
            .into_iter()
            .filter(|id| self.entities.get(id).is_some_and(|e| e.bbox.contains_point(p)))
            .collect()
    }

    fn try_move(&mut self, id: EntityId, delta: IVec2) -> Result<MoveOutcome> {
        self.entry(id)?;
        Ok(self.move_entity(id, delta))
    }

    fn collide_on_move(&mut self, id: EntityId, delta: IVec2) -> Result<bool> {
        self.entry(id)?;
        Ok(self.probe(id, delta))
    }
}

impl PhysicsWorld {
    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Registered entities in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn bbox(&self, id: EntityId) -> Result<BoundingBox> {
        Ok(self.entry(id)?.bbox)
    }

    pub fn tag(&self, id: EntityId) -> Result<EntityTag> {
        Ok(self.entry(id)?.tag)
    }

    /// Cells the entity is currently registered in.
    pub fn cells_of(&self, id: EntityId) -> Result<&[GridCell]> {
        Ok(&self.entry(id)?.cells)
    }

    pub fn is_active(&self, id: EntityId) -> Result<bool> {
        Ok(self.entry(id)?.active)
    }

    /// True after a tick in which a downward displacement was cut short.
    pub fn is_on_ground(&self, id: EntityId) -> Result<bool> {
        Ok(self.entry(id)?.on_ground)
    }

    pub fn physics(&self, id: EntityId) -> Result<&PhysicsState> {
        Ok(&self.entry(id)?.physics)
    }

    pub fn physics_mut(&mut self, id: EntityId) -> Result<&mut PhysicsState> {
        Ok(&mut self.entry_mut(id)?.physics)
    }

    pub fn on_collision(
        &mut self,
        id: EntityId,
        listener: impl FnMut(&CollisionEvent) + 'static,
    ) -> Result<ListenerId> {
        Ok(self.entry_mut(id)?.physics.on_collision.register(listener))
    }

    pub fn on_move(
        &mut self,
        id: EntityId,
        listener: impl FnMut(&MoveEvent) + 'static,
    ) -> Result<ListenerId> {
        Ok(self.entry_mut(id)?.physics.on_move.register(listener))
    }

    /// Handle for queuing spawns, despawns and actions from listeners.
    pub fn change_queue(&self) -> ChangeQueue {
        self.changes.clone()
    }

    /// Apply queued changes in request order. Returns the ids spawned.
    pub fn flush_changes(&mut self) -> Vec<EntityId> {
        let mut spawned = Vec::new();
        for change in self.changes.drain() {
            let result = match change {
                Change::Spawn(desc) => self.insert(desc).map(|id| spawned.push(id)),
                Change::Despawn(id) => self.remove(id).map(|_| ()),
                Change::Action(id, action) => self.push_action(id, action),
                Change::Teleport(id, position) => self.teleport(id, position),
            };
            if let Err(err) = result {
                warn!("deferred change dropped: {}", err);
            }
        }
        spawned
    }

    /// Ids spawned by the change flush of the last tick.
    pub fn last_spawned(&self) -> &[EntityId] {
        &self.last_spawned
    }

    /// Choose the entity the active region follows; `None` activates everything.
    pub fn set_anchor(&mut self, anchor: Option<EntityId>) -> Result<()> {
        if let Some(id) = anchor {
            self.entry(id)?;
        }
        self.active.set_anchor(anchor);
        match anchor {
            Some(id) => {
                for (eid, e) in self.entities.iter_mut() {
                    e.active = *eid == id;
                }
                self.refresh_active_region();
            }
            None => {
                for e in self.entities.values_mut() {
                    e.active = true;
                }
            }
        }
        debug!("active region anchor set to {:?}", anchor);
        Ok(())
    }

    pub fn anchor(&self) -> Option<EntityId> {
        self.active.anchor()
    }

    pub fn active_cells(&self) -> &[GridCell] {
        self.active.cells()
    }

    /// Counters for the last tick (probes made between ticks accumulate too).
    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Return timing breakdown for the last tick.
    pub fn timing(&self) -> Option<TickTiming> {
        self.last_timing
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn grid_stats(&self) -> GridStats {
        self.grid.stats()
    }

    fn entry(&self, id: EntityId) -> Result<&Entry> {
        self.entities.get(&id).ok_or(PhysicsError::UnknownEntity(id))
    }

    fn entry_mut(&mut self, id: EntityId) -> Result<&mut Entry> {
        self.entities.get_mut(&id).ok_or(PhysicsError::UnknownEntity(id))
    }

    fn resolve_entity(&mut self, id: EntityId) {
        let gravity = self.cfg.gravity;
        let factor = self.cfg.smoothing_factor;
        let Some(entry) = self.entities.get_mut(&id) else {
            return;
        };
        if entry.physics.is_static {
            return;
        }
        if !entry.active {
            self.stats.entities_skipped += 1;
            return;
        }
        self.stats.entities_resolved += 1;

        if entry.physics.gravity_enabled {
            entry.physics.push_action(Action::Gravity);
        }
        let speed = entry.physics.move_speed;
        let mut velocity = IVec2::ZERO;
        // Some(force) when a jump was requested; folded after the other actions.
        let mut jump_request: Option<bool> = None;
        for action in entry.physics.take_actions() {
            match action {
                Action::Go(Direction::Left) => velocity.x -= speed,
                Action::Go(Direction::Right) => velocity.x += speed,
                Action::Go(Direction::Up) => velocity.y += speed,
                Action::Go(Direction::Down) => velocity.y -= speed,
                Action::Gravity => {
                    if entry.physics.gravity_enabled {
                        velocity.y -= gravity;
                    }
                }
                Action::Jump => jump_request = Some(jump_request.unwrap_or(false)),
                Action::ForceJump => jump_request = Some(true),
            }
        }

        let mut requeue_jump = false;
        if let Some(force) = jump_request {
            match self.step_jump(id, force) {
                Some(step) => {
                    if let Some(vy) = step.velocity_y(gravity) {
                        velocity.y = vy;
                    }
                    requeue_jump = step.requeue();
                }
                None => warn!("{:?} requested a jump without jump state; ignored", id),
            }
        }

        let smoothing = self.entities.get_mut(&id).and_then(|e| e.physics.smoothing.as_mut());
        if let Some(smoothing) = smoothing {
            smoothing.target = velocity.as_vec2();
            smoothing.actual += (smoothing.target - smoothing.actual) * factor;
            velocity = smoothing.actual.as_ivec2();
        }

        let outcome = self.move_entity(id, velocity);

        if let Some(entry) = self.entities.get_mut(&id) {
            if velocity.y < 0 {
                entry.on_ground = outcome.applied.y > velocity.y;
            } else if velocity.y > 0 {
                entry.on_ground = false;
            }
            if requeue_jump {
                entry.physics.push_action(Action::Jump);
            }
        }
    }

    /// Advance the jump sub-machine; `None` if the entity has no jump state.
    fn step_jump(&mut self, id: EntityId, force: bool) -> Option<JumpStep> {
        let entry = self.entities.get(&id)?;
        let mut state = entry.physics.jump?;
        let bbox = entry.bbox;
        let bounds = self.grid.bounds();
        // The world edges block like any solid, so the floor counts as ground.
        let step = jump::advance(&mut state, bbox.y, force, |delta| {
            !bounds.contains(&bbox.translated(delta.as_vec2())) || self.probe(id, delta)
        });

        let entry = self.entities.get_mut(&id)?;
        entry.physics.jump = Some(state);
        if let Some(enabled) = step.gravity_enabled() {
            entry.physics.gravity_enabled = enabled;
        }
        Some(step)
    }

    fn move_entity(&mut self, id: EntityId, delta: IVec2) -> MoveOutcome {
        let mut outcome = MoveOutcome::default();
        if delta == IVec2::ZERO {
            return outcome;
        }
        let bounds = self.grid.bounds();
        let Some(entry) = self.entities.get_mut(&id) else {
            debug_assert!(false, "move of unregistered entity {:?}", id);
            return outcome;
        };

        let clamped = clamp_into(&entry.bbox, &bounds);
        if clamped != entry.bbox {
            entry.bbox = clamped;
            self.grid.update_membership(id, &mut entry.cells, &entry.bbox);
        }
        // Keep the target inside the world: lo <= 0 <= hi after the clamp.
        let pos = entry.bbox.position();
        let max = (bounds.max() - entry.bbox.size()).max(Vec2::ZERO);
        let lo = (-pos).ceil().as_ivec2();
        let hi = (max - pos).floor().as_ivec2();
        let mut d = delta.clamp(lo, hi);
        outcome.requested = d;

        let cap = d.x.unsigned_abs().max(d.y.unsigned_abs()) + 1;
        while d != IVec2::ZERO && outcome.iterations < cap {
            outcome.iterations += 1;
            if d.x != 0 {
                let step = IVec2::new(d.x, 0);
                if self.probe(id, step) {
                    d.x -= d.x.signum();
                    outcome.blocked_x = true;
                } else {
                    self.commit_step(id, step);
                    outcome.applied.x += d.x;
                    d.x = 0;
                }
            }
            if d.y != 0 {
                let step = IVec2::new(0, d.y);
                if self.probe(id, step) {
                    d.y -= d.y.signum();
                    outcome.blocked_y = true;
                } else {
                    self.commit_step(id, step);
                    outcome.applied.y += d.y;
                    d.y = 0;
                }
            }
        }
        self.stats.iterations += outcome.iterations as usize;
        outcome
    }

    fn commit_step(&mut self, id: EntityId, step: IVec2) {
        let Some(entry) = self.entities.get_mut(&id) else {
            return;
        };
        entry.bbox = entry.bbox.translated(step.as_vec2());
        self.grid.update_membership(id, &mut entry.cells, &entry.bbox);
        let event = MoveEvent { entity: id, delta: step };
        entry.physics.on_move.emit(&event);
        self.stats.moves += 1;
        self.push_event(PhysicsEvent::Moved(event));
    }

    fn probe(&mut self, id: EntityId, delta: IVec2) -> bool {
        self.stats.probes += 1;
        let Some(entry) = self.entities.get(&id) else {
            debug_assert!(false, "probe of unregistered entity {:?}", id);
            return false;
        };
        let candidate = entry.bbox.translated(delta.as_vec2());
        let (mask, tag) = (entry.physics.collision_mask, entry.tag);

        let mut hits: Vec<(EntityId, bool)> = Vec::new();
        let mut blocked = false;
        'cells: for cell in self.grid.cells_overlapping(&candidate) {
            for &other in self.grid.members(cell) {
                if other == id || hits.iter().any(|(h, _)| *h == other) {
                    continue;
                }
                let Some(o) = self.entities.get(&other) else {
                    debug_assert!(false, "grid holds unregistered entity {:?}", other);
                    continue;
                };
                if !candidate.overlaps(&o.bbox) {
                    continue;
                }
                match Narrowphase::pair_response(mask, tag, o.physics.collision_mask, o.tag) {
                    PairResponse::Ignore => {}
                    PairResponse::Contact => hits.push((other, false)),
                    PairResponse::Solid => {
                        hits.push((other, true));
                        blocked = true;
                        break 'cells;
                    }
                }
            }
        }

        if !hits.is_empty() {
            let side = Narrowphase::collision_side(delta);
            for (other, solid) in hits {
                self.notify_collision(id, other, side, solid);
            }
        }
        blocked
    }

    fn notify_collision(
        &mut self,
        id: EntityId,
        other: EntityId,
        side: CollisionSide,
        solid: bool,
    ) {
        let forward = CollisionEvent { entity: id, other, side, solid };
        let back = CollisionEvent { entity: other, other: id, side: -side, solid };
        for event in [forward, back] {
            if let Some(entry) = self.entities.get_mut(&event.entity) {
                entry.physics.on_collision.emit(&event);
            }
            self.stats.collisions += 1;
            self.push_event(PhysicsEvent::Collision(event));
        }
    }

    fn push_event(&mut self, event: PhysicsEvent) {
        if self.cfg.enable_events && self.events.len() < self.cfg.max_events {
            self.events.push(event);
        }
    }

    fn refresh_active_region(&mut self) {
        let Some(anchor) = self.active.anchor() else {
            return;
        };
        let Some(anchor_box) = self.entities.get(&anchor).map(|e| e.bbox) else {
            return;
        };
        let entities = &mut self.entities;
        self.active.update(&self.grid, &anchor_box, |id, on| {
            if let Some(e) = entities.get_mut(&id) {
                e.active = on;
            }
        });
    }
}

/// Move `bbox` inside `bounds` without resizing it.
fn clamp_into(bbox: &BoundingBox, bounds: &BoundingBox) -> BoundingBox {
    let min = bounds.position();
    let max = (bounds.max() - bbox.size()).max(min);
    bbox.with_position(bbox.position().clamp(min, max))
}
