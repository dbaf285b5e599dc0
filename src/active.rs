//! Active-region tracking around an anchor entity.

use glam::Vec2;

use crate::api::SpatialIndexApi;
use crate::grid::SpatialGrid;
use crate::types::*;

/// Cells near the anchor, and the entities this tracker switched on.
#[derive(Debug, Default)]
pub struct ActiveRegion {
    anchor: Option<EntityId>,
    viewport: Vec2,
    cells: Vec<GridCell>,
    // Ids activated on the last update, so entities that left the region's
    // cells since then are still switched off.
    activated: Vec<EntityId>,
}

impl ActiveRegion {
    pub fn new(viewport: Vec2) -> Self {
        Self { viewport, ..Default::default() }
    }

    pub fn anchor(&self) -> Option<EntityId> {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Option<EntityId>) {
        self.anchor = anchor;
        if anchor.is_none() {
            self.cells.clear();
            self.activated.clear();
        }
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        self.cells.contains(&cell)
    }

    /// Viewport-sized box centered on the anchor, minimum corner clamped at 0.
    pub fn viewport_box(&self, anchor_box: &BoundingBox) -> BoundingBox {
        let min = (anchor_box.center() - self.viewport * 0.5).max(Vec2::ZERO);
        BoundingBox::from_min_size(min, self.viewport)
    }

    /// Switch off what was active, recompute the cells from the anchor box and
    /// switch on everything registered in them. The anchor itself is never
    /// switched off.
    pub fn update(
        &mut self,
        grid: &SpatialGrid,
        anchor_box: &BoundingBox,
        mut set_active: impl FnMut(EntityId, bool),
    ) {
        for id in self.activated.drain(..) {
            if Some(id) != self.anchor {
                set_active(id, false);
            }
        }

        self.cells = grid.cells_overlapping(&self.viewport_box(anchor_box));
        for &cell in &self.cells {
            for &id in grid.members(cell) {
                if !self.activated.contains(&id) {
                    self.activated.push(id);
                    set_active(id, true);
                }
            }
        }
    }

    /// Drop a removed entity from the bookkeeping.
    pub fn forget(&mut self, id: EntityId) {
        self.activated.retain(|a| *a != id);
        if self.anchor == Some(id) {
            self.set_anchor(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_viewport_box_is_centered_and_clamped() {
        let region = ActiveRegion::new(Vec2::new(200.0, 100.0));
        let b = region.viewport_box(&BoundingBox::new(500.0, 500.0, 50.0, 50.0));
        assert_eq!(b, BoundingBox::new(425.0, 475.0, 200.0, 100.0));
        let b = region.viewport_box(&BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(b.position(), Vec2::ZERO);
    }

    #[test]
    fn test_update_toggles_flags() {
        let mut grid = SpatialGrid::new(100.0, 10, 10);
        let (anchor, near, far) = (EntityId(0), EntityId(1), EntityId(2));
        let mut records: HashMap<EntityId, Vec<GridCell>> = HashMap::new();
        let mut place = |grid: &mut SpatialGrid, id, b: BoundingBox| {
            grid.update_membership(id, records.entry(id).or_default(), &b);
        };
        let anchor_box = BoundingBox::new(100.0, 100.0, 10.0, 10.0);
        place(&mut grid, anchor, anchor_box);
        place(&mut grid, near, BoundingBox::new(150.0, 120.0, 10.0, 10.0));
        place(&mut grid, far, BoundingBox::new(900.0, 900.0, 10.0, 10.0));

        let mut flags: HashMap<EntityId, bool> = HashMap::new();
        let mut region = ActiveRegion::new(Vec2::new(100.0, 100.0));
        region.set_anchor(Some(anchor));
        region.update(&grid, &anchor_box, |id, a| {
            flags.insert(id, a);
        });
        assert_eq!(flags.get(&anchor), Some(&true));
        assert_eq!(flags.get(&near), Some(&true));
        assert_eq!(flags.get(&far), None);
        assert!(region.contains(GridCell::new(1, 1)));

        // Anchor walks to the far corner.
        let anchor_box = BoundingBox::new(880.0, 880.0, 10.0, 10.0);
        place(&mut grid, anchor, anchor_box);
        region.update(&grid, &anchor_box, |id, a| {
            flags.insert(id, a);
        });
        assert_eq!(flags.get(&near), Some(&false));
        assert_eq!(flags.get(&far), Some(&true));
        assert_eq!(flags.get(&anchor), Some(&true));
    }
}
