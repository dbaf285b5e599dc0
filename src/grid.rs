use glam::Vec2;

use crate::api::SpatialIndexApi;
use crate::types::*;

struct Cell {
    members: Vec<EntityId>,
    bounds: BoundingBox,
}

/// Fixed uniform grid covering `(0, 0) .. (columns * cell_size, rows * cell_size)`.
///
/// Cells hold entity ids only; the owner of the entities keeps each entity's
/// recorded membership and passes it in on every update.
pub struct SpatialGrid {
    cell_size: f32,
    columns: usize,
    rows: usize,
    bounds: BoundingBox,
    // Row-major: index = row * columns + col
    cells: Vec<Cell>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, columns: usize, rows: usize) -> Self {
        let mut cells = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for col in 0..columns {
                let bounds = BoundingBox::new(
                    col as f32 * cell_size,
                    row as f32 * cell_size,
                    cell_size,
                    cell_size,
                );
                cells.push(Cell { members: Vec::new(), bounds });
            }
        }
        let size = Vec2::new(columns as f32, rows as f32) * cell_size;
        let bounds = BoundingBox::from_min_size(Vec2::ZERO, size);
        Self { cell_size, columns, rows, bounds, cells }
    }

    pub fn from_config(cfg: &WorldConfig) -> Self {
        Self::new(cfg.cell_size, cfg.columns, cfg.rows)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rectangle covered by the grid.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn cell_bounds(&self, cell: GridCell) -> Option<BoundingBox> {
        self.index(cell.col, cell.row).map(|i| self.cells[i].bounds)
    }

    /// Entities registered in `cell`; empty for out-of-range cells.
    pub fn members(&self, cell: GridCell) -> &[EntityId] {
        match self.index(cell.col, cell.row) {
            Some(i) => &self.cells[i].members,
            None => &[],
        }
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        if col >= self.columns || row >= self.rows {
            return None;
        }
        Some(row * self.columns + col)
    }

    fn cell_overlaps(&self, col: usize, row: usize, bbox: &BoundingBox) -> bool {
        self.cell_bounds(GridCell::new(col, row)).is_some_and(|b| b.overlaps(bbox))
    }

    /// Return debug statistics for the current occupancy.
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats { cells: self.cells.len(), ..Default::default() };
        for cell in &self.cells {
            let n = cell.members.len();
            if n > 0 {
                stats.occupied_cells += 1;
            }
            stats.memberships += n;
            stats.max_cell_population = stats.max_cell_population.max(n);
        }
        stats
    }
}

impl SpatialIndexApi for SpatialGrid {
    fn cells_overlapping(&self, bbox: &BoundingBox) -> Vec<GridCell> {
        let mut out = Vec::new();
        if !self.bounds.overlaps(bbox) {
            return out;
        }
        // Negative coordinates start at the first column/row.
        let first_col = (bbox.x / self.cell_size).max(0.0) as usize;
        let first_row = (bbox.y / self.cell_size).max(0.0) as usize;
        if !self.cell_overlaps(first_col, first_row, bbox) {
            return out;
        }
        out.push(GridCell::new(first_col, first_row));

        // Walk right along the row, then restart one row up at the first column.
        let (mut col, mut row) = (first_col, first_row);
        loop {
            if self.cell_overlaps(col + 1, row, bbox) {
                col += 1;
                out.push(GridCell::new(col, row));
                continue;
            }
            col = first_col;
            if self.cell_overlaps(col, row + 1, bbox) {
                row += 1;
                out.push(GridCell::new(col, row));
            } else {
                break;
            }
        }
        out
    }

    fn update_membership(&mut self, id: EntityId, record: &mut Vec<GridCell>, bbox: &BoundingBox) {
        self.remove_membership(id, record);
        let cells = self.cells_overlapping(bbox);
        for cell in &cells {
            if let Some(i) = self.index(cell.col, cell.row) {
                self.cells[i].members.push(id);
            }
        }
        *record = cells;
    }

    fn remove_membership(&mut self, id: EntityId, record: &mut Vec<GridCell>) {
        for cell in record.drain(..) {
            if let Some(i) = self.index(cell.col, cell.row) {
                self.cells[i].members.retain(|m| *m != id);
            }
        }
    }

    fn query_region(&self, bbox: &BoundingBox) -> Vec<EntityId> {
        let mut out = Vec::new();
        for cell in self.cells_overlapping(bbox) {
            out.extend_from_slice(self.members(cell));
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}
