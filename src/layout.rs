//! Grid placement for freshly parsed tables.

use crate::model::{Position, Table};

/// Fixed-column grid. Tables fill rows left to right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            cell_width: 300.0,
            cell_height: 250.0,
        }
    }
}

impl GridLayout {
    /// Position of the `index`-th table (0-based) in parse order.
    pub fn position(&self, index: usize) -> Position {
        let columns = self.columns.max(1);
        Position {
            x: (index % columns) as f64 * self.cell_width,
            y: (index / columns) as f64 * self.cell_height,
        }
    }

    pub fn apply(&self, tables: &mut [Table]) {
        for (i, table) in tables.iter_mut().enumerate() {
            table.position = self.position(i);
        }
    }
}
