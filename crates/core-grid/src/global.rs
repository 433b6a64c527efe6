//! The aggregator's `n×n` assembled view of the problem interior.

use crate::{CellValue, Subgrid};

/// Global grid owned and mutated solely by the aggregator. Indices cover the
/// problem interior only; the outer boundary ring lives in the workers'
/// halos and is not part of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalGrid<V> {
    n: usize,
    cells: Vec<V>,
}

impl<V: CellValue> GlobalGrid<V> {
    pub fn new(n: usize, fill: V) -> Self {
        Self {
            n,
            cells: vec![fill; n * n],
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, gi: usize, gj: usize) -> V {
        self.cells[gi * self.n + gj]
    }

    /// Copy the interior of one worker snapshot into place. `origin` is the
    /// global offset of the snapshot's first interior cell, so subgrid
    /// interior `(i, j)` lands at `(origin.0 + i - 1, origin.1 + j - 1)`.
    pub fn blit(&mut self, snapshot: &Subgrid<V>, origin: (usize, usize)) {
        let m = snapshot.dim();
        for i in 1..=m {
            for j in 1..=m {
                let gi = origin.0 + i - 1;
                let gj = origin.1 + j - 1;
                self.cells[gi * self.n + gj] = snapshot.get(i, j);
            }
        }
    }

    /// Row-major copy of the whole grid. Handy for assertions.
    pub fn to_vec(&self) -> Vec<V> {
        self.cells.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_places_each_quadrant() {
        let mut grid = GlobalGrid::new(4, 0u32);
        // Four 2×2 snapshots with distinct interiors.
        for (value, origin) in [(1, (0, 0)), (2, (0, 2)), (3, (2, 0)), (4, (2, 2))] {
            let snap = Subgrid::filled(2, value);
            grid.blit(&snap, origin);
        }
        assert_eq!(grid.get(0, 0), 1);
        assert_eq!(grid.get(1, 3), 2);
        assert_eq!(grid.get(3, 0), 3);
        assert_eq!(grid.get(2, 2), 4);
    }

    #[test]
    fn blit_ignores_snapshot_halo() {
        let mut grid = GlobalGrid::new(2, 0u32);
        let snap = Subgrid::from_seed(2, |i, j| {
            // Halo cells get a poison value that must never appear globally.
            if i == 0 || i == 3 || j == 0 || j == 3 { 99 } else { 5 }
        });
        grid.blit(&snap, (0, 0));
        assert_eq!(grid.to_vec(), vec![5; 4]);
    }
}
