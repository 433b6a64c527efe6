//! Per-worker cell storage: `m×m` interior plus a one-cell ghost halo.
//!
//! Storage is a flat row-major `Vec` indexed by `(i, j)` over the full
//! `(m + 2)²` footprint. The halo rows/columns (`0` and `m + 1`) mirror
//! neighboring workers' edge cells between exchanges; on outer-edge workers
//! they hold the configured boundary values and are never written again
//! after seeding.

use crate::{CellValue, InitialValues};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgrid<V> {
    /// Interior dimension `m` (positive and even; validated at bootstrap).
    m: usize,
    cells: Vec<V>,
}

impl<V: CellValue> Subgrid<V> {
    /// Build a subgrid by evaluating `seed` at every local `(i, j)` in
    /// `0..=m+1`, halo included.
    pub fn from_seed(m: usize, mut seed: impl FnMut(usize, usize) -> V) -> Self {
        let side = m + 2;
        let mut cells = Vec::with_capacity(side * side);
        for i in 0..side {
            for j in 0..side {
                cells.push(seed(i, j));
            }
        }
        Self { m, cells }
    }

    /// Uniform fill, halo included. Test and benchmark convenience.
    pub fn filled(m: usize, value: V) -> Self {
        Self::from_seed(m, |_, _| value)
    }

    /// Seed from the application's initial values for the worker whose
    /// top-left interior cell sits at global interior offset `origin`.
    ///
    /// Local `(i, j)` maps to global seeding coordinates
    /// `(origin.0 + i, origin.1 + j)` in `0..=n+1`, so interior-adjacent
    /// workers seed their halos with the interior value (overwritten by the
    /// first exchange) while outer-edge workers land their halos on the true
    /// boundary ring.
    pub fn from_initial_values(
        m: usize,
        n: usize,
        origin: (usize, usize),
        initial: &InitialValues<V>,
    ) -> Self {
        trace!(target: "grid.seed", m, n, i0 = origin.0, j0 = origin.1, "subgrid_seeded");
        Self::from_seed(m, |i, j| initial.seed(n, origin.0 + i, origin.1 + j))
    }

    /// Interior dimension `m`.
    #[inline]
    pub fn dim(&self) -> usize {
        self.m
    }

    /// Full side length `m + 2`.
    #[inline]
    pub fn side(&self) -> usize {
        self.m + 2
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> V {
        self.cells[i * self.side() + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: V) {
        let side = self.side();
        self.cells[i * side + j] = value;
    }

    /// Iterate interior coordinates in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize)> + use<V> {
        let m = self.m;
        (1..=m).flat_map(move |i| (1..=m).map(move |j| (i, j)))
    }
}
