//! core-mesh: the logical `q×q` worker mesh and its channel wiring.
//!
//! Workers are addressed by 1-based [`NodeCoord`]s. Nearest neighbors are
//! connected by bidirectional rendezvous [`Conduit`]s, allocated in one pass
//! by [`build_mesh`] and handed to each worker exactly once as a
//! [`NeighborLinks`] set. Edge workers hold `None` on their outer sides.
//!
//! Ownership contract: a conduit endpoint belongs to exactly one worker, and
//! each direction of each link has exactly one sender and one receiver at
//! any given exchange sub-step. Nothing here is shared or locked.

mod conduit;

pub use conduit::{Conduit, LinkClosed};

use tracing::trace;

/// 1-based worker coordinates: `(1, 1)` is the north-west corner of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeCoord {
    pub ni: usize,
    pub nj: usize,
}

impl NodeCoord {
    pub fn new(ni: usize, nj: usize) -> Self {
        Self { ni, nj }
    }

    /// All coordinates of a `q×q` mesh in row-major order.
    pub fn all(q: usize) -> impl Iterator<Item = NodeCoord> {
        (1..=q).flat_map(move |ni| (1..=q).map(move |nj| NodeCoord { ni, nj }))
    }

    /// Row-major position, matching the order of [`build_mesh`]'s result.
    #[inline]
    pub fn index(&self, q: usize) -> usize {
        (self.ni - 1) * q + (self.nj - 1)
    }

    /// Global offset of this worker's subgrid: the seeding origin of its
    /// halo corner, also the interior offset used when stitching snapshots.
    #[inline]
    pub fn origin(&self, m: usize) -> (usize, usize) {
        ((self.ni - 1) * m, (self.nj - 1) * m)
    }

    #[inline]
    pub fn has_north(&self) -> bool {
        self.ni > 1
    }

    #[inline]
    pub fn has_south(&self, q: usize) -> bool {
        self.ni < q
    }

    #[inline]
    pub fn has_west(&self) -> bool {
        self.nj > 1
    }

    #[inline]
    pub fn has_east(&self, q: usize) -> bool {
        self.nj < q
    }
}

/// The four conduit endpoints a worker exchanges halo data through.
#[derive(Debug)]
pub struct NeighborLinks<V> {
    pub north: Option<Conduit<V>>,
    pub south: Option<Conduit<V>>,
    pub east: Option<Conduit<V>>,
    pub west: Option<Conduit<V>>,
}

// Not derived: the derive would bound `V: Default`.
impl<V> Default for NeighborLinks<V> {
    fn default() -> Self {
        Self {
            north: None,
            south: None,
            east: None,
            west: None,
        }
    }
}

/// Allocate the full channel mesh for a `q×q` worker grid and return each
/// worker's endpoint set, indexed row-major (see [`NodeCoord::index`]).
///
/// Vertical links connect `(i, j)` to `(i+1, j)` for `1 ≤ i ≤ q-1`;
/// horizontal links connect `(i, j)` to `(i, j+1)` for `1 ≤ j ≤ q-1`.
pub fn build_mesh<V: Send>(q: usize) -> Vec<NeighborLinks<V>> {
    let mut links: Vec<NeighborLinks<V>> = (0..q * q).map(|_| NeighborLinks::default()).collect();
    let idx = |ni: usize, nj: usize| (ni - 1) * q + (nj - 1);

    for i in 1..q {
        for j in 1..=q {
            let (upper, lower) = Conduit::pair();
            links[idx(i, j)].south = Some(upper);
            links[idx(i + 1, j)].north = Some(lower);
        }
    }
    for i in 1..=q {
        for j in 1..q {
            let (western, eastern) = Conduit::pair();
            links[idx(i, j)].east = Some(western);
            links[idx(i, j + 1)].west = Some(eastern);
        }
    }

    trace!(
        target: "mesh.build",
        q,
        vertical = q * (q.saturating_sub(1)),
        horizontal = q * (q.saturating_sub(1)),
        "mesh_allocated"
    );
    links
}
