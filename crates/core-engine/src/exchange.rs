//! Two-phase halo exchange.
//!
//! An exchange refreshes the ghost cells of one checkerboard color so the
//! following parity update reads current neighbor data. It walks the edge
//! indices `1..=m` in stride 2, split across two phases:
//!
//! * **Phase 1** at index `k`: receive the north ghost, send the south edge,
//!   send the east edge, receive the west ghost.
//! * **Phase 2** at index `k`: send the north edge, receive the south ghost,
//!   receive the east ghost, send the west edge.
//!
//! The four directional operations of one index run concurrently and join
//! before the next index starts. Deadlock freedom rests on the direction
//! split, not on buffering: in phase 1 every send points south or east and
//! every receive points north or west, so the wait-for graph across the mesh
//! is acyclic; phase 2 reverses both axes. Phases are serialized per worker.
//!
//! The `parity` argument names the color of the halo cells being refreshed.
//! A caller about to update interior cells of parity `p` reads neighbors of
//! parity `1 - p`, so it runs `exchange(sub, links, 1 - p)` first.

use core_grid::{CellValue, Subgrid};
use core_mesh::{LinkClosed, NeighborLinks};
use std::sync::atomic::Ordering;
use std::thread::{self, ScopedJoinHandle};
use tracing::trace;

use crate::LINK_DISCONNECTS;

/// Phase-1 edge indices for the given halo color: `2-parity, 4-parity, …,
/// m-parity`.
pub fn phase_one_indices(m: usize, parity: usize) -> impl Iterator<Item = usize> {
    debug_assert!(parity < 2, "parity is a checkerboard color");
    (2 - parity..=m - parity).step_by(2)
}

/// Phase-2 edge indices for the given halo color: `1+parity, 3+parity, …,
/// m-1+parity`. Together with phase 1 this covers `1..=m` exactly once
/// (`m` even).
pub fn phase_two_indices(m: usize, parity: usize) -> impl Iterator<Item = usize> {
    debug_assert!(parity < 2, "parity is a checkerboard color");
    (1 + parity..=m - 1 + parity).step_by(2)
}

/// Refresh all ghost cells of checkerboard color `parity` from the current
/// interior edges of the neighboring workers.
///
/// Errors only when a peer endpoint is gone, which the caller treats as
/// shutdown.
pub fn exchange<V: CellValue>(
    sub: &mut Subgrid<V>,
    links: &NeighborLinks<V>,
    parity: usize,
) -> Result<(), LinkClosed> {
    let m = sub.dim();
    for k in phase_one_indices(m, parity) {
        phase_one_at(sub, links, k).inspect_err(|_| note_disconnect("phase1", k))?;
    }
    for k in phase_two_indices(m, parity) {
        phase_two_at(sub, links, k).inspect_err(|_| note_disconnect("phase2", k))?;
    }
    Ok(())
}

fn note_disconnect(phase: &'static str, k: usize) {
    LINK_DISCONNECTS.fetch_add(1, Ordering::Relaxed);
    trace!(target: "engine.exchange", phase, k, "peer_gone");
}

fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// One phase-1 sub-exchange. Outbound edge values are copied out before the
/// scope so the spawned tasks never borrow the subgrid; inbound ghost values
/// are written after every task has joined.
fn phase_one_at<V: CellValue>(
    sub: &mut Subgrid<V>,
    links: &NeighborLinks<V>,
    k: usize,
) -> Result<(), LinkClosed> {
    let m = sub.dim();
    let south_out = links.south.as_ref().map(|link| (link, sub.get(m, k)));
    let east_out = links.east.as_ref().map(|link| (link, sub.get(k, m)));

    let (north_in, west_in) = thread::scope(|s| {
        let north = links.north.as_ref().map(|link| s.spawn(move || link.recv()));
        let west = links.west.as_ref().map(|link| s.spawn(move || link.recv()));
        let south = south_out.map(|(link, v)| s.spawn(move || link.send(v)));
        let east = east_out.map(|(link, v)| s.spawn(move || link.send(v)));

        // Join everything before propagating any failure so no task is left
        // holding a rendezvous.
        let north_in = north.map(join).transpose();
        let west_in = west.map(join).transpose();
        let south_done = south.map(join).transpose();
        let east_done = east.map(join).transpose();

        south_done?;
        east_done?;
        Ok((north_in?, west_in?))
    })?;

    if let Some(v) = north_in {
        sub.set(0, k, v);
    }
    if let Some(v) = west_in {
        sub.set(k, 0, v);
    }
    Ok(())
}

/// One phase-2 sub-exchange: the mirror image of phase 1 on both axes.
fn phase_two_at<V: CellValue>(
    sub: &mut Subgrid<V>,
    links: &NeighborLinks<V>,
    k: usize,
) -> Result<(), LinkClosed> {
    let m = sub.dim();
    let north_out = links.north.as_ref().map(|link| (link, sub.get(1, k)));
    let west_out = links.west.as_ref().map(|link| (link, sub.get(k, 1)));

    let (south_in, east_in) = thread::scope(|s| {
        let south = links.south.as_ref().map(|link| s.spawn(move || link.recv()));
        let east = links.east.as_ref().map(|link| s.spawn(move || link.recv()));
        let north = north_out.map(|(link, v)| s.spawn(move || link.send(v)));
        let west = west_out.map(|(link, v)| s.spawn(move || link.send(v)));

        let south_in = south.map(join).transpose();
        let east_in = east.map(join).transpose();
        let north_done = north.map(join).transpose();
        let west_done = west.map(join).transpose();

        north_done?;
        west_done?;
        Ok((south_in?, east_in?))
    })?;

    if let Some(v) = south_in {
        sub.set(m + 1, k, v);
    }
    if let Some(v) = east_in {
        sub.set(k, m + 1, v);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(iter: impl Iterator<Item = usize>) -> Vec<usize> {
        iter.collect()
    }

    #[test]
    fn stride_ranges_m4() {
        assert_eq!(collect(phase_one_indices(4, 0)), vec![2, 4]);
        assert_eq!(collect(phase_two_indices(4, 0)), vec![1, 3]);
        assert_eq!(collect(phase_one_indices(4, 1)), vec![1, 3]);
        assert_eq!(collect(phase_two_indices(4, 1)), vec![2, 4]);
    }

    #[test]
    fn stride_ranges_m2() {
        assert_eq!(collect(phase_one_indices(2, 0)), vec![2]);
        assert_eq!(collect(phase_two_indices(2, 0)), vec![1]);
        assert_eq!(collect(phase_one_indices(2, 1)), vec![1]);
        assert_eq!(collect(phase_two_indices(2, 1)), vec![2]);
    }

    #[test]
    fn phases_cover_every_edge_index_once() {
        for m in [2usize, 4, 8, 16] {
            for parity in [0usize, 1] {
                let mut all: Vec<usize> = phase_one_indices(m, parity)
                    .chain(phase_two_indices(m, parity))
                    .collect();
                all.sort_unstable();
                assert_eq!(all, (1..=m).collect::<Vec<_>>(), "m={m} parity={parity}");
            }
        }
    }

    #[test]
    fn exchange_without_links_is_a_no_op() {
        let mut sub = Subgrid::filled(4, 3u8);
        let before = sub.clone();
        exchange(&mut sub, &NeighborLinks::default(), 0).unwrap();
        exchange(&mut sub, &NeighborLinks::default(), 1).unwrap();
        assert_eq!(sub, before);
    }
}
