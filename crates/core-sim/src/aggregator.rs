//! Snapshot aggregation into the global grid.
//!
//! The aggregator is the `q² + 1`-th task of a simulation. It consumes one
//! snapshot per worker per output cycle (arbitrary arrival order inside a
//! cycle), stitches the interiors into its privately owned [`GlobalGrid`],
//! and emits a [`Frame`] per completed batch. There is no deduplication:
//! workers are lock-stepped by the exchange protocol, so a worker cannot run
//! a cycle ahead of the rest.

use core_engine::Snapshot;
use core_grid::{CellValue, GlobalGrid};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::debug;

use crate::FRAMES_EMITTED;

/// One output cycle: wall time since bootstrap paired with a value copy of
/// the assembled grid.
#[derive(Debug, Clone)]
pub struct Frame<V> {
    /// Milliseconds since bootstrap; monotonic across frames.
    pub elapsed_ms: u64,
    pub grid: GlobalGrid<V>,
}

pub struct Aggregator<V: CellValue> {
    grid: GlobalGrid<V>,
    subgrid_dim: usize,
    worker_count: usize,
    started: Instant,
    snapshots: Receiver<Snapshot<V>>,
    frames: Sender<Frame<V>>,
}

impl<V: CellValue> Aggregator<V> {
    pub fn new(
        problem_dim: usize,
        subgrid_dim: usize,
        worker_count: usize,
        fill: V,
        started: Instant,
        snapshots: Receiver<Snapshot<V>>,
        frames: Sender<Frame<V>>,
    ) -> Self {
        Self {
            grid: GlobalGrid::new(problem_dim, fill),
            subgrid_dim,
            worker_count,
            started,
            snapshots,
            frames,
        }
    }

    /// Consume batches until either channel side disconnects. A partial
    /// batch at shutdown is discarded, never emitted.
    pub fn run(mut self) {
        loop {
            for _ in 0..self.worker_count {
                match self.snapshots.recv() {
                    Ok(snapshot) => {
                        let origin = snapshot.coord.origin(self.subgrid_dim);
                        self.grid.blit(&snapshot.cells, origin);
                    }
                    Err(_) => {
                        debug!(
                            target: "sim.aggregator",
                            reason = "snapshot_channel_closed",
                            "aggregator_exit"
                        );
                        return;
                    }
                }
            }
            let frame = Frame {
                elapsed_ms: self.started.elapsed().as_millis() as u64,
                grid: self.grid.clone(),
            };
            if self.frames.send(frame).is_err() {
                debug!(
                    target: "sim.aggregator",
                    reason = "frame_receiver_closed",
                    "aggregator_exit"
                );
                return;
            }
            FRAMES_EMITTED.fetch_add(1, Ordering::Relaxed);
        }
    }
}
