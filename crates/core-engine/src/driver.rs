//! Worker loop: emit a snapshot, relax, repeat.

use core_grid::{CellRule, CellValue, Subgrid};
use core_mesh::{NeighborLinks, NodeCoord};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::debug;

use crate::{SNAPSHOTS_EMITTED, relaxation_step};

/// One worker's view of its subgrid at the top of an output cycle. The cell
/// array is a value copy: the aggregator reads it while the worker is
/// already relaxing toward the next cycle.
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
    pub coord: NodeCoord,
    pub cells: Subgrid<V>,
}

/// Why a worker loop ended. There is no error path out of a worker: both
/// reasons are cooperative shutdown propagated through channel
/// disconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The aggregator (or the whole simulation) dropped the snapshot
    /// channel.
    SnapshotChannelClosed,
    /// A neighboring worker exited and dropped its conduit endpoints.
    MeshLinkClosed,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::SnapshotChannelClosed => "snapshot_channel_closed",
            ExitReason::MeshLinkClosed => "mesh_link_closed",
        }
    }
}

/// The per-worker driver. Owns the subgrid for the worker's lifetime;
/// nothing else ever mutates it.
pub struct NodeDriver<V: CellValue> {
    coord: NodeCoord,
    sub: Subgrid<V>,
    links: NeighborLinks<V>,
    rule: Arc<dyn CellRule<V>>,
    snapshots: Sender<Snapshot<V>>,
    steps_per_snapshot: usize,
}

impl<V: CellValue> NodeDriver<V> {
    pub fn new(
        coord: NodeCoord,
        sub: Subgrid<V>,
        links: NeighborLinks<V>,
        rule: Arc<dyn CellRule<V>>,
        snapshots: Sender<Snapshot<V>>,
        steps_per_snapshot: usize,
    ) -> Self {
        Self {
            coord,
            sub,
            links,
            rule,
            snapshots,
            steps_per_snapshot,
        }
    }

    /// Run until shutdown. The loop has no sleep and no timeout; every
    /// blocking point is a channel rendezvous.
    pub fn run(mut self) -> ExitReason {
        let reason = self.drive();
        debug!(
            target: "engine.node",
            ni = self.coord.ni,
            nj = self.coord.nj,
            reason = reason.as_str(),
            "worker_exit"
        );
        reason
    }

    fn drive(&mut self) -> ExitReason {
        loop {
            let snapshot = Snapshot {
                coord: self.coord,
                cells: self.sub.clone(),
            };
            if self.snapshots.send(snapshot).is_err() {
                return ExitReason::SnapshotChannelClosed;
            }
            SNAPSHOTS_EMITTED.fetch_add(1, Ordering::Relaxed);

            for _ in 0..self.steps_per_snapshot {
                if relaxation_step(&mut self.sub, &self.links, self.rule.as_ref()).is_err() {
                    return ExitReason::MeshLinkClosed;
                }
            }
        }
    }
}
