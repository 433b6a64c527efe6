//! Simulation bootstrap: wire the mesh, spawn the workers and the
//! aggregator, hand back the frame channel.
//!
//! Shutdown is cooperative and flows entirely through channel
//! disconnection: dropping the frame receiver disconnects the aggregator,
//! the aggregator drops the snapshot channel, and every worker unwinds at
//! its next suspension point (snapshot emission or conduit rendezvous).
//! [`Simulation::shutdown`] performs that drop and joins every thread.

use anyhow::Result;
use core_engine::{ExitReason, NodeDriver};
use core_grid::{CellRule, CellValue, InitialValues, Subgrid};
use core_mesh::{NodeCoord, build_mesh};
use crossbeam_channel::{Receiver, unbounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::info;

use crate::aggregator::{Aggregator, Frame};
use crate::config::SimConfig;

/// The application side of a simulation: seed values plus the transition
/// rule every worker applies.
pub struct Problem<V> {
    pub initial: InitialValues<V>,
    pub rule: Arc<dyn CellRule<V>>,
}

impl<V: CellValue> Problem<V> {
    pub fn new(initial: InitialValues<V>, rule: impl CellRule<V> + 'static) -> Self {
        Self {
            initial,
            rule: Arc::new(rule),
        }
    }
}

/// A running simulation. Frames arrive on [`Simulation::frames`] once per
/// output cycle until shutdown.
#[derive(Debug)]
pub struct Simulation<V> {
    frames: Receiver<Frame<V>>,
    workers: Vec<JoinHandle<ExitReason>>,
    aggregator: JoinHandle<()>,
}

impl<V: CellValue> Simulation<V> {
    /// The outbound frame channel.
    pub fn frames(&self) -> &Receiver<Frame<V>> {
        &self.frames
    }

    /// Stop producing frames and join every thread. Workers observe the
    /// disconnect at their next channel operation, so this returns promptly
    /// even mid-cycle.
    pub fn shutdown(self) {
        drop(self.frames);
        for worker in self.workers {
            // A worker that panicked already logged through the panic hook;
            // shutdown still joins the rest.
            let _ = worker.join();
        }
        let _ = self.aggregator.join();
    }
}

/// Validate the configuration, then spawn `q²` workers plus the aggregator.
///
/// Each worker seeds its own subgrid on its own thread before entering the
/// snapshot/relax loop, so `launch` returns as soon as the threads exist.
pub fn launch<V: CellValue>(config: SimConfig, problem: Problem<V>) -> Result<Simulation<V>> {
    config.validate()?;

    let q = config.mesh_dim;
    let m = config.subgrid_dim;
    let n = config.problem_dim();
    let started = Instant::now();

    let (snapshot_tx, snapshot_rx) = unbounded();
    let (frame_tx, frame_rx) = unbounded();

    let mut link_sets = build_mesh(q);
    let mut workers = Vec::with_capacity(config.worker_count());
    for (coord, links) in NodeCoord::all(q).zip(link_sets.drain(..)) {
        let initial = problem.initial;
        let rule = Arc::clone(&problem.rule);
        let snapshots = snapshot_tx.clone();
        let steps = config.steps_per_snapshot;
        let handle = thread::Builder::new()
            .name(format!("relax-{}-{}", coord.ni, coord.nj))
            .spawn(move || {
                let sub = Subgrid::from_initial_values(m, n, coord.origin(m), &initial);
                NodeDriver::new(coord, sub, links, rule, snapshots, steps).run()
            })?;
        workers.push(handle);
    }
    // Workers hold the only remaining senders; when the last worker exits
    // the aggregator observes the disconnect.
    drop(snapshot_tx);

    let aggregator = Aggregator::new(
        n,
        m,
        config.worker_count(),
        problem.initial.interior,
        started,
        snapshot_rx,
        frame_tx,
    );
    let aggregator = thread::Builder::new()
        .name("relax-aggregator".into())
        .spawn(move || aggregator.run())?;

    info!(
        target: "sim.bootstrap",
        q,
        m,
        n,
        workers = workers.len(),
        steps_per_snapshot = config.steps_per_snapshot,
        "simulation_started"
    );
    Ok(Simulation {
        frames: frame_rx,
        workers,
        aggregator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use core_grid::Subgrid;

    fn identity_problem(value: f64) -> Problem<f64> {
        Problem::new(
            InitialValues {
                north: value,
                south: value,
                west: value,
                east: value,
                interior: value,
            },
            |g: &Subgrid<f64>, i: usize, j: usize| g.get(i, j),
        )
    }

    #[test]
    fn launch_rejects_invalid_knobs() {
        let err = launch(SimConfig::new(2, 3), identity_problem(0.0)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::SubgridDim(3))
        );
    }

    #[test]
    fn shutdown_joins_promptly() {
        let sim = launch(SimConfig::new(2, 2), identity_problem(1.0)).unwrap();
        // Let at least one cycle through, then stop.
        let first = sim.frames().recv().unwrap();
        assert_eq!(first.grid.dim(), 4);
        sim.shutdown();
    }
}
