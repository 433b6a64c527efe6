//! core-engine: the concurrent exchange-and-relax machinery.
//!
//! A worker advances its subgrid in lock-step with the rest of the mesh:
//! refresh one checkerboard color of halo cells through the two-phase
//! [`exchange`], update the opposite color of interior cells in place, and
//! repeat for the other color. The [`NodeDriver`] wraps that cycle in the
//! worker's snapshot-emitting loop.
//!
//! Ordering guarantees (per worker):
//! * within an exchange, the sub-exchange at index `k` completes before
//!   `k + 2` starts, and phase 1 completes before phase 2;
//! * an exchange completes before the parity update it feeds;
//! * a full relaxation step completes before the next snapshot is emitted.
//!
//! Between workers the only synchronization is the rendezvous of matched
//! sends and receives; there is no global ordering and none is needed.

mod driver;
mod exchange;
mod relax;

pub use driver::{ExitReason, NodeDriver, Snapshot};
pub use exchange::{exchange, phase_one_indices, phase_two_indices};
pub use relax::{relaxation_step, update_parity};

use std::sync::atomic::AtomicU64;

// -------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------
// Simple atomic counters (fetch_add relaxed, no locking). Inspectable from
// tests and debug logs; not a metrics surface. Counters are process-global,
// so assertions against them must tolerate concurrent simulations.
// -------------------------------------------------------------------------
/// Snapshots handed to the aggregator across all workers.
pub static SNAPSHOTS_EMITTED: AtomicU64 = AtomicU64::new(0);
/// Completed relaxation steps across all workers.
pub static RELAXATION_STEPS: AtomicU64 = AtomicU64::new(0);
/// Exchanges aborted because a peer disappeared mid-protocol.
pub static LINK_DISCONNECTS: AtomicU64 = AtomicU64::new(0);
