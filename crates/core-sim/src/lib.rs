//! core-sim: simulation assembly and output.
//!
//! Everything above the per-worker engine lives here: validated
//! configuration (with an optional TOML layer), the bootstrap that wires
//! the channel mesh and spawns `q²` workers plus the aggregator, and the
//! frame channel a host consumes. The host supplies a [`Problem`] (seed
//! values and transition rule) and reads [`Frame`]s; it never touches a
//! subgrid or a conduit directly.

pub mod config;

mod aggregator;
mod bootstrap;

pub use aggregator::{Aggregator, Frame};
pub use bootstrap::{Problem, Simulation, launch};
pub use config::{ConfigError, SimConfig};

use std::sync::atomic::AtomicU64;

/// Frames emitted across all simulations in this process. Companion to the
/// worker-side counters in `core-engine`.
pub static FRAMES_EMITTED: AtomicU64 = AtomicU64::new(0);
