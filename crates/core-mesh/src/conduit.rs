//! Bidirectional rendezvous links between neighboring workers.
//!
//! -------------------------------------------------------------------------
//! Channel policy
//! -------------------------------------------------------------------------
//! Every conduit is a pair of zero-capacity (`bounded(0)`) crossbeam
//! channels, one per direction. Rendezvous is a deliberate choice, not an
//! optimization target: the exchange protocol's deadlock-freedom argument is
//! stated against matched send/receive pairs, and buffering would not buy
//! parallelism because a worker must finish each column index before moving
//! to the next anyway. Disconnection (peer thread gone) is the shutdown
//! signal; there are no timeouts and no retries at this layer.

use crossbeam_channel::{Receiver, Sender, bounded};

/// The peer on the other end of a conduit has exited and dropped its half.
/// Treated as cooperative shutdown by callers, never as a recoverable fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkClosed;

/// One endpoint of a bidirectional rendezvous link. The same endpoint sends
/// in one exchange phase and receives in the mirrored phase.
#[derive(Debug)]
pub struct Conduit<V> {
    tx: Sender<V>,
    rx: Receiver<V>,
}

impl<V: Send> Conduit<V> {
    /// Build the two halves of one link.
    pub fn pair() -> (Conduit<V>, Conduit<V>) {
        let (a_tx, b_rx) = bounded(0);
        let (b_tx, a_rx) = bounded(0);
        (
            Conduit { tx: a_tx, rx: a_rx },
            Conduit { tx: b_tx, rx: b_rx },
        )
    }

    /// Blocks until the peer receives.
    pub fn send(&self, value: V) -> Result<(), LinkClosed> {
        self.tx.send(value).map_err(|_| LinkClosed)
    }

    /// Blocks until the peer sends.
    pub fn recv(&self) -> Result<V, LinkClosed> {
        self.rx.recv().map_err(|_| LinkClosed)
    }
}
