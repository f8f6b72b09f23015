//! Readiness gate.
//!
//! A spawner returning does not mean the object is finished. Engines often
//! run deferred setup on the next frames (a device only gets its battery
//! after its own start hook runs). Metadata that touches that setup has to
//! wait, so the orchestrator polls the gate here before applying it.

use crate::integration::{ObjectHandle, ReadinessGate};
use std::time::Duration;

/// Outcome of a readiness wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// The gate cleared.
    Ready,
    /// The bound elapsed first.
    TimedOut,
}

/// Polls `gate` for `handle` every `poll_interval` until it reports ready.
///
/// With `timeout == None` this waits for as long as it takes.
pub async fn wait_until_ready(
    gate: &dyn ReadinessGate,
    handle: ObjectHandle,
    poll_interval: Duration,
    timeout: Option<Duration>,
) -> Readiness {
    let poll = async {
        while !gate.is_ready(handle) {
            tokio::time::sleep(poll_interval).await;
        }
    };

    match timeout {
        None => {
            poll.await;
            Readiness::Ready
        }
        Some(limit) => match tokio::time::timeout(limit, poll).await {
            Ok(()) => Readiness::Ready,
            Err(_) => Readiness::TimedOut,
        },
    }
}
