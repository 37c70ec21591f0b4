//! Progress observation for discovery runs
//!
//! Defines the `DiscoveryObserver` trait called once per visited page and a
//! no-op implementation for runs nobody watches.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::DiscoveryInfo;

/// Receives a snapshot after every page of a discovery run
///
/// The engine awaits the observer before moving on, so implementations may
/// enqueue or persist work first. Cancelling `stop` ends the run at the next
/// checkpoint; the page just reported is kept.
#[async_trait]
pub trait DiscoveryObserver: Send {
    async fn on_discover(&mut self, info: &DiscoveryInfo, stop: &CancellationToken);
}

#[async_trait]
impl<F> DiscoveryObserver for F
where
    F: FnMut(&DiscoveryInfo, &CancellationToken) + Send,
{
    async fn on_discover(&mut self, info: &DiscoveryInfo, stop: &CancellationToken) {
        (self)(info, stop);
    }
}

/// Observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

#[async_trait]
impl DiscoveryObserver for NoOpObserver {
    async fn on_discover(&mut self, _info: &DiscoveryInfo, _stop: &CancellationToken) {}
}
