//! Gateway trait and an in-process provider double.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{CloudError, CloudResult};

/// Provider-side resize target for one node group.
///
/// Shared between the node group and whoever owns the provider client,
/// so all methods take `&self`.
pub trait CloudResizeGateway: Send + Sync {
    /// Current desired size of the group.
    fn current_size(&self) -> usize;

    /// Maximum size the provider will accept.
    fn max_size(&self) -> usize;

    /// Ask the provider to grow the group by `delta` nodes.
    fn increase_size(&self, delta: usize) -> CloudResult<()>;
}

#[derive(Debug)]
struct GatewayState {
    size: usize,
    max_size: usize,
    /// Every accepted `increase_size` delta, in call order.
    requests: Vec<usize>,
    fail_with: Option<String>,
}

/// Gateway that keeps the group size in memory.
///
/// Backs the daemon's simulated cluster and the test suites. Accepted
/// increases are applied immediately to `current_size`.
#[derive(Debug)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
}

impl InMemoryGateway {
    pub fn new(size: usize, max_size: usize) -> Self {
        Self {
            state: Mutex::new(GatewayState {
                size,
                max_size,
                requests: Vec::new(),
                fail_with: None,
            }),
        }
    }

    /// Make every subsequent `increase_size` fail with a provider error.
    pub fn fail_requests(&self, reason: impl Into<String>) {
        self.lock().fail_with = Some(reason.into());
    }

    /// Overwrite the provider-reported sizes (e.g. after a fresh scan).
    pub fn sync(&self, size: usize, max_size: usize) {
        let mut state = self.lock();
        state.size = size;
        state.max_size = max_size;
    }

    /// Deltas accepted so far.
    pub fn requests(&self) -> Vec<usize> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CloudResizeGateway for InMemoryGateway {
    fn current_size(&self) -> usize {
        self.lock().size
    }

    fn max_size(&self) -> usize {
        self.lock().max_size
    }

    fn increase_size(&self, delta: usize) -> CloudResult<()> {
        let mut state = self.lock();
        if let Some(reason) = &state.fail_with {
            return Err(CloudError::ProviderRequest(reason.clone()));
        }

        let requested = match state.size.checked_add(delta) {
            Some(requested) if requested <= state.max_size => requested,
            Some(requested) => {
                return Err(CloudError::ResizeRejected {
                    requested,
                    max_size: state.max_size,
                });
            }
            None => {
                return Err(CloudError::ResizeRejected {
                    requested: usize::MAX,
                    max_size: state.max_size,
                });
            }
        };

        state.size = requested;
        state.requests.push(delta);
        debug!(delta, size = requested, "in-memory group resized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_applies_to_current_size() {
        let gw = InMemoryGateway::new(3, 10);
        gw.increase_size(4).unwrap();

        assert_eq!(gw.current_size(), 7);
        assert_eq!(gw.max_size(), 10);
        assert_eq!(gw.requests(), vec![4]);
    }

    #[test]
    fn increase_past_max_is_rejected() {
        let gw = InMemoryGateway::new(8, 10);
        let err = gw.increase_size(3).unwrap_err();

        assert_eq!(
            err,
            CloudError::ResizeRejected {
                requested: 11,
                max_size: 10
            }
        );
        assert_eq!(gw.current_size(), 8);
        assert!(gw.requests().is_empty());
    }

    #[test]
    fn overflowing_increase_is_rejected() {
        let gw = InMemoryGateway::new(8, 10);
        let err = gw.increase_size(usize::MAX).unwrap_err();

        assert!(matches!(err, CloudError::ResizeRejected { max_size: 10, .. }));
        assert_eq!(gw.current_size(), 8);
        assert!(gw.requests().is_empty());
    }

    #[test]
    fn injected_failure_is_reported() {
        let gw = InMemoryGateway::new(1, 10);
        gw.fail_requests("throttled");

        let err = gw.increase_size(1).unwrap_err();
        assert_eq!(err, CloudError::ProviderRequest("throttled".to_string()));
        assert_eq!(gw.current_size(), 1);
    }

    #[test]
    fn sync_overwrites_sizes() {
        let gw = InMemoryGateway::new(1, 2);
        gw.sync(5, 20);
        assert_eq!(gw.current_size(), 5);
        assert_eq!(gw.max_size(), 20);
    }
}
