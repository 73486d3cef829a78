use crate::models::VerifiedEndpoint;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Verified endpoints collected while probing.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    endpoints: Mutex<HashSet<VerifiedEndpoint>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endpoint: VerifiedEndpoint) {
        self.endpoints.lock().insert(endpoint);
    }

    pub fn len(&self) -> usize {
        self.endpoints.lock().len()
    }

    pub(super) fn take(&self) -> ResultAggregator {
        ResultAggregator {
            endpoints: Mutex::new(std::mem::take(&mut *self.endpoints.lock())),
        }
    }

    /// All endpoints ordered by dotted-decimal address text, then port.
    /// The order depends only on the set contents, never on insertion order.
    pub fn finalize(self) -> Vec<VerifiedEndpoint> {
        let mut endpoints: Vec<VerifiedEndpoint> = self.endpoints.into_inner().into_iter().collect();
        endpoints.sort_by_cached_key(|e| (e.address.to_string(), e.port));
        endpoints
    }
}
