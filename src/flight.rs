use tokio::sync::{Mutex, MutexGuard};

use crate::error::DappError;

/// Rejects a second run of an operation while one is outstanding.
pub struct SingleFlight {
    operation: &'static str,
    lock: Mutex<()>,
}

impl SingleFlight {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            lock: Mutex::new(()),
        }
    }

    /// The returned guard releases the slot when dropped.
    pub fn try_begin(&self) -> Result<MutexGuard<'_, ()>, DappError> {
        self.lock
            .try_lock()
            .map_err(|_| DappError::Busy(self.operation))
    }
}
