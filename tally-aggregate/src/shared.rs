//! Mutex boundary for feeding one aggregator from several producers.

use std::sync::{Arc, Mutex};

use tally_result::{Error, Result};
use tally_types::Row;

use crate::aggregator::GroupedAggregator;

/// Cloneable handle that serializes merges from concurrent producers.
///
/// The aggregator stays behind the mutex for the whole build phase. Reading
/// requires [`into_inner`](Self::into_inner), which only succeeds once every
/// other handle has been dropped, so results are never observed while a
/// producer can still merge.
#[derive(Debug, Clone)]
pub struct SharedAggregator {
    inner: Arc<Mutex<GroupedAggregator>>,
}

impl SharedAggregator {
    pub fn new(aggregator: GroupedAggregator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(aggregator)),
        }
    }

    /// Merge one row under the lock.
    pub fn merge(&self, row: &Row) -> Result<()> {
        self.lock()?.merge_tuple_into_group(row)
    }

    /// Merge a run of rows while holding the lock once.
    pub fn merge_all<'r>(&self, rows: impl IntoIterator<Item = &'r Row>) -> Result<()> {
        let mut guard = self.lock()?;
        for row in rows {
            guard.merge_tuple_into_group(row)?;
        }
        Ok(())
    }

    /// End the build phase and take the aggregator back.
    ///
    /// Fails with a protocol error while other handles are alive.
    pub fn into_inner(self) -> Result<GroupedAggregator> {
        let mutex = Arc::try_unwrap(self.inner).map_err(|_| {
            Error::protocol("cannot end the build phase while other producer handles are alive")
        })?;
        mutex.into_inner().map_err(|_| poisoned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, GroupedAggregator>> {
        self.inner.lock().map_err(|_| poisoned())
    }
}

fn poisoned() -> Error {
    Error::Internal("aggregator mutex poisoned by a panicking producer".into())
}
