use egress_core::{HeaderList, LogRecord, ObjectPool, PoolStats, PropertyBag};

/// The three pools one pipeline draws from.
///
/// Each pipeline owns its own set; header lists and property bags are pooled
/// apart from records because they are only needed when the matching feature
/// is enabled.
#[derive(Clone)]
pub struct RecordPools {
    pub records: ObjectPool<LogRecord>,
    pub headers: ObjectPool<HeaderList>,
    pub bags: ObjectPool<PropertyBag>,
}

/// Snapshot of [`RecordPools`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordPoolStats {
    pub records: PoolStats,
    pub headers: PoolStats,
    pub bags: PoolStats,
}

impl RecordPools {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: ObjectPool::new(capacity),
            headers: ObjectPool::new(capacity),
            bags: ObjectPool::new(capacity),
        }
    }

    pub fn stats(&self) -> RecordPoolStats {
        RecordPoolStats {
            records: self.records.stats(),
            headers: self.headers.stats(),
            bags: self.bags.stats(),
        }
    }
}

impl RecordPoolStats {
    /// Objects currently checked out across all pools.
    pub fn outstanding(&self) -> u64 {
        self.records.outstanding() + self.headers.outstanding() + self.bags.outstanding()
    }
}
