use std::num::NonZeroUsize;
use std::ops::Range;

use crate::group::GroupConfig;

/// Splits `total` samples among `num_workers` and returns the shard for `worker_id`.
///
/// Properties:
/// - Ranges are contiguous, disjoint and all of the same size.
/// - The `total % num_workers` trailing samples belong to no shard, so every
///   worker runs the same amount of steps per epoch.
pub fn shard_range(total: usize, worker_id: usize, num_workers: usize) -> Range<usize> {
    assert!(num_workers > 0);
    assert!(worker_id < num_workers);

    let size = total / num_workers;
    let start = worker_id * size;

    start..start + size
}

/// The slice of the dataset one worker trains on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSpec {
    pub worker_id: usize,
    pub num_workers: NonZeroUsize,
}

impl ShardSpec {
    pub fn new(worker_id: usize, num_workers: NonZeroUsize) -> Self {
        assert!(worker_id < num_workers.get(), "worker_id out of range");
        Self {
            worker_id,
            num_workers,
        }
    }

    /// The shard of this worker given its position among the group's workers.
    pub fn for_group(group: &GroupConfig) -> Self {
        Self {
            worker_id: group.worker_index(),
            num_workers: group.num_workers(),
        }
    }

    #[inline]
    pub fn range(self, total: usize) -> Range<usize> {
        shard_range(total, self.worker_id, self.num_workers.get())
    }
}
