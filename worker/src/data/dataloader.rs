use std::num::NonZeroUsize;
use std::ops::Range;

use super::dataset::{BatchRef, InMemoryDataset};
use super::shard::ShardSpec;

/// Shard-aware DataLoader producing borrowed batches (zero-copy).
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: InMemoryDataset,
    shard: ShardSpec,
    shard_range: Range<usize>,
    batch_size: usize,
    cursor: usize, // absolute sample index in dataset
}

impl DataLoader {
    pub fn new(dataset: InMemoryDataset, shard: ShardSpec, batch_size: NonZeroUsize) -> Self {
        let total = dataset.len();
        let shard_range = shard.range(total);
        let cursor = shard_range.start;

        Self {
            dataset,
            shard,
            shard_range,
            batch_size: batch_size.get(),
            cursor,
        }
    }

    #[inline]
    pub fn shard(&self) -> ShardSpec {
        self.shard
    }

    #[inline]
    pub fn shard_range(&self) -> Range<usize> {
        self.shard_range.clone()
    }

    /// The amount of batches in one pass over the shard.
    #[inline]
    pub fn num_batches(&self) -> usize {
        self.shard_range.len().div_ceil(self.batch_size)
    }

    #[inline]
    pub fn reset(&mut self) {
        self.cursor = self.shard_range.start;
    }

    /// Returns the next borrowed batch for this shard, or None if exhausted.
    pub fn next_batch(&mut self) -> Option<BatchRef<'_>> {
        if self.cursor >= self.shard_range.end {
            return None;
        }

        let start = self.cursor;
        let end = (start + self.batch_size).min(self.shard_range.end);
        self.cursor = end;

        Some(self.dataset.rows(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataloader_borrowed_batches_respect_shard_and_batch_size() {
        let ds = InMemoryDataset::new(
            (0..10).map(|i| i as f32).collect(),
            (0..10).map(|i| (i as f32) + 100.0).collect(),
            1,
            1,
        )
        .unwrap();

        let shard = ShardSpec::new(1, NonZeroUsize::new(3).unwrap()); // 3..6
        let mut dl = DataLoader::new(ds, shard, NonZeroUsize::new(2).unwrap());

        assert_eq!(dl.shard_range(), 3..6);
        assert_eq!(dl.num_batches(), 2);

        let b1 = dl.next_batch().unwrap();
        assert_eq!(b1.xs, &[3.0, 4.0]);
        assert_eq!(b1.ys, &[103.0, 104.0]);

        let b2 = dl.next_batch().unwrap();
        assert_eq!(b2.xs, &[5.0]);
        assert_eq!(b2.ys, &[105.0]);

        assert!(dl.next_batch().is_none());

        dl.reset();
        let b3 = dl.next_batch().unwrap();
        assert_eq!(b3.xs, &[3.0, 4.0]);
    }

    #[test]
    fn batches_slice_whole_rows() {
        let ds = InMemoryDataset::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![10.0, 20.0, 30.0],
            2,
            1,
        )
        .unwrap();

        let shard = ShardSpec::new(0, NonZeroUsize::new(1).unwrap());
        let mut dl = DataLoader::new(ds, shard, NonZeroUsize::new(2).unwrap());

        let b1 = dl.next_batch().unwrap();
        assert_eq!(b1.len(), 2);
        assert_eq!(b1.xs, &[1.0, 2.0, 3.0, 4.0]);

        let b2 = dl.next_batch().unwrap();
        assert_eq!(b2.xs, &[5.0, 6.0]);
        assert_eq!(b2.ys, &[30.0]);
    }
}
