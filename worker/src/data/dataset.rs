use crate::{Result, WorkerErr, config::DatasetConfig};

/// A row-major in-memory dataset.
///
/// Every sample is `x_size` features followed by its `y_size` targets, kept in
/// two separate buffers so batches can borrow contiguous slices of each.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    xs: Vec<f32>,
    ys: Vec<f32>,
    x_size: usize,
    y_size: usize,
}

impl InMemoryDataset {
    /// Creates a new dataset from owned buffers.
    ///
    /// # Arguments
    /// * `xs` - The features of every sample, `x_size` values each.
    /// * `ys` - The targets of every sample, `y_size` values each.
    /// * `x_size` - The amount of features per sample.
    /// * `y_size` - The amount of targets per sample.
    ///
    /// # Returns
    /// A new `InMemoryDataset` or an error if the buffers disagree on the sample count.
    pub fn new(xs: Vec<f32>, ys: Vec<f32>, x_size: usize, y_size: usize) -> Result<Self> {
        if x_size == 0 || y_size == 0 {
            return Err(WorkerErr::InvalidConfig(
                "samples need at least one feature and one target".into(),
            ));
        }
        if xs.len() % x_size != 0 || ys.len() % y_size != 0 {
            return Err(WorkerErr::InvalidConfig(format!(
                "ragged dataset: {} features of width {x_size}, {} targets of width {y_size}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() / x_size != ys.len() / y_size {
            return Err(WorkerErr::InvalidConfig(format!(
                "dataset has {} feature rows but {} target rows",
                xs.len() / x_size,
                ys.len() / y_size
            )));
        }
        if xs.is_empty() {
            return Err(WorkerErr::InvalidConfig("dataset must be non-empty".into()));
        }

        Ok(Self {
            xs,
            ys,
            x_size,
            y_size,
        })
    }

    /// Splits interleaved `[x.., y..]` rows into a dataset.
    pub fn from_config(cfg: &DatasetConfig) -> Result<Self> {
        let row = cfg.x_size + cfg.y_size;
        if row == 0 || cfg.data.len() % row != 0 {
            return Err(WorkerErr::InvalidConfig(format!(
                "dataset of {} values doesn't split into rows of {row}",
                cfg.data.len()
            )));
        }

        let rows = cfg.data.len() / row;
        let mut xs = Vec::with_capacity(rows * cfg.x_size);
        let mut ys = Vec::with_capacity(rows * cfg.y_size);
        for sample in cfg.data.chunks_exact(row) {
            let (x, y) = sample.split_at(cfg.x_size);
            xs.extend_from_slice(x);
            ys.extend_from_slice(y);
        }

        Self::new(xs, ys, cfg.x_size, cfg.y_size)
    }

    /// The amount of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len() / self.x_size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    #[inline]
    pub fn x_size(&self) -> usize {
        self.x_size
    }

    #[inline]
    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// Borrows the samples in `[start..end)`.
    #[inline]
    pub fn rows(&self, start: usize, end: usize) -> BatchRef<'_> {
        BatchRef {
            xs: &self.xs[start * self.x_size..end * self.x_size],
            ys: &self.ys[start * self.y_size..end * self.y_size],
            x_size: self.x_size,
            y_size: self.y_size,
        }
    }
}

/// Borrowed batch view (zero-copy).
#[derive(Debug, Clone, Copy)]
pub struct BatchRef<'a> {
    pub xs: &'a [f32],
    pub ys: &'a [f32],
    pub x_size: usize,
    pub y_size: usize,
}

impl BatchRef<'_> {
    /// The amount of samples in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len().checked_div(self.x_size).unwrap_or_default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_basic() {
        let ds = InMemoryDataset::new(vec![1.0, 2.0, 3.0, 4.0], vec![3.0, 5.0], 2, 1).unwrap();
        assert_eq!(ds.len(), 2);

        let b = ds.rows(1, 2);
        assert_eq!(b.xs, &[3.0, 4.0]);
        assert_eq!(b.ys, &[5.0]);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn from_config_splits_interleaved_rows() {
        let cfg = DatasetConfig {
            x_size: 2,
            y_size: 1,
            data: vec![1.0, 2.0, 10.0, 3.0, 4.0, 20.0],
        };

        let ds = InMemoryDataset::from_config(&cfg).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows(0, 2).xs, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ds.rows(0, 2).ys, &[10.0, 20.0]);
    }

    #[test]
    fn rejects_ragged_and_empty_data() {
        assert!(InMemoryDataset::new(vec![1.0, 2.0, 3.0], vec![1.0], 2, 1).is_err());
        assert!(InMemoryDataset::new(vec![1.0, 2.0], vec![1.0, 2.0], 1, 1).is_ok());
        assert!(InMemoryDataset::new(vec![1.0, 2.0], vec![1.0], 1, 1).is_err());
        assert!(InMemoryDataset::new(vec![], vec![], 1, 1).is_err());
    }
}
