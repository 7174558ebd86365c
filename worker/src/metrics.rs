use std::time::Duration;

use log::info;

/// Per-batch observability record, every field a running mean over the
/// batches of the current epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BatchMetrics {
    /// Always zero, the worker doesn't evaluate.
    pub accuracy: f32,
    pub batch_time: Duration,
    pub compute_time: Duration,
    pub comm_time: Duration,
}

/// Running sums over the batches of one epoch.
#[derive(Debug, Default, Clone)]
pub struct EpochTimer {
    batches: u32,
    batch_time: Duration,
    compute_time: Duration,
    comm_time: Duration,
    loss: f32,
}

impl EpochTimer {
    /// Accounts for one finished batch, its batch time being `compute + comm`.
    ///
    /// # Arguments
    /// * `compute` - Forward, backward and selection time.
    /// * `comm` - Time blocked in the loss report and the parameter exchange.
    /// * `loss` - The batch loss.
    pub fn record(&mut self, compute: Duration, comm: Duration, loss: f32) {
        self.batches += 1;
        self.batch_time += compute + comm;
        self.compute_time += compute;
        self.comm_time += comm;
        self.loss += loss;
    }

    pub fn batches(&self) -> u32 {
        self.batches
    }

    /// The running means so far, all zero before the first batch.
    pub fn means(&self) -> BatchMetrics {
        let n = self.batches.max(1);
        BatchMetrics {
            accuracy: 0.0,
            batch_time: self.batch_time / n,
            compute_time: self.compute_time / n,
            comm_time: self.comm_time / n,
        }
    }

    pub fn mean_loss(&self) -> f32 {
        self.loss / self.batches.max(1) as f32
    }
}

/// Totals over the whole run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkerMetrics {
    pub compute_time: Duration,
    pub comm_time: Duration,

    pub steps: u64,
    pub samples: u64,
    /// Coordinates sent, ties included.
    pub selected: u64,
}

impl WorkerMetrics {
    #[inline]
    pub fn bump_step(&mut self) {
        self.steps += 1;
    }

    #[inline]
    pub fn add_samples(&mut self, n: usize) {
        self.samples += n as u64;
    }

    #[inline]
    pub fn add_selected(&mut self, n: usize) {
        self.selected += n as u64;
    }
}

/// Where the end of every epoch is summarized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub batches: u32,
    pub mean_loss: f32,
    pub lr: f32,
    pub metrics: BatchMetrics,
}

/// A write-only observability channel.
pub trait MetricsSink {
    fn record_batch(&mut self, epoch: usize, batch: usize, metrics: &BatchMetrics);

    fn record_epoch(&mut self, summary: &EpochSummary);
}

/// Emits every record as structured `log` key-values.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    rank: usize,
}

impl LogSink {
    pub fn new(rank: usize) -> Self {
        Self { rank }
    }
}

impl MetricsSink for LogSink {
    fn record_batch(&mut self, epoch: usize, batch: usize, metrics: &BatchMetrics) {
        info!(
            rank = self.rank,
            epoch = epoch,
            batch = batch,
            accuracy = metrics.accuracy,
            batch_ms = metrics.batch_time.as_secs_f64() * 1e3,
            compute_ms = metrics.compute_time.as_secs_f64() * 1e3,
            comm_ms = metrics.comm_time.as_secs_f64() * 1e3;
            "batch"
        );
    }

    fn record_epoch(&mut self, summary: &EpochSummary) {
        info!(
            rank = self.rank,
            epoch = summary.epoch,
            batches = summary.batches,
            loss = summary.mean_loss,
            lr = summary.lr,
            batch_ms = summary.metrics.batch_time.as_secs_f64() * 1e3,
            compute_ms = summary.metrics.compute_time.as_secs_f64() * 1e3,
            comm_ms = summary.metrics.comm_time.as_secs_f64() * 1e3;
            "epoch finished"
        );
    }
}
