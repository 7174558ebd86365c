use std::{fs, num::NonZeroUsize, path::Path};

use serde::Deserialize;

use crate::{Result, WorkerErr, group::GroupConfig, schedule::LrDecay};

fn default_handshake() -> bool {
    true
}

fn default_compensate() -> bool {
    true
}

/// Samples shipped inline with the config, each row `x_size` features
/// followed by `y_size` targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub x_size: usize,
    pub y_size: usize,
    pub data: Vec<f32>,
}

/// The dense linear model the binary trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ModelConfig {
    pub input: NonZeroUsize,
    pub output: NonZeroUsize,
}

/// Everything a worker process needs at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerConfig {
    pub server_addr: String,
    #[serde(default)]
    pub server_rank: usize,
    pub rank: usize,
    pub workers: Vec<usize>,
    pub ratio: f64,
    pub epochs: NonZeroUsize,
    /// The global batch size, every worker trains on an even share of it.
    pub batch_size: NonZeroUsize,
    pub lr: f32,
    #[serde(default)]
    pub lr_decay: Option<LrDecay>,
    /// Residuals are always compensated, `false` is accepted and ignored.
    #[serde(default = "default_compensate")]
    pub compensate: bool,
    /// Whether the server sends a parameter manifest before anything else.
    #[serde(default = "default_handshake")]
    pub handshake: bool,
    pub model: ModelConfig,
    pub dataset: DatasetConfig,
}

impl WorkerConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads the JSON config at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// The group membership this config describes.
    pub fn group(&self) -> Result<GroupConfig> {
        GroupConfig::new(self.server_rank, self.rank, self.workers.clone())
    }

    /// This worker's share of the global batch, `batch_size / workers`.
    ///
    /// # Returns
    /// The per-worker batch size, or `InvalidConfig` if the global batch is
    /// smaller than the group.
    pub fn worker_batch_size(&self) -> Result<NonZeroUsize> {
        let workers = self.group()?.num_workers();

        NonZeroUsize::new(self.batch_size.get() / workers.get()).ok_or_else(|| {
            WorkerErr::InvalidConfig(format!(
                "batch size {} can't be split across {} workers",
                self.batch_size, workers
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ratio) {
            return Err(WorkerErr::InvalidConfig(format!(
                "ratio must be within [0, 1], got {}",
                self.ratio
            )));
        }
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(WorkerErr::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.lr
            )));
        }
        if let Some(decay) = self.lr_decay
            && !(decay.factor.is_finite() && decay.factor > 0.0)
        {
            return Err(WorkerErr::InvalidConfig(format!(
                "learning rate decay factor must be positive, got {}",
                decay.factor
            )));
        }
        if self.dataset.x_size != self.model.input.get()
            || self.dataset.y_size != self.model.output.get()
        {
            return Err(WorkerErr::InvalidConfig(format!(
                "dataset rows are {}x{} but the model maps {} to {}",
                self.dataset.x_size, self.dataset.y_size, self.model.input, self.model.output
            )));
        }

        self.worker_batch_size().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"{
        "server_addr": "127.0.0.1:5000",
        "rank": 2,
        "workers": [1, 2],
        "ratio": 0.01,
        "epochs": 3,
        "batch_size": 2,
        "lr": 0.1,
        "lr_decay": { "period": 2 },
        "model": { "input": 1, "output": 1 },
        "dataset": { "x_size": 1, "y_size": 1, "data": [1.0, 3.0, 2.0, 5.0] }
    }"#;

    #[test]
    fn parses_with_defaults() {
        let cfg = WorkerConfig::from_json(RAW).unwrap();

        assert_eq!(cfg.server_rank, 0);
        assert_eq!(cfg.epochs.get(), 3);
        assert!(cfg.handshake);
        assert!(cfg.compensate);
        assert_eq!(cfg.lr_decay.map(|d| d.factor), Some(0.1));

        assert_eq!(cfg.worker_batch_size().unwrap().get(), 1);

        let group = cfg.group().unwrap();
        assert_eq!(group.world_size(), 3);
        assert_eq!(group.worker_index(), 1);
    }

    #[test]
    fn global_batch_is_split_across_workers() {
        let raw = RAW.replace(r#""batch_size": 2"#, r#""batch_size": 9"#);
        let cfg = WorkerConfig::from_json(&raw).unwrap();

        assert_eq!(cfg.batch_size.get(), 9);
        assert_eq!(cfg.worker_batch_size().unwrap().get(), 4);
    }

    #[test]
    fn rejects_batch_smaller_than_the_group() {
        let raw = RAW.replace(r#""batch_size": 2"#, r#""batch_size": 1"#);
        assert!(matches!(
            WorkerConfig::from_json(&raw),
            Err(WorkerErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let raw = RAW.replace(r#""ratio": 0.01"#, r#""ratio": 1.5"#);
        assert!(matches!(
            WorkerConfig::from_json(&raw),
            Err(WorkerErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_epochs() {
        let raw = RAW.replace(r#""epochs": 3"#, r#""epochs": 0"#);
        assert!(WorkerConfig::from_json(&raw).is_err());
    }

    #[test]
    fn rejects_dataset_that_does_not_fit_the_model() {
        let raw = RAW.replace(r#""input": 1"#, r#""input": 2"#);
        assert!(WorkerConfig::from_json(&raw).is_err());
    }

    #[test]
    fn rejects_rank_outside_the_group() {
        let raw = RAW.replace(r#""rank": 2"#, r#""rank": 7"#);
        assert!(WorkerConfig::from_json(&raw).is_err());
    }
}
