use std::num::NonZeroUsize;

use crate::{Result, WorkerErr};

/// Static membership of the synchronous group, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    server_rank: usize,
    rank: usize,
    workers: Vec<usize>,
}

impl GroupConfig {
    /// Creates a new `GroupConfig`.
    ///
    /// # Arguments
    /// * `server_rank` - The rank of the root every collective goes through.
    /// * `rank` - This worker's rank.
    /// * `workers` - The ranks of every worker in the group, this one included.
    ///
    /// # Returns
    /// A new `GroupConfig` or an error if the membership is inconsistent.
    pub fn new(server_rank: usize, rank: usize, workers: Vec<usize>) -> Result<Self> {
        if rank == server_rank {
            return Err(WorkerErr::InvalidConfig(format!(
                "rank {rank} is the server's rank"
            )));
        }
        if workers.contains(&server_rank) {
            return Err(WorkerErr::InvalidConfig(format!(
                "server rank {server_rank} is listed as a worker"
            )));
        }
        if !workers.contains(&rank) {
            return Err(WorkerErr::InvalidConfig(format!(
                "rank {rank} is not one of the workers {workers:?}"
            )));
        }

        let mut sorted = workers.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != workers.len() {
            return Err(WorkerErr::InvalidConfig(format!(
                "duplicate worker ranks in {workers:?}"
            )));
        }

        Ok(Self {
            server_rank,
            rank,
            workers,
        })
    }

    pub fn server_rank(&self) -> usize {
        self.server_rank
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn workers(&self) -> &[usize] {
        &self.workers
    }

    /// The amount of workers, the server excluded.
    pub fn num_workers(&self) -> NonZeroUsize {
        // `workers` holds at least this worker's own rank.
        NonZeroUsize::new(self.workers.len()).unwrap_or(NonZeroUsize::MIN)
    }

    /// Every participant of a collective, the server included.
    pub fn world_size(&self) -> usize {
        self.workers.len() + 1
    }

    /// This worker's position among the workers.
    pub fn worker_index(&self) -> usize {
        self.workers
            .iter()
            .position(|&r| r == self.rank)
            .unwrap_or_default()
    }
}
