pub mod dataloader;
pub mod dataset;
pub mod shard;

pub use dataloader::DataLoader;
pub use dataset::{BatchRef, InMemoryDataset};
pub use shard::{ShardSpec, shard_range};
