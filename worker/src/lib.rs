pub mod collective;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod group;
pub mod metrics;
pub mod model;
pub mod protocol;
pub mod schedule;

pub use collective::{ChannelCollective, Collective};
pub use config::WorkerConfig;
pub use driver::TrainingDriver;
pub use error::{Result, WorkerErr};
pub use group::GroupConfig;
pub use protocol::{SyncProtocol, SyncState};
