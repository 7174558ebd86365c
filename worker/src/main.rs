use std::{env, io};

use log::{info, warn};
use tokio::{net::TcpStream, signal};

use worker::{
    ChannelCollective, SyncProtocol, TrainingDriver, WorkerConfig, WorkerErr,
    data::{DataLoader, InMemoryDataset, ShardSpec},
    metrics::LogSink,
    model::LinearModel,
};

const CONFIG_ENV: &str = "WORKER_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::var(CONFIG_ENV).map_err(io::Error::other)?;
    let cfg = WorkerConfig::load(&path)?;
    let group = cfg.group()?;

    if !cfg.compensate {
        warn!("residual compensation is always on, ignoring `compensate = false`");
    }

    let dataset = InMemoryDataset::from_config(&cfg.dataset)?;
    let batch_size = cfg.worker_batch_size()?;
    let mut loader = DataLoader::new(dataset, ShardSpec::for_group(&group), batch_size);
    if loader.num_batches() == 0 {
        let text = format!("rank {} got an empty shard", group.rank());
        return Err(WorkerErr::InvalidConfig(text).into());
    }

    let stream = TcpStream::connect(cfg.server_addr.as_str()).await?;
    stream.set_nodelay(true)?;
    info!("connected to server at {}", cfg.server_addr);

    let (rx, tx) = stream.into_split();
    let (rx, tx) = comms::channel(rx, tx);
    let collective = ChannelCollective::new(rx, tx);

    let rank = group.rank();
    let protocol = SyncProtocol::new(collective, group, cfg.handshake);
    let model = LinearModel::new(cfg.model.input, cfg.model.output, cfg.lr);
    let mut driver = TrainingDriver::new(
        model,
        protocol,
        cfg.ratio,
        cfg.epochs,
        cfg.lr_decay,
        LogSink::new(rank),
    )?;

    tokio::select! {
        ret = driver.run(&mut loader) => {
            ret?;
            info!("wrapping up, disconnecting...");
        }
        _ = signal::ctrl_c() => {
            info!("received SIGINT");
            return Ok(());
        }
    }

    driver.finish().await?;
    Ok(())
}
