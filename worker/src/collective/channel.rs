use comms::{
    FrameReceiver, FrameSender,
    msg::{Command, Msg, Payload},
    specs::ParamManifest,
};
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use super::Collective;
use crate::{Result, WorkerErr};

/// A `Collective` over a single comms channel to the root.
pub struct ChannelCollective<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    rx: FrameReceiver<R>,
    tx: FrameSender<W>,
    rx_buf: Vec<u32>,
}

impl<R, W> ChannelCollective<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `ChannelCollective`.
    ///
    /// # Arguments
    /// * `rx` - The receiving end of the channel to the root.
    /// * `tx` - The sending end of the channel to the root.
    ///
    /// # Returns
    /// A new `ChannelCollective` instance.
    pub fn new(rx: FrameReceiver<R>, tx: FrameSender<W>) -> Self {
        Self {
            rx,
            tx,
            rx_buf: Vec::new(),
        }
    }
}

impl<R, W> Collective for ChannelCollective<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn scatter(&mut self, dst: &mut [f32]) -> Result<()> {
        match self.rx.recv_into(&mut self.rx_buf).await? {
            Msg::Data(Payload::Scatter(chunk)) if chunk.len() == dst.len() => {
                dst.copy_from_slice(chunk);
                Ok(())
            }
            Msg::Data(Payload::Scatter(chunk)) => Err(WorkerErr::ShapeMismatch {
                got: chunk.len(),
                expected: dst.len(),
            }),
            Msg::Err(detail) => Err(WorkerErr::Server(detail.into_owned())),
            other => Err(WorkerErr::UnexpectedMessage {
                expected: "data/scatter",
                got: other.kind(),
            }),
        }
    }

    async fn gather(&mut self, src: &[f32]) -> Result<()> {
        let msg = Msg::Data(Payload::Gather(src));
        self.tx.send(&msg).await?;
        Ok(())
    }

    async fn recv_manifest(&mut self) -> Result<ParamManifest> {
        match self.rx.recv_into(&mut self.rx_buf).await? {
            Msg::Control(Command::Manifest(manifest)) => Ok(manifest),
            Msg::Err(detail) => Err(WorkerErr::Server(detail.into_owned())),
            other => Err(WorkerErr::UnexpectedMessage {
                expected: "control/manifest",
                got: other.kind(),
            }),
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        let msg = Msg::Control(Command::Disconnect);
        self.tx.send(&msg).await?;

        loop {
            let msg: Msg = self.rx.recv_into(&mut self.rx_buf).await?;
            if matches!(msg, Msg::Control(Command::Disconnect)) {
                break;
            }
            debug!(kind = msg.kind(); "draining before disconnect");
        }

        Ok(())
    }
}
