#![allow(dead_code)]

use comms::{
    FrameReceiver, FrameSender,
    msg::{Command, Msg, Payload},
    specs::ParamManifest,
};
use tokio::io::{self, AsyncRead, AsyncWrite, DuplexStream, ReadHalf, WriteHalf};

pub type Chan = (
    FrameReceiver<ReadHalf<DuplexStream>>,
    FrameSender<WriteHalf<DuplexStream>>,
);

pub fn channel_pair() -> (Chan, Chan) {
    let (stream1, stream2) = io::duplex(4096);
    let (rx1, tx1) = io::split(stream1);
    let (rx2, tx2) = io::split(stream2);
    let chan1 = comms::channel(rx1, tx1);
    let chan2 = comms::channel(rx2, tx2);
    (chan1, chan2)
}

pub async fn send_manifest<W: AsyncWrite + Unpin>(
    tx: &mut FrameSender<W>,
    shapes: Vec<Vec<usize>>,
) -> io::Result<()> {
    let msg = Msg::Control(Command::Manifest(ParamManifest::new(shapes)));
    tx.send(&msg).await
}

pub async fn send_scatter<W: AsyncWrite + Unpin>(
    tx: &mut FrameSender<W>,
    chunk: &mut [f32],
) -> io::Result<()> {
    tx.send(&Msg::Data(Payload::Scatter(chunk))).await
}

pub async fn recv_gather<R: AsyncRead + Unpin>(
    rx: &mut FrameReceiver<R>,
    buf: &mut Vec<u32>,
) -> io::Result<Vec<f32>> {
    match rx.recv_into(buf).await? {
        Msg::Data(Payload::Gather(values)) => Ok(values.to_vec()),
        other => Err(io::Error::other(format!(
            "expected a gather, got {}",
            other.kind()
        ))),
    }
}

/// Waits for the worker to leave and acknowledges it.
pub async fn ack_disconnect<R, W>(
    rx: &mut FrameReceiver<R>,
    tx: &mut FrameSender<W>,
    buf: &mut Vec<u32>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match rx.recv_into(buf).await? {
        Msg::Control(Command::Disconnect) => {}
        other => {
            return Err(io::Error::other(format!(
                "expected a disconnect, got {}",
                other.kind()
            )));
        }
    }

    tx.send(&Msg::Control(Command::Disconnect)).await
}
