//! Length-prefixed message channels between the parameter server and its workers.
//!
//! Every frame is a big endian `u64` body length followed by the body, a `u32`
//! kind header and then either a JSON control command, a UTF-8 error or a raw
//! native-endian `f32` tensor payload.

mod codec;
pub mod msg;
mod receiver;
mod sender;
pub mod specs;

use tokio::io::{AsyncRead, AsyncWrite};

pub use codec::{Decode, Encode, Word};
pub use receiver::{DEFAULT_MAX_FRAME, FrameReceiver};
pub use sender::FrameSender;

/// Wraps the two halves of a stream into a channel.
///
/// # Arguments
/// * `rx` - The readable half.
/// * `tx` - The writable half.
///
/// # Returns
/// The receiving and sending ends of the channel.
pub fn channel<R, W>(rx: R, tx: W) -> (FrameReceiver<R>, FrameSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (FrameReceiver::new(rx), FrameSender::new(tx))
}
