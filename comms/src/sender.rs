use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec::{Encode, FRAME_LEN_SIZE, FrameLen};

/// The sending half of a channel.
pub struct FrameSender<W: AsyncWrite + Unpin> {
    tx: W,
    head: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> FrameSender<W> {
    pub(crate) fn new(tx: W) -> Self {
        Self {
            tx,
            head: Vec::new(),
        }
    }

    /// Writes `msg` as one frame and flushes it.
    ///
    /// # Arguments
    /// * `msg` - The message to send.
    ///
    /// # Returns
    /// An `io::Error` if encoding or writing fails.
    pub async fn send<'a, T: Encode<'a>>(&mut self, msg: &'a T) -> io::Result<()> {
        let Self { tx, head } = self;

        // The prefix is patched in once the body length is known.
        head.clear();
        head.extend_from_slice(&[0; FRAME_LEN_SIZE]);
        let tail = msg.encode(head)?;

        let body_len = head.len() - FRAME_LEN_SIZE + tail.map_or(0, <[u8]>::len);
        head[..FRAME_LEN_SIZE].copy_from_slice(&(body_len as FrameLen).to_be_bytes());

        tx.write_all(head).await?;
        if let Some(tail) = tail {
            tx.write_all(tail).await?;
        }

        tx.flush().await
    }
}
