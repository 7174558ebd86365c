use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::{Decode, FRAME_LEN_SIZE, FrameLen, Word};

/// Frames above this size are refused unless configured otherwise, 1 GiB.
pub const DEFAULT_MAX_FRAME: usize = 1 << 30;

/// The receiving half of a channel.
pub struct FrameReceiver<R: AsyncRead + Unpin> {
    rx: R,
    max_frame: usize,
}

impl<R: AsyncRead + Unpin> FrameReceiver<R> {
    pub(crate) fn new(rx: R) -> Self {
        Self {
            rx,
            max_frame: DEFAULT_MAX_FRAME,
        }
    }

    /// Caps the body size of incoming frames.
    ///
    /// A corrupt or hostile length prefix then fails with `InvalidData`
    /// instead of growing the receive buffer.
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame;
        self
    }

    pub fn max_frame(&self) -> usize {
        self.max_frame
    }

    /// Blocks until the next whole frame arrived and decodes it.
    ///
    /// # Arguments
    /// * `buf` - Backing storage for the frame, the decoded `T` borrows from
    ///   it. It is grown to fit and never shrunk, so reusing one buffer keeps
    ///   the steady state allocation free.
    ///
    /// # Returns
    /// The decoded message, or an `io::Error` if the stream ended, the frame
    /// is too large or its body is malformed.
    pub async fn recv_into<'buf, T, B>(&mut self, buf: &'buf mut Vec<B>) -> io::Result<T>
    where
        T: Decode<'buf>,
        B: Word,
    {
        let mut prefix = [0; FRAME_LEN_SIZE];
        self.rx.read_exact(&mut prefix).await?;

        let len = usize::try_from(FrameLen::from_be_bytes(prefix))
            .ok()
            .filter(|&len| len <= self.max_frame)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("frame exceeds the {} bytes limit", self.max_frame),
                )
            })?;

        let words = len.div_ceil(size_of::<B>());
        if buf.len() < words {
            buf.resize(words, B::zeroed());
        }

        let body = &mut bytemuck::cast_slice_mut::<B, u8>(buf.as_mut_slice())[..len];
        self.rx.read_exact(body).await?;

        T::decode(body)
    }
}
