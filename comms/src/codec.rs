//! The traits tying message types to the length-prefixed frame format.

use std::io;

/// The big endian length prefix in front of every frame body.
pub(crate) type FrameLen = u64;
pub(crate) const FRAME_LEN_SIZE: usize = size_of::<FrameLen>();

/// Writes a message body.
///
/// The owned head goes into `buf`; a borrowed tail, if any, is written right
/// after it straight from the caller's memory, so tensor payloads are never
/// copied into the send buffer.
pub trait Encode<'a> {
    fn encode(&'a self, buf: &mut Vec<u8>) -> io::Result<Option<&'a [u8]>>;
}

/// Reads a message body in place, borrowing from the receive buffer.
pub trait Decode<'a>: Sized {
    fn decode(buf: &'a mut [u8]) -> io::Result<Self>;
}

/// Element types a receive buffer can be made of.
///
/// All of them are at least 4 byte aligned, so an `f32` payload that starts at
/// a 4 byte offset of the frame can be viewed without copying.
pub trait Word: bytemuck::Pod {}

impl Word for u32 {}
impl Word for u64 {}
impl Word for f32 {}
impl Word for f64 {}
