use std::{borrow::Cow, io};

use crate::{Decode, Encode, specs::ParamManifest};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();

const ERR: Header = 0;
const CONTROL: Header = 1;
const GATHER: Header = 2;
const SCATTER: Header = 3;

/// The tensor payload for the `Data` variant of the `Msg` enum.
///
/// There are no tensor ids on the wire, position in the call sequence is the
/// only thing correlating a payload with a parameter.
#[derive(Debug)]
pub enum Payload<'a> {
    /// A group member's contribution to a gather at the root.
    Gather(&'a [f32]),
    /// The chunk the root hands to one group member in a scatter.
    Scatter(&'a mut [f32]),
}

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// The root's view of the parameter shapes, sent once before any scatter.
    Manifest(ParamManifest),
    Disconnect,
}

/// The application layer message for the entire system.
#[derive(Debug)]
pub enum Msg<'a> {
    Control(Command),
    Data(Payload<'a>),
    Err(Cow<'a, str>),
}

impl Msg<'_> {
    /// A short, stable name of the message kind for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Control(Command::Manifest(_)) => "control/manifest",
            Msg::Control(Command::Disconnect) => "control/disconnect",
            Msg::Data(Payload::Gather(_)) => "data/gather",
            Msg::Data(Payload::Scatter(_)) => "data/scatter",
            Msg::Err(_) => "err",
        }
    }
}

fn invalid_data<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}

impl<'a> Encode<'a> for Msg<'a> {
    fn encode(&'a self, buf: &mut Vec<u8>) -> io::Result<Option<&'a [u8]>> {
        match self {
            Msg::Err(e) => {
                buf.extend_from_slice(&ERR.to_be_bytes());
                Ok(Some(e.as_bytes()))
            }
            Msg::Control(cmd) => {
                buf.extend_from_slice(&CONTROL.to_be_bytes());
                serde_json::to_writer(&mut *buf, cmd)?;
                Ok(None)
            }
            Msg::Data(payload) => {
                let (kind, nums): (Header, &[f32]) = match payload {
                    Payload::Gather(nums) => (GATHER, nums),
                    Payload::Scatter(nums) => (SCATTER, &**nums),
                };

                buf.extend_from_slice(&kind.to_be_bytes());
                Ok(Some(bytemuck::cast_slice(nums)))
            }
        }
    }
}

impl<'a> Decode<'a> for Msg<'a> {
    fn decode(buf: &'a mut [u8]) -> io::Result<Self> {
        let size = buf.len();
        let Some((kind_buf, rest)) = buf.split_first_chunk_mut::<HEADER_SIZE>() else {
            let text =
                format!("the given buffer is too small {size}, must at least be {HEADER_SIZE} bytes");
            return Err(invalid_data(text));
        };

        match Header::from_be_bytes(*kind_buf) {
            ERR => {
                let text = str::from_utf8(rest).map_err(invalid_data)?;
                Ok(Self::Err(Cow::Borrowed(text)))
            }
            CONTROL => {
                let cmd = serde_json::from_slice(rest)?;
                Ok(Self::Control(cmd))
            }
            kind @ (GATHER | SCATTER) => {
                let nums: &mut [f32] = bytemuck::try_cast_slice_mut(rest)
                    .map_err(|e| invalid_data(format!("malformed tensor payload: {e}")))?;

                let payload = if kind == GATHER {
                    Payload::Gather(nums)
                } else {
                    Payload::Scatter(nums)
                };

                Ok(Self::Data(payload))
            }
            kind => Err(invalid_data(format!("received an invalid kind header {kind}"))),
        }
    }
}
