//! Blocking collective primitives between a worker and the root of its group.

mod channel;

use comms::specs::ParamManifest;

use crate::Result;

pub use channel::ChannelCollective;

/// The worker side of a rooted collective.
///
/// Every call is a rendezvous with the root: it returns only once the whole
/// payload has crossed, and the calls are correlated purely by their order.
#[allow(unused)]
#[trait_variant::make(Collective: Send)]
pub trait CollectiveTemplate {
    /// Receives this worker's chunk of a scatter from the root.
    ///
    /// # Arguments
    /// * `dst` - Where to write the chunk, its length is the expected chunk length.
    ///
    /// # Returns
    /// An error if the chunk doesn't have exactly `dst.len()` values or the
    /// root sent anything else.
    async fn scatter(&mut self, dst: &mut [f32]) -> Result<()>;

    /// Contributes `src` to a gather at the root.
    async fn gather(&mut self, src: &[f32]) -> Result<()>;

    /// Receives the root's parameter manifest.
    async fn recv_manifest(&mut self) -> Result<ParamManifest>;

    /// Leaves the group, waiting for the root to acknowledge.
    async fn disconnect(&mut self) -> Result<()>;
}
