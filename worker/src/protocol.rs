use compression::{CompressionBudget, ParameterSet, SparseUpdate};
use log::{debug, info};

use crate::{Result, WorkerErr, collective::Collective, group::GroupConfig};

/// Where a worker stands in its exchange with the server.
///
/// Setup runs once, `VerifyManifest` (when the handshake is on), then
/// `ReceiveInitialParameters` and `ReportBudget`. Every training step then goes
/// `Ready -> ReportLoss -> ExchangeParameters -> Ready`. Any failed exchange
/// leaves the protocol in `Failed`, there is no way back into the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    VerifyManifest,
    ReceiveInitialParameters,
    ReportBudget,
    Ready,
    ReportLoss,
    ExchangeParameters,
    Failed,
    Finished,
}

/// Drives the worker's side of the synchronous exchange with the server.
///
/// Tensors cross the wire one collective call each, in `ParameterSet` order;
/// that order is the only thing correlating a payload with a parameter.
pub struct SyncProtocol<C: Collective> {
    collective: C,
    group: GroupConfig,
    state: SyncState,
    steps: u64,
}

impl<C: Collective> SyncProtocol<C> {
    /// Creates a new `SyncProtocol`.
    ///
    /// # Arguments
    /// * `collective` - The transport to the server.
    /// * `group` - The group this worker belongs to.
    /// * `handshake` - Whether the server sends a parameter manifest before the
    ///   initial parameters.
    ///
    /// # Returns
    /// A new `SyncProtocol` instance.
    pub fn new(collective: C, group: GroupConfig, handshake: bool) -> Self {
        let state = if handshake {
            SyncState::VerifyManifest
        } else {
            SyncState::ReceiveInitialParameters
        };

        Self {
            collective,
            group,
            state,
            steps: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn group(&self) -> &GroupConfig {
        &self.group
    }

    /// The amount of completed training steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Runs the whole setup phase, leaving the protocol `Ready`.
    ///
    /// # Arguments
    /// * `params` - Overwritten with the server's initial parameters.
    /// * `budget` - The budget whose realized ratio is reported.
    pub async fn setup(
        &mut self,
        params: &mut ParameterSet,
        budget: &CompressionBudget,
    ) -> Result<()> {
        if self.state == SyncState::VerifyManifest {
            self.verify_manifest(params).await?;
        }

        self.receive_initial_parameters(params).await?;
        self.report_budget(budget).await
    }

    /// Checks the server's manifest against the local parameters.
    ///
    /// # Returns
    /// `WorkerErr::ManifestMismatch` if the tensor count or any shape differs,
    /// before a single parameter is received.
    pub async fn verify_manifest(&mut self, params: &ParameterSet) -> Result<()> {
        self.ensure_state("verify the manifest", SyncState::VerifyManifest)?;

        let ret = self
            .collective
            .recv_manifest()
            .await
            .and_then(|manifest| check_manifest(manifest.shapes, params.shapes()));
        self.settle(ret, SyncState::ReceiveInitialParameters)?;
        info!(rank = self.group.rank(), tensors = params.len(); "manifest verified");
        Ok(())
    }

    /// Receives every initial parameter tensor from the server, one scatter each.
    pub async fn receive_initial_parameters(&mut self, params: &mut ParameterSet) -> Result<()> {
        self.ensure_state(
            "receive initial parameters",
            SyncState::ReceiveInitialParameters,
        )?;

        let ret = Self::scatter_all(&mut self.collective, params).await;
        self.settle(ret, SyncState::ReportBudget)?;

        info!(rank = self.group.rank(), numel = params.numel(); "received initial parameters");
        Ok(())
    }

    /// Gathers the realized compression ratio to the server.
    pub async fn report_budget(&mut self, budget: &CompressionBudget) -> Result<()> {
        self.ensure_state("report the budget", SyncState::ReportBudget)?;

        let ratio = budget.realized_ratio();
        let ret = self.collective.gather(&[ratio]).await;
        self.settle(ret, SyncState::Ready)?;

        info!(rank = self.group.rank(), k = budget.k(), ratio = ratio; "budget reported");
        Ok(())
    }

    /// Runs one training step's exchange.
    ///
    /// Reports `loss`, then for every tensor gathers its sparse update and
    /// replaces the local parameter with what the server scatters back.
    ///
    /// # Arguments
    /// * `loss` - This batch's training loss.
    /// * `update` - This step's sparse update, shaped like `params`.
    /// * `params` - Overwritten in place with the server's parameters.
    pub async fn step(
        &mut self,
        loss: f32,
        update: &SparseUpdate,
        params: &mut ParameterSet,
    ) -> Result<()> {
        self.ensure_state("step", SyncState::Ready)?;
        params.check_matches("sparse update", update.tensors())?;

        self.state = SyncState::ReportLoss;
        let ret = self.collective.gather(&[loss]).await;
        self.settle(ret, SyncState::ExchangeParameters)?;

        let ret = Self::exchange_all(&mut self.collective, update, params).await;
        self.settle(ret, SyncState::Ready)?;

        self.steps += 1;
        debug!(rank = self.group.rank(), step = self.steps, loss = loss; "parameters exchanged");
        Ok(())
    }

    /// Leaves the group, waiting for the server's acknowledgement.
    pub async fn finish(&mut self) -> Result<()> {
        self.ensure_state("finish", SyncState::Ready)?;

        let ret = self.collective.disconnect().await;
        self.settle(ret, SyncState::Finished)?;

        info!(rank = self.group.rank(), steps = self.steps; "disconnected");
        Ok(())
    }

    async fn scatter_all(collective: &mut C, params: &mut ParameterSet) -> Result<()> {
        for (i, param) in params.iter_mut().enumerate() {
            let dst = param
                .as_slice_mut()
                .ok_or(WorkerErr::NonContiguous { index: i })?;
            collective.scatter(dst).await?;
        }

        Ok(())
    }

    async fn exchange_all(
        collective: &mut C,
        update: &SparseUpdate,
        params: &mut ParameterSet,
    ) -> Result<()> {
        let tensors = update.tensors().iter().zip(params.iter_mut());
        for (i, (sent, param)) in tensors.enumerate() {
            let src = sent.as_slice().ok_or(WorkerErr::NonContiguous { index: i })?;
            collective.gather(src).await?;

            let dst = param
                .as_slice_mut()
                .ok_or(WorkerErr::NonContiguous { index: i })?;
            collective.scatter(dst).await?;
        }

        Ok(())
    }

    fn ensure_state(&self, op: &'static str, expected: SyncState) -> Result<()> {
        if self.state != expected {
            return Err(WorkerErr::InvalidState {
                op,
                state: self.state,
            });
        }

        Ok(())
    }

    fn settle(&mut self, ret: Result<()>, next: SyncState) -> Result<()> {
        self.state = if ret.is_ok() { next } else { SyncState::Failed };
        ret
    }
}

fn check_manifest(got: Vec<Vec<usize>>, expected: Vec<Vec<usize>>) -> Result<()> {
    if got.len() != expected.len() {
        return Err(WorkerErr::ManifestMismatch {
            index: None,
            got,
            expected,
        });
    }

    if let Some(i) = got.iter().zip(&expected).position(|(a, b)| a != b) {
        return Err(WorkerErr::ManifestMismatch {
            index: Some(i),
            got,
            expected,
        });
    }

    Ok(())
}
