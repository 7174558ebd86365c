use std::{num::NonZeroUsize, time::Instant};

use compression::{ParameterSet, ResidualStore, TopKSelector};
use log::{debug, info};

use crate::{
    Result,
    collective::Collective,
    data::DataLoader,
    metrics::{EpochSummary, EpochTimer, MetricsSink, WorkerMetrics},
    model::Model,
    protocol::SyncProtocol,
    schedule::LrDecay,
};

/// Runs the epochs of a single worker.
///
/// Owns the live parameters and the residual for the whole process. Every
/// batch is computed, sparsified and exchanged before the next one starts.
pub struct TrainingDriver<M, C, S>
where
    M: Model,
    C: Collective,
    S: MetricsSink,
{
    model: M,
    params: ParameterSet,
    residual: ResidualStore,
    selector: TopKSelector,
    protocol: SyncProtocol<C>,
    sink: S,
    epochs: NonZeroUsize,
    lr_decay: Option<LrDecay>,
    metrics: WorkerMetrics,
}

impl<M, C, S> TrainingDriver<M, C, S>
where
    M: Model,
    C: Collective,
    S: MetricsSink,
{
    /// Creates a new `TrainingDriver`.
    ///
    /// The parameters start zeroed with the model's shapes until the server
    /// scatters the initial values during setup.
    ///
    /// # Arguments
    /// * `model` - The model computing losses and gradients.
    /// * `protocol` - The exchange with the server, not yet set up.
    /// * `ratio` - The fraction of coordinates sent every step.
    /// * `epochs` - The amount of passes over the shard.
    /// * `lr_decay` - An optional learning rate decay.
    /// * `sink` - Where per batch and per epoch metrics go.
    ///
    /// # Returns
    /// A new `TrainingDriver` or an error if `ratio` isn't a valid budget.
    pub fn new(
        model: M,
        protocol: SyncProtocol<C>,
        ratio: f64,
        epochs: NonZeroUsize,
        lr_decay: Option<LrDecay>,
        sink: S,
    ) -> Result<Self> {
        let params = ParameterSet::zeros(model.shapes());
        let residual = ResidualStore::zeros_like(&params);
        let selector = TopKSelector::for_params(ratio, &params)?;

        Ok(Self {
            model,
            params,
            residual,
            selector,
            protocol,
            sink,
            epochs,
            lr_decay,
            metrics: WorkerMetrics::default(),
        })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn residual(&self) -> &ResidualStore {
        &self.residual
    }

    pub fn selector(&self) -> &TopKSelector {
        &self.selector
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn protocol(&self) -> &SyncProtocol<C> {
        &self.protocol
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Sets up the exchange and trains for every epoch.
    ///
    /// # Arguments
    /// * `loader` - This worker's shard of the dataset.
    ///
    /// # Returns
    /// An error as soon as any step fails, the run is not resumable.
    pub async fn run(&mut self, loader: &mut DataLoader) -> Result<()> {
        self.protocol
            .setup(&mut self.params, self.selector.budget())
            .await?;

        for epoch in 0..self.epochs.get() {
            self.decay_learning_rate(epoch);
            self.run_epoch(epoch, loader).await?;
        }

        info!(
            rank = self.protocol.group().rank(),
            steps = self.metrics.steps,
            samples = self.metrics.samples;
            "training finished"
        );
        Ok(())
    }

    /// Leaves the group and hands back the model and its final parameters.
    pub async fn finish(mut self) -> Result<(M, ParameterSet)> {
        self.protocol.finish().await?;
        Ok((self.model, self.params))
    }

    fn decay_learning_rate(&mut self, epoch: usize) {
        let Some(decay) = self.lr_decay else {
            return;
        };

        if decay.applies(epoch) {
            let lr = decay.next(epoch, self.model.learning_rate());
            self.model.set_learning_rate(lr);
            info!(epoch = epoch, lr = lr; "learning rate decayed");
        }
    }

    async fn run_epoch(&mut self, epoch: usize, loader: &mut DataLoader) -> Result<()> {
        loader.reset();

        let mut timer = EpochTimer::default();
        let mut index = 0;

        while let Some(batch) = loader.next_batch() {
            let start = Instant::now();
            let (loss, grads) = self.model.forward_backward(&self.params, batch)?;
            let (update, stats) = self.selector.select(&mut self.residual, &grads)?;
            let computed = Instant::now();

            self.protocol.step(loss, &update, &mut self.params).await?;
            let end = Instant::now();

            let (compute, comm) = (computed - start, end - computed);
            timer.record(compute, comm, loss);

            self.metrics.bump_step();
            self.metrics.add_samples(batch.len());
            self.metrics.add_selected(stats.selected);
            self.metrics.compute_time += compute;
            self.metrics.comm_time += comm;

            debug!(
                epoch = epoch,
                batch = index,
                k = stats.k,
                selected = stats.selected,
                loss = loss;
                "step done"
            );
            self.sink.record_batch(epoch, index, &timer.means());
            index += 1;
        }

        self.sink.record_epoch(&EpochSummary {
            epoch,
            batches: timer.batches(),
            mean_loss: timer.mean_loss(),
            lr: self.model.learning_rate(),
            metrics: timer.means(),
        });

        Ok(())
    }
}
