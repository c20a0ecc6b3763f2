use crate::accumulator::DeltaAccumulator;
use deltashare_core::{DeltaMap, SharingError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Order in which a dataset's batches are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOrder {
    #[default]
    Sequential,
    /// Not supported.
    Shuffled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs_per_round: usize,
    pub batch_size: usize,
    pub batch_order: BatchOrder,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs_per_round: 1,
            batch_size: 16,
            batch_order: BatchOrder::Sequential,
        }
    }
}

/// Model plus optimizer, as seen by the training loop.
///
/// Gradient computation and the update rule live behind this trait.
pub trait Learner {
    type Batch;

    /// Clear gradients, run forward and backward on `batch`, return the loss.
    fn backward(&mut self, batch: &Self::Batch) -> f32;

    /// Snapshot of the gradients from the last [`backward`](Self::backward),
    /// keyed like the model's parameters. Must not alias any buffer the
    /// learner reuses for the next step.
    fn gradients(&self) -> DeltaMap;

    /// Apply one optimizer step.
    fn step(&mut self);
}

/// Source of training batches.
pub trait Dataset {
    type Batch;

    fn batches(&self, batch_size: usize) -> impl Iterator<Item = Self::Batch> + '_;
}

/// Per-round training summary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainReport {
    /// Mean loss of each epoch; epochs with no batches are skipped.
    pub epoch_losses: Vec<f32>,
    /// Gradient snapshots recorded.
    pub steps: usize,
}

/// Local training loop that feeds a [`DeltaAccumulator`].
///
/// Every batch's gradient is recorded before the optimizer step, so the
/// accumulator ends the round holding one snapshot per step.
#[derive(Debug, Clone)]
pub struct GradientTrainer {
    config: TrainingConfig,
}

impl GradientTrainer {
    pub fn new(config: TrainingConfig) -> Result<Self, SharingError> {
        if config.batch_order == BatchOrder::Shuffled {
            return Err(SharingError::UnsupportedConfig("shuffled batch order".into()));
        }
        if config.batch_size == 0 {
            return Err(SharingError::UnsupportedConfig("batch size must be positive".into()));
        }
        Ok(Self { config })
    }

    /// Run one round of local training.
    ///
    /// Resets `accumulator` first; on return it holds this round's snapshots.
    pub fn train<L, D>(
        &self,
        learner: &mut L,
        dataset: &D,
        accumulator: &mut DeltaAccumulator,
    ) -> Result<TrainReport, SharingError>
    where
        L: Learner,
        D: Dataset<Batch = L::Batch>,
    {
        accumulator.reset();
        let mut report = TrainReport::default();

        for epoch in 0..self.config.epochs_per_round {
            let mut epoch_loss = 0.0f32;
            let mut count = 0usize;
            for batch in dataset.batches(self.config.batch_size) {
                epoch_loss += learner.backward(&batch);
                accumulator.record(learner.gradients())?;
                learner.step();
                count += 1;
            }
            report.steps += count;
            if count > 0 {
                let mean = epoch_loss / count as f32;
                info!(epoch, loss = mean, "Epoch finished");
                report.epoch_losses.push(mean);
            }
        }
        Ok(report)
    }
}
