//! # deltashare-train
//!
//! Training-side pieces of the sparse delta exchange.
//!
//! Key types:
//! - [`DeltaAccumulator`]: round-scoped list of gradient snapshots, reduced by `sum()`
//! - [`TopKSelector`]: picks the `round(alpha * N)` largest-magnitude positions
//! - [`GradientTrainer`]: local training loop over the [`Learner`] and [`Dataset`] traits

pub mod accumulator;
pub mod topk;
pub mod trainer;

pub use accumulator::DeltaAccumulator;
pub use topk::{top_k_indices, TopKSelector};
pub use trainer::{BatchOrder, Dataset, GradientTrainer, Learner, TrainReport, TrainingConfig};
