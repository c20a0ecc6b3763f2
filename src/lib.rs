//! # deltashare
//!
//! Sparse delta exchange for decentralized learning peers.
//!
//! Peers train locally, accumulate their per-step gradients, and each round
//! send only the `round(alpha * N)` parameters whose accumulated gradient moved
//! most. Receivers overwrite those positions in their own flat parameter
//! vector, last write wins.
//!
//! ```text
//! GradientTrainer ──record──▶ DeltaAccumulator ──sum──▶ FlattenIndexer
//!                                                           │
//!          params at selected positions ◀── TopKSelector ◀──┘
//!                      │
//!                SparseCodec ──▶ Transport ──▶ SparseCodec ──▶ Merger ──▶ ParameterSet
//! ```
//!
//! This crate re-exports the workspace members:
//! - [`math`]: shaped `f32` arrays
//! - [`core`]: layout, sparse updates, wire codec, configuration, errors
//! - [`train`]: accumulator, top-k selection, training loop
//! - [`peer`]: merge, receive loop, transport seam, diagnostic dumps

pub use deltashare_core as core;
pub use deltashare_math as math;
pub use deltashare_peer as peer;
pub use deltashare_train as train;

pub use deltashare_core::{
    CompressionRatio, FlattenIndexer, ParameterSet, SharingConfig, SharingError, SparseCodec,
    SparseUpdate, WireFormat,
};
pub use deltashare_math::ParamArray;
pub use deltashare_peer::{Merger, PartialShare};
pub use deltashare_train::{DeltaAccumulator, GradientTrainer, TopKSelector};
