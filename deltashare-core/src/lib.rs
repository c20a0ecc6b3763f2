//! # deltashare-core
//!
//! Core types of the sparse delta exchange protocol.
//!
//! - [`ParameterSet`]: ordered, named parameter arrays
//! - [`FlattenIndexer`] / [`ShapeRegistry`]: the fixed flat layout every peer agrees on
//! - [`SparseUpdate`]: `(indices, values)` pairs exchanged between peers
//! - [`SparseCodec`]: JSON wire encoding of updates ([`WireFormat`])
//! - [`Selector`]: trait for choosing which flat positions to share
//! - [`SharingConfig`] / [`CompressionRatio`]: per-peer configuration
//! - [`SharingError`]: error taxonomy, split into round-fatal and
//!   message-local errors

pub mod config;
pub mod error;
pub mod flatten;
pub mod parameter;
pub mod ratio;
pub mod selector;
pub mod update;
pub mod wire;

pub use config::{CollectionOrder, DatasetSharing, SharingConfig, DIAGNOSTIC_RANKS};
pub use error::{KeyMismatch, SharingError};
pub use flatten::{FlattenIndexer, ShapeRegistry};
pub use parameter::{AccumulatedDelta, DeltaMap, ParameterSet};
pub use ratio::CompressionRatio;
pub use selector::Selector;
pub use update::SparseUpdate;
pub use wire::{SparseCodec, WireFormat, WireMessage};
