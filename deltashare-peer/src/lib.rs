//! # deltashare-peer
//!
//! Peer-side sharing: one node's send and receive halves of a round.
//!
//! Key types:
//! - [`PartialShare`]: sums deltas, selects, encodes on send; decodes and merges on receive
//! - [`Merger`]: last-write-wins application of sparse updates onto dense state
//! - [`Transport`]: delivery seam, with [`broadcast`] / [`collect`] on top
//! - [`SharedParamsDump`]: best-effort per-round diagnostic dumps
//!
//! Incoming messages are isolated from one another: a bad message is dropped
//! and reported in the [`ReceiveReport`], never allowed to stop the peer.

pub mod dump;
pub mod merge;
pub mod share;
pub mod transport;

pub use dump::SharedParamsDump;
pub use merge::{apply_in_place, Merger};
pub use share::{Dropped, PartialShare, ReceiveReport};
pub use transport::{broadcast, collect, Inbound, MemoryNetwork, MemoryTransport, PeerId, Transport};
