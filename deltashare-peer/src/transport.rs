//! Transport seam and round orchestration.
//!
//! Delivery, retries and discovery belong to the [`Transport`]
//! implementation. [`broadcast`] and [`collect`] drive one peer's half of a
//! round on top of it. [`MemoryNetwork`] is an in-process transport for
//! simulations and tests.

use crate::share::{PartialShare, ReceiveReport};
use deltashare_core::{ParameterSet, Selector, SharingError};
use deltashare_train::DeltaAccumulator;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{error, warn};

/// Rank of a peer in the network.
pub type PeerId = usize;

/// A payload received from a neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub sender: PeerId,
    pub payload: Vec<u8>,
}

/// Message delivery between named peers.
pub trait Transport {
    /// Hand `payload` to the transport for delivery to `to`.
    fn send(&mut self, to: PeerId, payload: &[u8]) -> Result<(), SharingError>;

    /// Take every message delivered so far, oldest first.
    fn drain(&mut self) -> Vec<Inbound>;
}

/// Send this round's update to every neighbor.
///
/// Errors on the peer's own path (nothing recorded, layout drift) abort the
/// round: they are logged and returned, and nothing is sent. A failed send to
/// one neighbor is logged and skipped. Returns the number of neighbors
/// reached.
pub fn broadcast<S, T>(
    share: &PartialShare<S>,
    transport: &mut T,
    neighbors: &[PeerId],
    round: u64,
    params: &ParameterSet,
    accumulator: &DeltaAccumulator,
) -> Result<usize, SharingError>
where
    S: Selector,
    T: Transport,
{
    let payload = share
        .serialize(round, params, accumulator)
        .inspect_err(|e| error!(rank = share.rank(), round, error = %e, "Round aborted"))?;

    let mut reached = 0usize;
    for &neighbor in neighbors {
        match transport.send(neighbor, &payload) {
            Ok(()) => reached += 1,
            Err(e) => warn!(rank = share.rank(), neighbor, error = %e, "Send failed"),
        }
    }
    Ok(reached)
}

/// Merge everything the transport has delivered into `params`.
pub fn collect<S, T>(
    share: &PartialShare<S>,
    transport: &mut T,
    params: &ParameterSet,
) -> Result<ReceiveReport, SharingError>
where
    S: Selector,
    T: Transport,
{
    share
        .receive(params, transport.drain())
        .inspect_err(|e| error!(rank = share.rank(), error = %e, "Receive aborted"))
}

type Mailboxes = Rc<RefCell<Vec<VecDeque<Inbound>>>>;

/// Single-threaded in-memory network: one FIFO mailbox per peer.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    mailboxes: Mailboxes,
}

impl MemoryNetwork {
    pub fn new(peers: usize) -> Self {
        Self {
            mailboxes: Rc::new(RefCell::new(vec![VecDeque::new(); peers])),
        }
    }

    /// Endpoint for `rank`.
    pub fn endpoint(&self, rank: PeerId) -> MemoryTransport {
        MemoryTransport {
            rank,
            mailboxes: Rc::clone(&self.mailboxes),
        }
    }

    /// Put a raw payload in `to`'s mailbox, as if `from` had sent it.
    pub fn inject(&self, from: PeerId, to: PeerId, payload: Vec<u8>) -> Result<(), SharingError> {
        let mut boxes = self.mailboxes.borrow_mut();
        let mailbox = boxes
            .get_mut(to)
            .ok_or_else(|| SharingError::Transport(format!("no peer with rank {to}")))?;
        mailbox.push_back(Inbound {
            sender: from,
            payload,
        });
        Ok(())
    }
}

/// One peer's endpoint on a [`MemoryNetwork`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    rank: PeerId,
    mailboxes: Mailboxes,
}

impl Transport for MemoryTransport {
    fn send(&mut self, to: PeerId, payload: &[u8]) -> Result<(), SharingError> {
        let mut boxes = self.mailboxes.borrow_mut();
        let mailbox = boxes
            .get_mut(to)
            .ok_or_else(|| SharingError::Transport(format!("no peer with rank {to}")))?;
        mailbox.push_back(Inbound {
            sender: self.rank,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn drain(&mut self) -> Vec<Inbound> {
        let mut boxes = self.mailboxes.borrow_mut();
        boxes
            .get_mut(self.rank)
            .map(|mailbox| mailbox.drain(..).collect())
            .unwrap_or_default()
    }
}
