use crate::dump::SharedParamsDump;
use crate::merge::{apply_in_place, Merger};
use crate::transport::{Inbound, PeerId};
use deltashare_core::{
    FlattenIndexer, ParameterSet, Selector, SharingConfig, SharingError, SparseCodec, SparseUpdate,
};
use deltashare_train::{DeltaAccumulator, TopKSelector};
use tracing::{debug, info, warn};

/// A message the receive path refused.
#[derive(Debug)]
pub struct Dropped {
    pub sender: PeerId,
    pub error: SharingError,
}

/// Outcome of merging one batch of inbound messages.
#[derive(Debug)]
pub struct ReceiveReport {
    /// Parameters after every accepted update was merged.
    pub params: ParameterSet,
    pub applied: usize,
    pub dropped: Vec<Dropped>,
}

/// Partial-model sharing for one peer.
///
/// Send side: sum the round's deltas, pick positions with the [`Selector`],
/// read the current parameter values there and encode them. Receive side:
/// decode, merge in arrival order, rebuild the [`ParameterSet`].
///
/// The flat layout is captured from the initial parameters at construction
/// and never changes.
pub struct PartialShare<S: Selector> {
    rank: PeerId,
    selector: S,
    merger: Merger,
    codec: SparseCodec,
    dump: Option<SharedParamsDump>,
}

impl PartialShare<TopKSelector> {
    /// Top-k sharing with the ratio from `config`.
    pub fn top_k(
        rank: PeerId,
        initial: &ParameterSet,
        config: &SharingConfig,
    ) -> Result<Self, SharingError> {
        Self::new(rank, initial, TopKSelector::new(config.alpha), config)
    }
}

impl<S: Selector> PartialShare<S> {
    /// Fails with [`SharingError::UnsupportedConfig`] for configurations the
    /// protocol cannot run, before any round starts.
    pub fn new(
        rank: PeerId,
        initial: &ParameterSet,
        selector: S,
        config: &SharingConfig,
    ) -> Result<Self, SharingError> {
        config.validate()?;
        let indexer = FlattenIndexer::new(initial);
        let codec = SparseCodec::new(indexer.len(), config.wire_format);

        // Dumps are best-effort: an unwritable folder only disables them.
        let dump = config
            .dump_dir(rank)
            .and_then(|dir| match SharedParamsDump::create(&dir) {
                Ok(dump) => Some(dump),
                Err(e) => {
                    warn!(rank, dir = %dir.display(), error = %e, "Diagnostic dumps disabled");
                    None
                }
            });

        Ok(Self {
            rank,
            selector,
            merger: Merger::new(indexer),
            codec,
            dump,
        })
    }

    pub fn rank(&self) -> PeerId {
        self.rank
    }

    pub fn indexer(&self) -> &FlattenIndexer {
        self.merger.indexer()
    }

    pub fn codec(&self) -> &SparseCodec {
        &self.codec
    }

    pub fn dump(&self) -> Option<&SharedParamsDump> {
        self.dump.as_ref()
    }

    /// Build this round's outgoing update.
    ///
    /// Positions come from the summed deltas; values from `params`.
    pub fn compress(
        &self,
        params: &ParameterSet,
        accumulator: &DeltaAccumulator,
    ) -> Result<SparseUpdate, SharingError> {
        let delta = accumulator.sum()?;
        let delta_flat = self.indexer().flatten(&delta)?;
        let indices = self.selector.select(&delta_flat);

        let param_flat = self.indexer().flatten(params)?;
        SparseUpdate::gather(&param_flat, indices)
    }

    /// [`compress`](Self::compress) then encode for the wire.
    ///
    /// The diagnostic dump is written only once encoding has succeeded, so
    /// it never records an update that was not sent.
    pub fn serialize(
        &self,
        round: u64,
        params: &ParameterSet,
        accumulator: &DeltaAccumulator,
    ) -> Result<Vec<u8>, SharingError> {
        let update = self.compress(params, accumulator)?;
        let payload = self.codec.encode(&update)?;

        if let Some(dump) = &self.dump {
            match dump.write(round, self.indexer().registry(), &update) {
                Ok(path) => debug!(rank = self.rank, path = %path.display(), "Wrote shared params"),
                Err(e) => warn!(rank = self.rank, round, error = %e, "Failed to write shared params"),
            }
        }

        info!(rank = self.rank, round, elements = update.len(), "Elements sending");
        Ok(payload)
    }

    /// Decode one message and merge it into `params`.
    pub fn deserialize(
        &self,
        params: &ParameterSet,
        payload: &[u8],
    ) -> Result<ParameterSet, SharingError> {
        let update = self.codec.decode(payload)?;
        self.merger.merge(params, [&update])
    }

    /// Merge a batch of inbound messages in the order given.
    ///
    /// A message that fails to decode or apply is dropped and reported; the
    /// rest are still merged. Only a mismatch between `params` and the
    /// captured layout fails the whole call.
    pub fn receive<I>(&self, params: &ParameterSet, inbound: I) -> Result<ReceiveReport, SharingError>
    where
        I: IntoIterator<Item = Inbound>,
    {
        let mut flat = self.indexer().flatten(params)?;
        let mut applied = 0usize;
        let mut dropped = Vec::new();

        for msg in inbound {
            let result = self.codec.decode(&msg.payload).and_then(|update| {
                apply_in_place(&mut flat, &update)?;
                Ok(update.len())
            });
            match result {
                Ok(elements) => {
                    debug!(rank = self.rank, sender = msg.sender, elements, "Merged update");
                    applied += 1;
                }
                Err(error) => {
                    warn!(rank = self.rank, sender = msg.sender, %error, "Dropping message");
                    dropped.push(Dropped {
                        sender: msg.sender,
                        error,
                    });
                }
            }
        }

        Ok(ReceiveReport {
            params: self.indexer().unflatten(&flat)?,
            applied,
            dropped,
        })
    }
}
