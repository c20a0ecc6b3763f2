use deltashare_core::{FlattenIndexer, ParameterSet, SharingError, SparseUpdate};
use tracing::debug;

/// Overwrite `local[i] = v` for every `(i, v)` in `update`, in order.
///
/// Indices are checked before anything is written, so a bad update leaves
/// `local` untouched. A repeated index resolves to its last pair.
pub fn apply_in_place(local: &mut [f32], update: &SparseUpdate) -> Result<(), SharingError> {
    update.validate(local.len())?;
    for (index, value) in update.iter() {
        local[index] = value;
    }
    Ok(())
}

/// Applies received sparse updates onto a peer's dense state.
///
/// Updates are merged in the order they are handed over; where two touch the
/// same position the later one wins.
#[derive(Debug, Clone)]
pub struct Merger {
    indexer: FlattenIndexer,
}

impl Merger {
    pub fn new(indexer: FlattenIndexer) -> Self {
        Self { indexer }
    }

    pub fn indexer(&self) -> &FlattenIndexer {
        &self.indexer
    }

    /// Merge `update` into a flat vector of length N.
    pub fn apply(&self, mut local: Vec<f32>, update: &SparseUpdate) -> Result<Vec<f32>, SharingError> {
        if local.len() != self.indexer.len() {
            return Err(SharingError::LengthMismatch {
                expected: self.indexer.len(),
                got: local.len(),
            });
        }
        update.validate(local.len())?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let before: Vec<f32> = update.indices().iter().map(|&i| local[i]).collect();
            debug!(?before, "Original values");
        }
        apply_in_place(&mut local, update)?;
        debug!(after = ?update.values(), "Merged values");
        Ok(local)
    }

    /// Merge `updates` into `params` and rebuild the structured collection.
    ///
    /// All-or-nothing: the first failing update aborts the merge and `params`
    /// is left as it was.
    pub fn merge<'a, I>(&self, params: &ParameterSet, updates: I) -> Result<ParameterSet, SharingError>
    where
        I: IntoIterator<Item = &'a SparseUpdate>,
    {
        let mut flat = self.indexer.flatten(params)?;
        for update in updates {
            flat = self.apply(flat, update)?;
        }
        self.indexer.unflatten(&flat)
    }
}
