use crate::error::SharingError;

/// Compressed update: flat indices paired positionally with values.
///
/// `indices.len() == values.len()` always holds; range validity against a
/// particular flat length is checked with [`SparseUpdate::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseUpdate {
    indices: Vec<usize>,
    values: Vec<f32>,
}

impl SparseUpdate {
    pub fn new(indices: Vec<usize>, values: Vec<f32>) -> Result<Self, SharingError> {
        if indices.len() != values.len() {
            return Err(SharingError::MalformedMessage(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        Ok(Self { indices, values })
    }

    /// Read `flat[i]` for every selected `i`.
    ///
    /// Used on the send side: the update carries current parameter values at
    /// the positions chosen from the delta signal.
    pub fn gather(flat: &[f32], indices: Vec<usize>) -> Result<Self, SharingError> {
        let mut values = Vec::with_capacity(indices.len());
        for &i in &indices {
            let v = flat.get(i).ok_or(SharingError::InvalidIndex {
                index: i as i64,
                len: flat.len(),
            })?;
            values.push(*v);
        }
        Ok(Self { indices, values })
    }

    /// Fail with [`SharingError::InvalidIndex`] on the first index `>= len`.
    pub fn validate(&self, len: usize) -> Result<(), SharingError> {
        match self.indices.iter().find(|&&i| i >= len) {
            Some(&index) => Err(SharingError::InvalidIndex {
                index: index as i64,
                len,
            }),
            None => Ok(()),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// `(index, value)` pairs in transmission order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
