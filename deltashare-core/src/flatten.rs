use crate::error::{KeyMismatch, SharingError};
use crate::parameter::ParameterSet;
use deltashare_math::ParamArray;

/// Name → dimensions, in the order parameters were captured.
///
/// Derived once from the initial [`ParameterSet`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRegistry {
    entries: Vec<(String, Vec<usize>)>,
}

impl ShapeRegistry {
    pub fn from_parameters(params: &ParameterSet) -> Self {
        Self {
            entries: params
                .iter()
                .map(|(name, array)| (name.to_string(), array.shape().to_vec()))
                .collect(),
        }
    }

    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_slice())
    }

    /// Captured parameter names, in flatten order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that `params` has exactly the captured names and shapes.
    pub fn check(&self, params: &ParameterSet) -> Result<(), SharingError> {
        for (name, expected) in self.iter() {
            let array = params
                .get(name)
                .ok_or_else(|| SharingError::MismatchedKeys(KeyMismatch::Missing(name.to_string())))?;
            if array.shape() != expected {
                return Err(SharingError::MismatchedKeys(KeyMismatch::Shape {
                    name: name.to_string(),
                    expected: expected.to_vec(),
                    got: array.shape().to_vec(),
                }));
            }
        }
        if let Some(extra) = params.names().find(|n| self.shape(n).is_none()) {
            return Err(SharingError::MismatchedKeys(KeyMismatch::Unexpected(
                extra.to_string(),
            )));
        }
        Ok(())
    }

    /// SHA-256 over names and dimensions, hex encoded.
    ///
    /// Two peers whose fingerprints match flatten to identically laid out
    /// vectors.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        for (name, shape) in &self.entries {
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update((shape.len() as u64).to_le_bytes());
            for &dim in shape {
                hasher.update((dim as u64).to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Converts between a [`ParameterSet`] and one contiguous flat vector.
///
/// The name order and shapes are captured at construction; every later
/// flatten/unflatten uses exactly that layout. Each array contributes its
/// row-major elements at a fixed offset.
#[derive(Debug, Clone)]
pub struct FlattenIndexer {
    registry: ShapeRegistry,
    offsets: Vec<usize>,
    total_len: usize,
}

impl FlattenIndexer {
    /// Capture the layout of `initial`.
    pub fn new(initial: &ParameterSet) -> Self {
        let registry = ShapeRegistry::from_parameters(initial);
        let mut offsets = Vec::with_capacity(registry.len());
        let mut total_len = 0usize;
        for (_, array) in initial.iter() {
            offsets.push(total_len);
            total_len += array.len();
        }
        Self {
            registry,
            offsets,
            total_len,
        }
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Flat vector length N.
    pub fn len(&self) -> usize {
        self.total_len
    }

    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    /// Concatenate `collection` in captured order.
    ///
    /// Fails with [`SharingError::MismatchedKeys`] if names or shapes differ
    /// from the baseline; a misaligned vector is never produced.
    pub fn flatten(&self, collection: &ParameterSet) -> Result<Vec<f32>, SharingError> {
        self.registry.check(collection)?;
        let mut flat = Vec::with_capacity(self.total_len);
        for name in self.registry.order() {
            // check() guarantees presence
            if let Some(array) = collection.get(name) {
                flat.extend_from_slice(array.data());
            }
        }
        Ok(flat)
    }

    /// Rebuild the structured collection from a flat vector of length N.
    pub fn unflatten(&self, vector: &[f32]) -> Result<ParameterSet, SharingError> {
        if vector.len() != self.total_len {
            return Err(SharingError::LengthMismatch {
                expected: self.total_len,
                got: vector.len(),
            });
        }
        let mut params = ParameterSet::new();
        for ((name, shape), &start) in self.registry.iter().zip(&self.offsets) {
            let end = start + shape.iter().product::<usize>();
            let array = ParamArray::new(shape.to_vec(), vector[start..end].to_vec())?;
            params.insert(name, array);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ParameterSet {
        ParameterSet::new()
            .with(
                "fc1.weight",
                ParamArray::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap(),
            )
            .with("fc1.bias", ParamArray::from_vec(vec![0.1, 0.2]))
            .with("scale", ParamArray::scalar(9.0))
    }

    #[test]
    fn test_flatten_concatenates_in_order() {
        let params = model();
        let indexer = FlattenIndexer::new(&params);

        assert_eq!(indexer.len(), 9);
        let flat = indexer.flatten(&params).unwrap();
        assert_eq!(flat, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.1, 0.2, 9.0]);
    }

    #[test]
    fn test_flatten_ignores_collection_order() {
        let params = model();
        let indexer = FlattenIndexer::new(&params);

        let reordered: ParameterSet = params
            .clone()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(
            indexer.flatten(&reordered).unwrap(),
            indexer.flatten(&params).unwrap()
        );
    }

    #[test]
    fn test_unflatten_roundtrip() {
        let params = model();
        let indexer = FlattenIndexer::new(&params);
        let flat = indexer.flatten(&params).unwrap();
        assert_eq!(indexer.unflatten(&flat).unwrap(), params);
    }

    #[test]
    fn test_flatten_missing_key() {
        let indexer = FlattenIndexer::new(&model());
        let partial = ParameterSet::new().with("fc1.bias", ParamArray::from_vec(vec![0.0, 0.0]));

        let err = indexer.flatten(&partial).unwrap_err();
        assert!(matches!(
            err,
            SharingError::MismatchedKeys(KeyMismatch::Missing(ref n)) if n == "fc1.weight"
        ));
    }

    #[test]
    fn test_flatten_unexpected_key() {
        let indexer = FlattenIndexer::new(&model());
        let extended = model().with("extra", ParamArray::scalar(0.0));

        let err = indexer.flatten(&extended).unwrap_err();
        assert!(matches!(
            err,
            SharingError::MismatchedKeys(KeyMismatch::Unexpected(ref n)) if n == "extra"
        ));
    }

    #[test]
    fn test_flatten_shape_drift() {
        let indexer = FlattenIndexer::new(&model());
        let mut drifted = model();
        drifted.insert("fc1.weight", ParamArray::zeros(vec![3, 2]));

        let err = indexer.flatten(&drifted).unwrap_err();
        assert!(matches!(
            err,
            SharingError::MismatchedKeys(KeyMismatch::Shape { .. })
        ));
    }

    #[test]
    fn test_unflatten_length_mismatch() {
        let indexer = FlattenIndexer::new(&model());
        let err = indexer.unflatten(&[0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            SharingError::LengthMismatch { expected: 9, got: 8 }
        ));
    }

    #[test]
    fn test_fingerprint_tracks_layout() {
        let a = FlattenIndexer::new(&model());
        let b = FlattenIndexer::new(&model());
        assert_eq!(a.registry().fingerprint(), b.registry().fingerprint());
        assert_eq!(a.registry().fingerprint().len(), 64);

        let mut other = model();
        other.insert("fc1.weight", ParamArray::zeros(vec![3, 2]));
        let c = FlattenIndexer::new(&other);
        assert_ne!(a.registry().fingerprint(), c.registry().fingerprint());
    }
}
