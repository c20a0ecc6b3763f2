use deltashare_core::{AccumulatedDelta, DeltaMap, ShapeRegistry, SharingError};
use tracing::debug;

/// Round-scoped list of per-step gradient snapshots.
///
/// The training loop records one [`DeltaMap`] per batch; the sharing side
/// reduces them with [`sum`](Self::sum). Owned by the round context and lent
/// to both sides by reference.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    deltas: Vec<DeltaMap>,
    registry: Option<ShapeRegistry>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator that checks every recorded delta against `registry`.
    pub fn with_registry(registry: ShapeRegistry) -> Self {
        Self {
            deltas: Vec::new(),
            registry: Some(registry),
        }
    }

    pub fn record(&mut self, delta: DeltaMap) -> Result<(), SharingError> {
        if let Some(registry) = &self.registry {
            registry.check(&delta)?;
        }
        self.deltas.push(delta);
        Ok(())
    }

    /// Drop everything recorded so far. Called at the start of each round.
    pub fn reset(&mut self) {
        self.deltas.clear();
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Key-by-key elementwise sum of all recorded deltas.
    ///
    /// Fails with [`SharingError::EmptyAccumulation`] when nothing was
    /// recorded: a zero signal would silently mean "share nothing".
    pub fn sum(&self) -> Result<AccumulatedDelta, SharingError> {
        let (first, rest) = self
            .deltas
            .split_first()
            .ok_or(SharingError::EmptyAccumulation)?;
        debug!(deltas = self.deltas.len(), "Summing up gradients");

        // Every snapshot must carry exactly the first one's names and shapes.
        let layout = ShapeRegistry::from_parameters(first);
        let mut total = first.clone();
        for delta in rest {
            layout.check(delta)?;
            for (name, array) in delta.iter() {
                if let Some(slot) = total.get_mut(name) {
                    slot.add_assign(array)?;
                }
            }
        }
        let peak = total.iter().map(|(_, a)| a.abs_max()).fold(0.0f32, f32::max);
        debug!(peak, "Accumulated delta");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltashare_core::{KeyMismatch, ParameterSet};
    use deltashare_math::ParamArray;

    fn delta(a: f32) -> DeltaMap {
        ParameterSet::new().with("a", ParamArray::scalar(a))
    }

    #[test]
    fn test_sum_three_deltas() {
        let mut acc = DeltaAccumulator::new();
        acc.record(delta(1.0)).unwrap();
        acc.record(delta(2.0)).unwrap();
        acc.record(delta(3.0)).unwrap();

        let total = acc.sum().unwrap();
        assert_eq!(total, delta(6.0));
        // sum() does not consume the round
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_sum_after_reset_is_error() {
        let mut acc = DeltaAccumulator::new();
        acc.record(delta(1.0)).unwrap();
        acc.reset();
        assert!(matches!(acc.sum(), Err(SharingError::EmptyAccumulation)));
    }

    #[test]
    fn test_sum_on_fresh_accumulator_is_error() {
        let acc = DeltaAccumulator::new();
        assert!(matches!(acc.sum(), Err(SharingError::EmptyAccumulation)));
    }

    #[test]
    fn test_sum_multi_key() {
        let mut acc = DeltaAccumulator::new();
        for step in 0..4 {
            let s = step as f32;
            acc.record(
                ParameterSet::new()
                    .with("w", ParamArray::new(vec![2, 2], vec![s, -s, 1.0, 0.0]).unwrap())
                    .with("b", ParamArray::from_vec(vec![0.5])),
            )
            .unwrap();
        }
        let total = acc.sum().unwrap();
        assert_eq!(total.get("w").unwrap().data(), &[6.0, -6.0, 4.0, 0.0]);
        assert_eq!(total.get("w").unwrap().shape(), &[2, 2]);
        assert_eq!(total.get("b").unwrap().data(), &[2.0]);
    }

    #[test]
    fn test_sum_rejects_foreign_key() {
        let mut acc = DeltaAccumulator::new();
        acc.record(delta(1.0)).unwrap();
        acc.record(ParameterSet::new().with("z", ParamArray::scalar(1.0)))
            .unwrap();
        assert!(matches!(acc.sum(), Err(SharingError::MismatchedKeys(_))));
    }

    #[test]
    fn test_sum_rejects_missing_key() {
        let mut acc = DeltaAccumulator::new();
        acc.record(
            ParameterSet::new()
                .with("a", ParamArray::scalar(1.0))
                .with("b", ParamArray::scalar(2.0)),
        )
        .unwrap();
        acc.record(delta(1.0)).unwrap();

        assert!(matches!(
            acc.sum(),
            Err(SharingError::MismatchedKeys(KeyMismatch::Missing(ref n))) if n == "b"
        ));
    }

    #[test]
    fn test_registry_validates_on_record() {
        let baseline = ParameterSet::new().with("a", ParamArray::scalar(0.0));
        let mut acc = DeltaAccumulator::with_registry(ShapeRegistry::from_parameters(&baseline));

        assert!(acc.record(delta(1.0)).is_ok());
        let wrong = ParameterSet::new().with("a", ParamArray::from_vec(vec![1.0, 2.0]));
        assert!(matches!(acc.record(wrong), Err(SharingError::MismatchedKeys(_))));
        assert_eq!(acc.len(), 1);
    }
}
