use deltashare_core::{CompressionRatio, Selector, SharingError};

/// Top-K selector
///
/// Keeps the `k = round(alpha * N)` positions whose accumulated delta has the
/// largest magnitude. The positions say *where* the model moved most; the
/// values sent for them are read from the parameters, not from the delta.
///
/// Ties at the boundary magnitude go to the lower flat index, and the result
/// is returned in ascending index order, so selection is a pure function of
/// the signal. NaN magnitudes rank above every finite one.
#[derive(Debug, Clone, Copy)]
pub struct TopKSelector {
    ratio: CompressionRatio,
}

impl TopKSelector {
    pub fn new(ratio: CompressionRatio) -> Self {
        Self { ratio }
    }

    pub fn with_alpha(alpha: f64) -> Result<Self, SharingError> {
        Ok(Self::new(CompressionRatio::new(alpha)?))
    }
}

impl Selector for TopKSelector {
    fn select(&self, signal: &[f32]) -> Vec<usize> {
        top_k_indices(signal, self.ratio.select_count(signal.len()))
    }
}

/// The `k` positions of `signal` with greatest absolute value, ascending.
pub fn top_k_indices(signal: &[f32], k: usize) -> Vec<usize> {
    let k = k.min(signal.len());
    if k == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..signal.len()).collect();
    if k < order.len() {
        // Larger magnitude first, then lower index; a total order, so the
        // partition is deterministic.
        order.select_nth_unstable_by(k - 1, |&a, &b| {
            signal[b]
                .abs()
                .total_cmp(&signal[a].abs())
                .then(a.cmp(&b))
        });
        order.truncate(k);
    }
    order.sort_unstable();
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_largest_magnitudes() {
        let selector = TopKSelector::with_alpha(0.5).unwrap();
        let picked = selector.select(&[0.1, -5.0, 2.0, 0.01]);
        assert_eq!(picked, vec![1, 2]);
    }

    #[test]
    fn test_full_ratio_selects_everything() {
        let selector = TopKSelector::new(CompressionRatio::FULL);
        let signal: Vec<f32> = (0..37).map(|i| ((i * 7) % 11) as f32 - 5.0).collect();
        let picked = selector.select(&signal);
        assert_eq!(picked, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_ratio_can_select_nothing() {
        let selector = TopKSelector::with_alpha(0.01).unwrap();
        assert!(selector.select(&[1.0, 2.0, 3.0]).is_empty());
        assert!(selector.select(&[]).is_empty());
    }

    #[test]
    fn test_tie_break_lowest_index() {
        let picked = top_k_indices(&[1.0, -1.0, 1.0, 1.0], 2);
        assert_eq!(picked, vec![0, 1]);

        let picked = top_k_indices(&[0.5, 2.0, -2.0, 2.0, 0.1], 2);
        assert_eq!(picked, vec![1, 2]);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let signal: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.37).sin().round()).collect();
        let a = top_k_indices(&signal, 123);
        let b = top_k_indices(&signal, 123);
        assert_eq!(a, b);
        assert_eq!(a.len(), 123);
    }

    #[test]
    fn test_sparse_spikes_survive() {
        // 95 small entries, 5 spikes: 5% keeps exactly the spikes
        let mut data = vec![0.01f32; 100];
        data[10] = 5.0;
        data[20] = -5.0;
        data[50] = 10.0;
        data[80] = -10.0;
        data[90] = 8.0;

        let selector = TopKSelector::with_alpha(0.05).unwrap();
        assert_eq!(selector.select(&data), vec![10, 20, 50, 80, 90]);
    }
}
