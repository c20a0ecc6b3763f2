use deltashare_core::{CompressionRatio, Selector};
use deltashare_train::{top_k_indices, TopKSelector};
use proptest::prelude::*;

// Property 1: alpha = 1.0 selects every position exactly once
proptest! {
    #[test]
    fn prop_full_ratio_covers_range(signal in prop::collection::vec(-100.0f32..100.0f32, 0..300)) {
        let selector = TopKSelector::new(CompressionRatio::FULL);
        let picked = selector.select(&signal);
        prop_assert_eq!(picked, (0..signal.len()).collect::<Vec<_>>());
    }
}

// Property 2: selection size is round(alpha * N) and indices are unique and in range
proptest! {
    #[test]
    fn prop_selection_size_and_uniqueness(
        signal in prop::collection::vec(-100.0f32..100.0f32, 0..300),
        alpha in 0.001f64..=1.0
    ) {
        let ratio = CompressionRatio::new(alpha).unwrap();
        let picked = TopKSelector::new(ratio).select(&signal);

        prop_assert_eq!(picked.len(), ratio.select_count(signal.len()));
        prop_assert!(picked.windows(2).all(|w| w[0] < w[1]), "not strictly ascending");
        prop_assert!(picked.iter().all(|&i| i < signal.len()));
    }
}

// Property 3: every kept magnitude is >= every dropped magnitude
proptest! {
    #[test]
    fn prop_kept_dominate_dropped(
        signal in prop::collection::vec(-100.0f32..100.0f32, 1..300),
        k in 0usize..300
    ) {
        let picked = top_k_indices(&signal, k);
        let min_kept = picked.iter().map(|&i| signal[i].abs()).fold(f32::INFINITY, f32::min);
        let max_dropped = (0..signal.len())
            .filter(|i| picked.binary_search(i).is_err())
            .map(|i| signal[i].abs())
            .fold(0.0f32, f32::max);

        if !picked.is_empty() && picked.len() < signal.len() {
            prop_assert!(min_kept >= max_dropped, "kept {} < dropped {}", min_kept, max_dropped);
        }
    }
}
