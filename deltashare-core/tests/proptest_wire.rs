use deltashare_core::{
    CompressionRatio, FlattenIndexer, ParameterSet, SharingError, SparseCodec, SparseUpdate,
    WireFormat,
};
use deltashare_math::ParamArray;
use proptest::prelude::*;

fn update_strategy(flat_len: usize) -> impl Strategy<Value = SparseUpdate> {
    prop::collection::vec((0..flat_len, -1e6f32..1e6f32), 0..64).prop_map(|pairs| {
        let (indices, values): (Vec<usize>, Vec<f32>) = pairs.into_iter().unzip();
        SparseUpdate::new(indices, values).unwrap()
    })
}

fn parameters_strategy() -> impl Strategy<Value = ParameterSet> {
    prop::collection::vec(prop::collection::vec(1usize..5, 0..3), 1..6).prop_map(|shapes| {
        shapes
            .into_iter()
            .enumerate()
            .map(|(i, shape)| {
                let n: usize = shape.iter().product();
                let data = (0..n).map(|j| (i * 100 + j) as f32 * 0.5).collect();
                (format!("layer{i}.weight"), ParamArray::new(shape, data).unwrap())
            })
            .collect()
    })
}

// Property 1: decode(encode(u)) == u for finite values, both wire formats
proptest! {
    #[test]
    fn prop_wire_roundtrip(update in update_strategy(1000), flat in any::<bool>()) {
        let format = if flat { WireFormat::Flat } else { WireFormat::Nested };
        let codec = SparseCodec::new(1000, format);

        let bytes = codec.encode(&update).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        prop_assert_eq!(decoded, update);
    }
}

// Property 2: a receiver with a shorter model rejects out-of-range indices
proptest! {
    #[test]
    fn prop_decode_rejects_foreign_layout(update in update_strategy(1000), receiver_len in 0usize..1000) {
        let sender = SparseCodec::new(1000, WireFormat::Nested);
        let receiver = SparseCodec::new(receiver_len, WireFormat::Nested);
        let bytes = sender.encode(&update).unwrap();

        let out_of_range = update.indices().iter().any(|&i| i >= receiver_len);
        match receiver.decode(&bytes) {
            Ok(decoded) => {
                prop_assert!(!out_of_range);
                prop_assert_eq!(decoded, update);
            }
            Err(SharingError::InvalidIndex { .. }) => prop_assert!(out_of_range),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}

// Property 3: unflatten(flatten(P)) == P for any layout
proptest! {
    #[test]
    fn prop_flatten_identity(params in parameters_strategy()) {
        let indexer = FlattenIndexer::new(&params);
        let flat = indexer.flatten(&params).unwrap();

        prop_assert_eq!(flat.len(), params.numel());
        prop_assert_eq!(indexer.unflatten(&flat).unwrap(), params);
    }
}

// Property 4: selection size never exceeds N and full ratio keeps everything
proptest! {
    #[test]
    fn prop_select_count_bounded(alpha in 0.001f64..=1.0, n in 0usize..10_000) {
        let ratio = CompressionRatio::new(alpha).unwrap();
        let k = ratio.select_count(n);
        prop_assert!(k <= n);
        prop_assert_eq!(CompressionRatio::FULL.select_count(n), n);
    }
}
