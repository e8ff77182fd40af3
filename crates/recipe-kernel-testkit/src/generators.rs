//! Proptest generators for property-based testing.

use proptest::prelude::*;

use recipe_kernel_core::{ContentId, Metadata, MetadataValue, RecipeBody, RecipeBuilder};

/// Generate a chunk id: either a short name or a hex digest.
pub fn chunk_id() -> impl Strategy<Value = ContentId> {
    prop_oneof![
        "[a-z][a-z0-9]{0,7}".prop_map(ContentId::new),
        any::<Vec<u8>>().prop_map(|b| ContentId::for_bytes(&b)),
    ]
}

/// Generate a non-empty chunk list, duplicates allowed.
pub fn chunk_list(max_len: usize) -> impl Strategy<Value = Vec<ContentId>> {
    prop::collection::vec(chunk_id(), 1..=max_len.max(1))
}

/// Generate a metadata value, nested at most two levels.
pub fn metadata_value() -> impl Strategy<Value = MetadataValue> {
    let leaf = prop_oneof![
        Just(MetadataValue::Null),
        any::<bool>().prop_map(MetadataValue::Bool),
        any::<i64>().prop_map(MetadataValue::Integer),
        ".{0,16}".prop_map(MetadataValue::Text),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(MetadataValue::Bytes),
    ];

    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(MetadataValue::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(MetadataValue::Map),
        ]
    })
}

/// Generate a metadata map.
pub fn metadata(max_entries: usize) -> impl Strategy<Value = Metadata> {
    prop::collection::btree_map("[a-z_]{1,12}", metadata_value(), 0..=max_entries)
}

/// Generate a creator name.
pub fn creator() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000i64
}

/// Parameters for generating a recipe body.
#[derive(Debug, Clone)]
pub struct RecipeParams {
    pub creator: String,
    pub chunks: Vec<ContentId>,
    pub metadata: Metadata,
    pub timestamp: i64,
    pub value: u64,
}

impl Arbitrary for RecipeParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            creator(),
            chunk_list(8),
            metadata(6),
            timestamp(),
            any::<u64>(),
        )
            .prop_map(|(creator, chunks, metadata, timestamp, value)| RecipeParams {
                creator,
                chunks,
                metadata,
                timestamp,
                value,
            })
            .boxed()
    }
}

/// Build a body from parameters.
pub fn body_from_params(params: &RecipeParams) -> RecipeBody {
    RecipeBuilder::new(params.creator.clone())
        .chunks(params.chunks.iter().cloned())
        .metadata(params.metadata.clone())
        .timestamp(params.timestamp)
        .value(params.value)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_kernel_core::{canonical_bytes, decode_body, validate_body};

    proptest! {
        #[test]
        fn test_id_deterministic(params: RecipeParams) {
            let a = body_from_params(&params);
            let b = body_from_params(&params);
            prop_assert_eq!(a.compute_id(), b.compute_id());
        }

        #[test]
        fn test_decode_round_trip(params: RecipeParams) {
            let body = body_from_params(&params);
            let decoded = decode_body(&canonical_bytes(&body)).unwrap();
            prop_assert_eq!(&decoded.chunks, &body.chunks);
            prop_assert_eq!(decoded, body);
        }

        #[test]
        fn test_generated_bodies_are_valid(params: RecipeParams) {
            prop_assert!(validate_body(&body_from_params(&params)).is_ok());
        }

        #[test]
        fn test_chunk_order_changes_id(params: RecipeParams) {
            let a = body_from_params(&params);
            let mut b = a.clone();
            b.chunks.reverse();
            prop_assume!(a.chunks != b.chunks);
            prop_assert_ne!(a.compute_id(), b.compute_id());
        }

        #[test]
        fn test_patch_always_moves_updated_at(params: RecipeParams, patch in metadata(3)) {
            let a = body_from_params(&params);
            let b = a.with_metadata_patch(&patch, params.timestamp);
            prop_assert!(b.updated_at > a.updated_at);
            prop_assert!(b.created_at <= b.updated_at);
            prop_assert_ne!(a.compute_id(), b.compute_id());
        }
    }
}
