//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding of recipe bodies byte for byte.
//! Any participant that encodes differently would derive different ids for
//! the same recipe.

use recipe_kernel_core::{Metadata, MetadataValue, RecipeBody, RecipeBuilder};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Creator.
    pub creator: &'static str,
    /// Chunk ids in order.
    pub chunks: &'static [&'static str],
    /// Metadata entries.
    pub metadata: fn() -> Metadata,
    /// Creation time.
    pub created_at: i64,
    /// Last mutation time.
    pub updated_at: i64,
    /// Value.
    pub value: u64,
    /// Expected canonical encoding (hex).
    pub expected_canonical_hex: &'static str,
}

fn demo_metadata() -> Metadata {
    let mut m = Metadata::new();
    m.insert("name".into(), MetadataValue::from("demo"));
    m
}

fn rich_metadata() -> Metadata {
    let mut nested = Metadata::new();
    nested.insert("b".into(), MetadataValue::Integer(1));
    nested.insert("a".into(), MetadataValue::Integer(2));

    let mut m = Metadata::new();
    m.insert(
        "tags".into(),
        MetadataValue::Array(vec!["a".into(), "b".into()]),
    );
    m.insert("name".into(), MetadataValue::from("demo2"));
    m.insert("zz".into(), MetadataValue::Null);
    m.insert("n".into(), MetadataValue::Integer(-5));
    m.insert("raw".into(), MetadataValue::Bytes(vec![0x00, 0xff]));
    m.insert("flag".into(), MetadataValue::Bool(true));
    m.insert("nested".into(), MetadataValue::Map(nested));
    m
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "demo recipe by alice",
            creator: "alice",
            chunks: &["c1", "c2"],
            metadata: demo_metadata,
            created_at: 1736870400000, // 2025-01-14T16:00:00Z
            updated_at: 1736870400000,
            value: 0,
            expected_canonical_hex: "a700010165616c696365021b00000194658b1000031b00000194658b1000\
                                     048262633162633205a1646e616d656464656d6f0600",
        },
        GoldenVector {
            name: "minimal recipe",
            creator: "bob",
            chunks: &["c1"],
            metadata: Metadata::new,
            created_at: 0,
            updated_at: 0,
            value: 0,
            expected_canonical_hex: "a700010163626f6202000300048162633105a00600",
        },
        GoldenVector {
            name: "updated recipe with every metadata kind",
            creator: "carol",
            chunks: &["c2", "c1", "c2"],
            metadata: rich_metadata,
            created_at: 1736870400000,
            updated_at: 1736870401000,
            value: 300,
            expected_canonical_hex: "a7000101656361726f6c021b00000194658b1000031b00000194658b13e8\
                                     048362633262633162633205a7616e24627a7af6637261774200ff\
                                     64666c6167f5646e616d656564656d6f3264746167738261616162\
                                     666e6573746564a26161026162010619012c",
        },
    ]
}

/// Build the body a vector describes.
pub fn body_from_vector(vector: &GoldenVector) -> RecipeBody {
    let mut body = RecipeBuilder::new(vector.creator)
        .chunks(vector.chunks.iter().copied())
        .metadata((vector.metadata)())
        .timestamp(vector.created_at)
        .value(vector.value)
        .build();
    body.updated_at = vector.updated_at;
    body
}

/// Check every vector. Returns (name, passed, actual hex).
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .into_iter()
        .map(|vector| {
            let actual = hex::encode(body_from_vector(&vector).canonical_bytes());
            let passed = actual == vector.expected_canonical_hex;
            (vector.name.to_string(), passed, actual)
        })
        .collect()
}
