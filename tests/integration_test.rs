//! Integration tests for simdex
//!
//! These tests verify end-to-end functionality of the store and the
//! retrieval engine against an on-disk data directory.

use simdex::{
    config::StoreConfig,
    embedding::EmbeddingProvider,
    engine::RetrievalEngine,
    error::Error,
    store::{Metric, VectorStore},
    types::{ContentRef, Embedding, Modality},
};
use std::sync::Arc;
use tempfile::TempDir;

fn store_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        data_dir: dir.path().to_path_buf(),
        hnsw_m: 8,
        hnsw_ef_construction: 100,
        hnsw_ef_search: 50,
        max_capacity: 10_000,
    }
}

/// Deterministic provider standing in for the HTTP text backend
struct HashTextProvider {
    dims: usize,
}

impl EmbeddingProvider for HashTextProvider {
    fn embed(&self, content: &ContentRef) -> simdex::Result<Embedding> {
        let ContentRef::Text(text) = content else {
            return Err(Error::UnsupportedContentKind(
                "text provider cannot embed image content".to_string(),
            ));
        };
        // Character histogram, normalized: deterministic and
        // similarity-preserving enough for retrieval assertions
        let mut embedding = vec![0.0f64; self.dims];
        for byte in text.bytes() {
            embedding[byte as usize % self.dims] += 1.0;
        }
        let norm: f64 = embedding.iter().map(|x| x * x).sum::<f64>().sqrt();
        Ok(embedding.iter().map(|x| x / norm.max(1.0)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn name(&self) -> &str {
        "hash-text"
    }
}

#[test]
fn test_store_scenario_create_insert_query() {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();

    store
        .create_collection("docs", "content", 3, Metric::Cosine)
        .unwrap();

    let id = store
        .insert("docs", "content", "hello", &vec![1.0, 0.0, 0.0])
        .unwrap();
    assert_eq!(id, 1);
    let id = store
        .insert("docs", "content", "world", &vec![0.0, 1.0, 0.0])
        .unwrap();
    assert_eq!(id, 2);

    let results = store
        .query("docs", "content", &vec![1.0, 0.0, 0.0], 2, Metric::Cosine)
        .unwrap();

    assert_eq!(results.len(), 2);
    // The matching entry ranks first with the maximum score
    assert_eq!(results[0].id, 1);
    assert_eq!(results[0].content, "hello");
    assert_eq!(results[0].score, 1.0);
    // The orthogonal entry follows with the transform's midpoint score
    assert_eq!(results[1].id, 2);
    assert_eq!(results[1].content, "world");
    assert_eq!(results[1].score, 0.5);
}

#[test]
fn test_self_query_returns_max_score_per_metric() {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();

    store
        .create_collection("cos", "content", 4, Metric::Cosine)
        .unwrap();
    store
        .create_collection("euc", "content", 4, Metric::Euclidean)
        .unwrap();

    let unit = vec![0.5, 0.5, 0.5, 0.5];
    store.insert("cos", "content", "only", &unit).unwrap();
    store.insert("euc", "content", "only", &unit).unwrap();

    let cos = store
        .query("cos", "content", &unit, 1, Metric::Cosine)
        .unwrap();
    assert_eq!(cos[0].score, 1.0);

    let euc = store
        .query("euc", "content", &unit, 1, Metric::Euclidean)
        .unwrap();
    assert_eq!(euc[0].score, 1.0);
}

#[test]
fn test_unnormalized_self_match_caps_at_one() {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();
    store
        .create_collection("raw", "content", 3, Metric::Cosine)
        .unwrap();

    // ||e|| = 2, so the raw transform exceeds 1 before the clamp
    let e = vec![2.0, 0.0, 0.0];
    store.insert("raw", "content", "big", &e).unwrap();

    let results = store
        .query("raw", "content", &e, 1, Metric::Cosine)
        .unwrap();
    assert_eq!(results[0].score, 1.0);
}

#[test]
fn test_full_lifecycle_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();
        store
            .create_collection("docs", "content", 3, Metric::Euclidean)
            .unwrap();
        store
            .insert("docs", "content", "alpha", &vec![0.0, 0.0, 0.0])
            .unwrap();
        store
            .insert("docs", "content", "beta", &vec![3.0, 0.0, 0.0])
            .unwrap();
    }

    let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();
    assert_eq!(store.len("docs").unwrap(), 2);

    // Ids continue after the highest assigned one
    let id = store
        .insert("docs", "content", "gamma", &vec![0.0, 1.0, 0.0])
        .unwrap();
    assert_eq!(id, 3);

    let results = store
        .query(
            "docs",
            "content",
            &vec![0.0, 0.0, 0.0],
            10,
            Metric::Euclidean,
        )
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].content, "alpha");
    assert_eq!(results[0].score, 1.0);
    // sqrt(9) = 3 away -> 1 / (1 + 3)
    let beta = results.iter().find(|r| r.content == "beta").unwrap();
    assert_eq!(beta.score, 0.25);
}

#[test]
fn test_engine_add_and_query_through_provider() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(VectorStore::open(dir.path(), &store_config(&dir)).unwrap());
    store
        .create_collection("notes", "content", 16, Metric::Cosine)
        .unwrap();

    let engine = RetrievalEngine::new(store)
        .with_text_provider(Arc::new(HashTextProvider { dims: 16 }));

    let first = engine
        .add_content(
            "notes",
            "content",
            ContentRef::Text("the quick brown fox".to_string()),
        )
        .unwrap();
    assert_eq!(first, 1);
    engine
        .add_content(
            "notes",
            "content",
            ContentRef::Text("zzzzzzzz".to_string()),
        )
        .unwrap();

    // Querying with the exact stored text surfaces it first at score 1.0
    let results = engine
        .query_content(
            "notes",
            "content",
            ContentRef::Text("the quick brown fox".to_string()),
            2,
            Metric::Cosine,
        )
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, first);
    assert_eq!(results[0].content, "the quick brown fox");
    assert_eq!(results[0].score, 1.0);
    assert!(results[1].score < 1.0);
}

#[test]
fn test_engine_without_image_provider_fails_fast() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(VectorStore::open(dir.path(), &store_config(&dir)).unwrap());
    store
        .create_collection("pics", "path", 8, Metric::Cosine)
        .unwrap();

    let engine = RetrievalEngine::new(store.clone())
        .with_text_provider(Arc::new(HashTextProvider { dims: 8 }));

    let err = engine
        .add_content("pics", "path", ContentRef::image("cat.jpg"))
        .unwrap_err();
    assert!(matches!(err, Error::ProviderRequired(Modality::Image)));
    assert_eq!(store.len("pics").unwrap(), 0);
}

#[test]
fn test_error_taxonomy_end_to_end() {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();

    // Unknown collection before creation
    let err = store
        .query("docs", "content", &vec![1.0], 1, Metric::Cosine)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCollection(_)));

    store
        .create_collection("docs", "content", 2, Metric::Cosine)
        .unwrap();

    // Dimension mismatch never writes
    let err = store
        .insert("docs", "content", "bad", &vec![1.0, 2.0, 3.0])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert_eq!(store.len("docs").unwrap(), 0);

    // Metric names are validated at the boundary
    let err = Metric::parse("dot").unwrap_err();
    assert!(matches!(err, Error::InvalidMetric(_)));
}

#[test]
fn test_top_k_bounds() {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::open(dir.path(), &store_config(&dir)).unwrap();
    store
        .create_collection("docs", "content", 2, Metric::Cosine)
        .unwrap();

    for i in 0..3 {
        store
            .insert(
                "docs",
                "content",
                &format!("entry {i}"),
                &vec![1.0, i as f64],
            )
            .unwrap();
    }

    let empty = store
        .query("docs", "content", &vec![1.0, 0.0], 0, Metric::Cosine)
        .unwrap();
    assert!(empty.is_empty());

    let all = store
        .query("docs", "content", &vec![1.0, 0.0], 100, Metric::Cosine)
        .unwrap();
    assert_eq!(all.len(), 3);
}
