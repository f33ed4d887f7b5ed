//! Ranking, filtering and deletion behaviour of the in-memory index.

use crate::index::MemoryVectorIndex;
use crate::vector_index::{DocumentFilter, Metadata, VectorIndex};
use serde_json::{json, Value};

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn from_document(document_id: Value) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("originalDocumentId".to_string(), document_id);
    metadata
}

#[test]
fn test_two_vector_scenario() {
    let index = MemoryVectorIndex::new();
    index.store("x", vec![1.0, 0.0], from_document(json!(1))).unwrap();
    index.store("y", vec![0.0, 1.0], from_document(json!(2))).unwrap();

    let results = index.search(&[1.0, 0.0], 2, None).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "x");
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(results[1].id, "y");
    assert!(results[1].score.abs() < 1e-6);

    let filter = DocumentFilter::new(["2"]);
    let results = index.search(&[1.0, 0.0], 2, Some(&filter)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "y");
    assert!(results[0].score.abs() < 1e-6);
}

#[test]
fn test_relevant_vector_ranks_first() {
    let index = MemoryVectorIndex::new();
    index
        .store("rust", normalize(&[1.0, 0.5, 0.2, 0.1]), Metadata::new())
        .unwrap();
    index
        .store("pasta", normalize(&[-0.3, -0.8, 0.4, -0.2]), Metadata::new())
        .unwrap();

    let results = index
        .search(&normalize(&[0.9, 0.4, 0.3, 0.1]), 5, None)
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "rust", "Most relevant vector should be first");
    assert!(
        results[0].score > 0.8,
        "Relevant score should be high: {}",
        results[0].score
    );
    assert!(results[0].score > results[1].score);
}

#[test]
fn test_scores_are_non_increasing() {
    let index = MemoryVectorIndex::new();
    let vectors = [
        [1.0, 0.0, 0.0],
        [0.7, 0.7, 0.0],
        [0.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.2, 0.1, 0.9],
        [0.7, 0.7, 0.0],
    ];
    for (i, v) in vectors.iter().enumerate() {
        index.store(&format!("v{}", i), v.to_vec(), Metadata::new()).unwrap();
    }

    for query in [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [-0.5, 0.5, 0.1]] {
        let results = index.search(&query, 10, None).unwrap();
        assert_eq!(results.len(), vectors.len());
        for pair in results.windows(2) {
            assert!(
                pair[0].score >= pair[1].score,
                "Scores should be ordered: {} >= {}",
                pair[0].score,
                pair[1].score
            );
        }
    }
}

#[test]
fn test_opposite_vector_scores_negative() {
    let index = MemoryVectorIndex::new();
    index.store("opposite", vec![-1.0, 0.0, 0.0], Metadata::new()).unwrap();

    let results = index.search(&[1.0, 0.0, 0.0], 5, None).unwrap();
    assert_eq!(results.len(), 1);
    assert!((results[0].score + 1.0).abs() < 1e-6);
}

#[test]
fn test_zero_vector_scores_zero() {
    let index = MemoryVectorIndex::new();
    index.store("zero", vec![0.0, 0.0], Metadata::new()).unwrap();

    let results = index.search(&[1.0, 0.0], 5, None).unwrap();
    assert_eq!(results[0].score, 0.0);
}

#[test]
fn test_top_k_limit_respected() {
    let index = MemoryVectorIndex::new();
    for i in 0..10 {
        index
            .store(&format!("chunk{}", i), vec![i as f32 + 1.0, 1.0, 0.0], Metadata::new())
            .unwrap();
    }

    let results = index.search(&[1.0, 0.0, 0.0], 3, None).unwrap();
    assert_eq!(results.len(), 3, "Should return exactly top_k results");
    assert_eq!(results[0].id, "chunk9");
}

#[test]
fn test_filter_only_returns_listed_documents() {
    let index = MemoryVectorIndex::new();
    for doc in 0..5 {
        for chunk in 0..4 {
            let vector = vec![doc as f32 + 1.0, chunk as f32 + 1.0];
            index
                .store(&format!("{}_{}", doc, chunk), vector, from_document(json!(doc)))
                .unwrap();
        }
    }
    index.store("orphan", vec![1.0, 1.0], Metadata::new()).unwrap();

    let filter = DocumentFilter::new(["1", "3"]);
    let results = index.search(&[1.0, 1.0], 100, Some(&filter)).unwrap();

    assert_eq!(results.len(), 8);
    for hit in &results {
        let doc = &hit.metadata["originalDocumentId"];
        assert!(doc == &json!(1) || doc == &json!(3), "unexpected {}", doc);
    }

    let empty = DocumentFilter::new(Vec::<String>::new());
    assert!(index.search(&[1.0, 1.0], 100, Some(&empty)).unwrap().is_empty());
}

#[test]
fn test_deleted_id_never_returned() {
    let index = MemoryVectorIndex::new();
    for i in 0..6 {
        index
            .store(&format!("id{}", i), vec![1.0, i as f32], Metadata::new())
            .unwrap();
    }

    for removed in ["id0", "id3", "id5"] {
        index.delete(removed).unwrap();
        let results = index.search(&[1.0, 1.0], 100, None).unwrap();
        assert!(results.iter().all(|hit| hit.id != removed));
    }

    assert_eq!(index.search(&[1.0, 1.0], 100, None).unwrap().len(), 3);
}
