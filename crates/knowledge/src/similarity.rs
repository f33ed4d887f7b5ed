//! Vector similarity.

use docsift_core::{AppError, AppResult};

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm. Sums are accumulated in f64
/// and the result is clamped to `[-1.0, 1.0]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> AppResult<f32> {
    if a.len() != b.len() {
        return Err(AppError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(score.clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 0.001);

        let c = vec![1.0, 0.0, 0.0];
        let d = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&c, &d).unwrap().abs() < 0.001);

        let e = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&c, &e).unwrap() + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        match err {
            AppError::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_symmetry_and_self_similarity() {
        let vectors = [
            vec![0.3, -1.2, 4.5, 0.01],
            vec![10.0, 20.0, -30.0, 0.5],
            vec![1e-3, 2e-3, 3e-3, 4e-3],
            vec![-7.0, 0.0, 0.0, 7.0],
        ];

        for a in &vectors {
            let self_sim = cosine_similarity(a, a).unwrap();
            assert!((self_sim - 1.0).abs() < 1e-6, "self similarity {}", self_sim);

            for b in &vectors {
                let ab = cosine_similarity(a, b).unwrap();
                let ba = cosine_similarity(b, a).unwrap();
                assert_eq!(ab, ba);
                assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }
}
