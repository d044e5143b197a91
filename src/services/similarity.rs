use crate::error::{AppError, AppResult};

/// Cosine similarity between two embeddings
///
/// Returns a value in `[-1, 1]`. Zero-norm vectors yield `0.0` rather than NaN
/// so callers can always compare the result against a threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> AppResult<f32> {
    if a.len() != b.len() {
        return Err(AppError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot_product = dot(a, b);
    let norm_sq_a = dot(a, a);
    let norm_sq_b = dot(b, b);

    if norm_sq_a == 0.0 || norm_sq_b == 0.0 {
        return Ok(0.0);
    }

    // One square root over the product keeps sim(v, v) exactly 1.0
    let similarity = dot_product / (norm_sq_a * norm_sq_b).sqrt();
    Ok((similarity as f32).clamp(-1.0, 1.0))
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [3.0, 4.0, 0.0];
        assert_eq!(cosine_similarity(&v, &v).unwrap(), 1.0);

        let v = [1.0, -2.0, 2.0];
        assert_eq!(cosine_similarity(&v, &v).unwrap(), 1.0);
    }

    #[test]
    fn test_identical_vectors_with_irrational_norms() {
        let vectors: Vec<Vec<f32>> = vec![
            vec![0.1, 0.2, 0.3],
            vec![0.7, 0.3, 0.2, 0.9],
            vec![-0.013, 0.482, 0.0071, -0.9, 0.33],
            vec![1e-3, 2e-3, 5e-4],
            (0..768).map(|i| ((i as f32) * 0.37).sin()).collect(),
        ];

        for v in &vectors {
            assert_eq!(cosine_similarity(v, v).unwrap(), 1.0, "vector {:?}", v);
        }
    }

    #[test]
    fn test_symmetric() {
        let a = [0.1, 0.7, -0.4];
        let b = [0.9, -0.2, 0.3];
        assert_eq!(
            cosine_similarity(&a, &b).unwrap(),
            cosine_similarity(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), -1.0);
    }

    #[test]
    fn test_zero_vector_returns_zero() {
        let result = cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(result, 0.0);
        assert!(!result.is_nan());
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch { left: 2, right: 3 })
        ));
    }
}
