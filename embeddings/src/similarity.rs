//! Similarity and sanity checks for embeddings.

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors, or either vector is all zeros
/// - -1.0 means opposite vectors
///
/// Zero vectors are the placeholder for failed batch items, so they score
/// 0.0 instead of failing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a = magnitude(a);
    let magnitude_b = magnitude(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Outcome of [`validate_embedding`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

impl EmbeddingValidation {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

pub const ISSUE_NOT_AN_ARRAY: &str = "embedding is not an array";
pub const ISSUE_NON_NUMERIC: &str = "embedding contains non-numeric values";
pub const ISSUE_ZERO_VECTOR: &str = "embedding is a zero vector";

/// Check an embedding's length, element values and norm.
///
/// All applicable issues are reported, not just the first.
pub fn validate_embedding(embedding: &[f32], expected_dimensions: usize) -> EmbeddingValidation {
    let mut issues = Vec::new();

    if embedding.len() != expected_dimensions {
        issues.push(dimension_issue(embedding.len(), expected_dimensions));
    }

    if embedding.iter().any(|x| !x.is_finite()) {
        issues.push(ISSUE_NON_NUMERIC.to_string());
    }

    if magnitude(embedding) == 0.0 {
        issues.push(ISSUE_ZERO_VECTOR.to_string());
    }

    EmbeddingValidation::from_issues(issues)
}

/// [`validate_embedding`] for embeddings read from untyped JSON, e.g. a
/// vector store export.
pub fn validate_embedding_value(
    value: &serde_json::Value,
    expected_dimensions: usize,
) -> EmbeddingValidation {
    let Some(items) = value.as_array() else {
        return EmbeddingValidation::from_issues(vec![ISSUE_NOT_AN_ARRAY.to_string()]);
    };

    let mut issues = Vec::new();

    if items.len() != expected_dimensions {
        issues.push(dimension_issue(items.len(), expected_dimensions));
    }

    let numbers: Vec<f64> = items.iter().filter_map(serde_json::Value::as_f64).collect();
    if numbers.len() != items.len() || numbers.iter().any(|x| !x.is_finite()) {
        issues.push(ISSUE_NON_NUMERIC.to_string());
    }

    if numbers.iter().map(|x| x * x).sum::<f64>() == 0.0 {
        issues.push(ISSUE_ZERO_VECTOR.to_string());
    }

    EmbeddingValidation::from_issues(issues)
}

fn dimension_issue(actual: usize, expected: usize) -> String {
    format!("wrong dimensions: {actual} instead of {expected}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![0.3, -1.2, 4.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!((sim - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&zero, &[1.0, 2.0, 3.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_validate_valid_embedding() {
        let result = validate_embedding(&[0.1, 0.2, 0.3], 3);
        assert_eq!(
            result,
            EmbeddingValidation {
                is_valid: true,
                issues: Vec::new()
            }
        );
    }

    #[test]
    fn test_validate_wrong_dimensions_only() {
        let result = validate_embedding(&[1.0, 2.0, 3.0], 4);
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec!["wrong dimensions: 3 instead of 4".to_string()]);
    }

    #[test]
    fn test_validate_zero_vector_only() {
        let result = validate_embedding(&[0.0, 0.0, 0.0], 3);
        assert_eq!(result.issues, vec![ISSUE_ZERO_VECTOR.to_string()]);
    }

    #[test]
    fn test_validate_nan_only() {
        let result = validate_embedding(&[1.0, f32::NAN, 3.0], 3);
        assert_eq!(result.issues, vec![ISSUE_NON_NUMERIC.to_string()]);
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let result = validate_embedding(&[0.0, 0.0], 3);
        assert_eq!(
            result.issues,
            vec![
                "wrong dimensions: 2 instead of 3".to_string(),
                ISSUE_ZERO_VECTOR.to_string()
            ]
        );
    }

    #[test]
    fn test_validate_value_not_an_array() {
        let result = validate_embedding_value(&serde_json::json!({"values": [1.0]}), 1);
        assert_eq!(result.issues, vec![ISSUE_NOT_AN_ARRAY.to_string()]);
    }

    #[test]
    fn test_validate_value_non_numeric() {
        let result = validate_embedding_value(&serde_json::json!([1.0, "two", 3.0]), 3);
        assert_eq!(result.issues, vec![ISSUE_NON_NUMERIC.to_string()]);
    }

    #[test]
    fn test_validate_value_valid() {
        let result = validate_embedding_value(&serde_json::json!([1, 0.5, -2]), 3);
        assert!(result.is_valid);
    }
}
