//! Vector helpers shared by embedders and in-process indexes.

use crate::errors::EmbeddingError;

/// Scales `v` to unit length in place.
///
/// # Errors
/// Returns [`EmbeddingError::InvalidVector`] for empty, zero-norm or
/// non-finite vectors; such vectors carry no direction to compare.
pub fn l2_normalize(v: &mut [f32]) -> Result<(), EmbeddingError> {
    if v.is_empty() {
        return Err(EmbeddingError::InvalidVector("empty vector".into()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(EmbeddingError::InvalidVector("non-finite component".into()));
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return Err(EmbeddingError::InvalidVector("zero norm".into()));
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// Cosine similarity in `[-1, 1]`; `0.0` when either vector has zero norm
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_yields_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_rejects_degenerate_vectors() {
        assert!(l2_normalize(&mut []).is_err());
        assert!(l2_normalize(&mut [0.0, 0.0]).is_err());
        assert!(l2_normalize(&mut [f32::NAN, 1.0]).is_err());
    }

    #[test]
    fn cosine_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
