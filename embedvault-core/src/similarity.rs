//! Cosine similarity for ranking stored vectors.
//!
//! Stored vectors are single precision, but every accumulation here runs in
//! f64 so rounding error does not reorder close candidates.

use crate::error::{Error, Result};

/// Computes the dot product of two equal-length slices in f64.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

/// Computes the L2 norm of a slice in f64.
#[inline]
pub fn norm(a: &[f32]) -> f64 {
    a.iter()
        .map(|x| {
            let x = f64::from(*x);
            x * x
        })
        .sum::<f64>()
        .sqrt()
}

/// Computes cosine similarity between two vectors.
///
/// Formula: (a · b) / (||a|| * ||b||)
/// Range: [-1, 1] where 1 = same direction, -1 = opposite direction
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if the slices differ in length.
/// - [`Error::DegenerateVector`] if either vector has zero magnitude, or the
///   inputs hold non-finite values.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f64> {
    if query.len() != candidate.len() {
        return Err(Error::DimensionMismatch {
            expected: query.len(),
            got: candidate.len(),
        });
    }

    let denominator = norm(query) * norm(candidate);
    if denominator == 0.0 {
        return Err(Error::DegenerateVector("zero magnitude"));
    }

    let score = dot(query, candidate) / denominator;
    if !score.is_finite() {
        return Err(Error::DegenerateVector("non-finite components"));
    }

    // Rounding can push parallel vectors a hair past the bound.
    Ok(score.clamp(-1.0, 1.0))
}
