//! This is the vector math module
//! Provide L2 norm, normalization, dot product and euclidean distance

use thiserror::Error;

/// Failures of the low-level vector operations.
#[derive(Debug, Error, PartialEq)]
pub enum VectorError {
    #[error("cannot normalize an empty vector")]
    Empty,

    #[error("cannot normalize a zero vector")]
    Zero,

    #[error("vector contains non-finite values")]
    NonFinite,

    #[error("different dimensions: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// L2 Norm
/// ||vec|| = m * sqrt(sum((vec[i] / m)^2)), m = max|vec[i]|
/// Scaling by the largest component keeps the squares from under/overflowing
pub fn norm(vector: &[f32]) -> f32 {
    let max = max_abs(vector);
    if max == 0.0 || !max.is_finite() {
        return max;
    }
    max * scaled_sum_sq(vector, max).sqrt()
}

/// L2 Normalization
/// norm_vec = (vec / m) / ||vec / m||
/// Zero vector cannot be normalized
pub fn l2_normalize(vector: &[f32]) -> Result<Vec<f32>, VectorError> {
    if vector.is_empty() {
        return Err(VectorError::Empty);
    }

    let max = max_abs(vector);

    if !max.is_finite() {
        return Err(VectorError::NonFinite);
    }
    if max == 0.0 {
        return Err(VectorError::Zero);
    }

    // sum lies in [1, len], so this never under/overflows
    let scaled_norm = scaled_sum_sq(vector, max).sqrt();

    Ok(vector.iter().map(|x| (x / max) / scaled_norm).collect())
}

/// NaN compares false in `max`, so it is surfaced explicitly.
fn max_abs(vector: &[f32]) -> f32 {
    vector.iter().fold(0.0f32, |acc, x| {
        if x.is_nan() { f32::NAN } else if acc.is_nan() { acc } else { acc.max(x.abs()) }
    })
}

fn scaled_sum_sq(vector: &[f32], max: f32) -> f32 {
    vector.iter()
        .map(|x| x / max)
        .map(|x| x * x)
        .sum()
}

/// Dot Product
/// dot_prod = sum(a[i] * b[i]) for i = 0..a.len()
/// Can only process vectors with same dimensions
pub fn dot_product(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    check_same_len(left, right)?;

    let dot_prod = left.iter()
        .zip(right.iter())
        .map(|(x, y)| x * y)
        .sum();

    Ok(dot_prod)
}

/// Euclidean Distance
/// dist = sqrt(sum((a[i] - b[i])^2))
pub fn euclidean_distance(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    check_same_len(left, right)?;

    let dist = left.iter()
        .zip(right.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt();

    Ok(dist)
}

/// True when no component is NaN or infinite.
pub fn all_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

fn check_same_len(left: &[f32], right: &[f32]) -> Result<(), VectorError> {
    if left.len() != right.len() {
        return Err(VectorError::DimensionMismatch { left: left.len(), right: right.len() });
    }
    Ok(())
}
