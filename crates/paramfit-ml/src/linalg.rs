//! Local dense vectors.

use std::fmt;

/// A dense vector of doubles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseVector {
    values: Vec<f64>,
}

impl DenseVector {
    /// Creates a vector that owns `values`.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// The number of elements.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// The elements as a slice.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consumes the vector and returns its elements.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// The element at index `i`, if in bounds.
    pub fn apply(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    /// The dot product with another slice of the same length.
    pub fn dot(&self, other: &[f64]) -> f64 {
        dot(&self.values, other)
    }
}

impl From<Vec<f64>> for DenseVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for DenseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{v:?}")?;
        }
        write!(f, "]")
    }
}

/// Factory methods for vectors.
pub struct Vectors;

impl Vectors {
    /// Creates a dense vector from its values.
    pub fn dense(values: impl Into<Vec<f64>>) -> DenseVector {
        DenseVector::new(values.into())
    }

    /// Creates a dense vector of `size` zeros.
    pub fn zeros(size: usize) -> DenseVector {
        DenseVector::new(vec![0.0; size])
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `y += alpha * x`
pub(crate) fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_vector_display() {
        let v = Vectors::dense([0.0, 1.1, -0.5]);
        assert_eq!(v.to_string(), "[0.0,1.1,-0.5]");
        assert_eq!(Vectors::zeros(0).to_string(), "[]");
    }

    #[test]
    fn test_dense_vector_ops() {
        let v = Vectors::dense(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.size(), 3);
        assert_eq!(v.apply(1), Some(2.0));
        assert_eq!(v.apply(3), None);
        assert_eq!(v.dot(&[1.0, 0.0, -1.0]), -2.0);

        let mut y = vec![1.0, 1.0];
        axpy(2.0, &[1.0, -1.0], &mut y);
        assert_eq!(y, vec![3.0, -1.0]);
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
    }
}
