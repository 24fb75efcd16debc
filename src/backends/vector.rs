use std::borrow::Cow;

/// A trait for vector-like containers a sample grid can be held in.
///
/// `PlotFunction::eval_vector` reads the x-values through `values` and returns the
/// y-values in the same container type, built with `from_vec`.
///
/// # Examples
///
/// ```rust
/// use fnplot::prelude::Vector;
///
/// let grid = vec![0.0, 1.0, 2.0];
/// assert_eq!(grid.values().len(), 3);
///
/// let ys = <Vec<f64> as Vector>::from_vec(vec![1.0, 2.0]);
/// assert_eq!(Vector::len(&ys), 2);
/// ```
pub trait Vector {
    /// Returns the values as a contiguous slice, copying only if the container is
    /// not laid out contiguously.
    fn values(&self) -> Cow<'_, [f64]>;

    /// Builds the container from evaluated samples.
    fn from_vec(values: Vec<f64>) -> Self;

    /// Returns the length of the vector.
    fn len(&self) -> usize;

    /// Checks if the vector is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Vector for Vec<f64> {
    fn values(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self)
    }

    fn from_vec(values: Vec<f64>) -> Self {
        values
    }

    fn len(&self) -> usize {
        self.len()
    }
}

/// Implementation of Vector trait for ndarray's Array1<f64>.
///
/// Standard-layout arrays are read in place; strided ones are copied first.
///
/// # Examples
///
/// ```rust
/// use fnplot::prelude::Vector;
/// use ndarray::Array1;
///
/// let grid = Array1::linspace(0.0, 1.0, 5);
/// assert_eq!(grid.values()[4], 1.0);
/// ```
#[cfg(feature = "ndarray")]
impl Vector for ndarray::Array1<f64> {
    fn values(&self) -> Cow<'_, [f64]> {
        match self.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.to_vec()),
        }
    }

    fn from_vec(values: Vec<f64>) -> Self {
        ndarray::Array1::from_vec(values)
    }

    fn len(&self) -> usize {
        self.len()
    }
}
