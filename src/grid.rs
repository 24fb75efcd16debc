//! Sampling domain and sampled series.
//!
//! A `Range` is validated once, a `SampleGrid` of `SAMPLE_COUNT` points is built from it
//! for every render, and each evaluated expression becomes a `SeriesResult` where every
//! non-finite sample is replaced by `None`.

use crate::errors::{EvalError, PlotError};

/// Number of points every expression is sampled at.
pub const SAMPLE_COUNT: usize = 800;

/// A validated x-range with `xmin < xmax`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    xmin: f64,
    xmax: f64,
}

impl Range {
    /// Validates a pair of bounds.
    ///
    /// # Errors
    /// `PlotError::Validation` when a bound is not finite, when `xmin >= xmax`, or when
    /// the span itself overflows.
    pub fn new(xmin: f64, xmax: f64) -> Result<Self, PlotError> {
        if !xmin.is_finite() || !xmax.is_finite() {
            return Err(PlotError::Validation(
                "xmin and xmax must be finite numbers".to_string(),
            ));
        }
        if xmin >= xmax {
            return Err(PlotError::Validation("xmin must be < xmax".to_string()));
        }
        if !(xmax - xmin).is_finite() {
            return Err(PlotError::Validation("x range is too wide".to_string()));
        }
        Ok(Range { xmin, xmax })
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    pub fn span(&self) -> f64 {
        self.xmax - self.xmin
    }
}

/// `SAMPLE_COUNT` evenly spaced x-values over a `Range`.
///
/// The first point is exactly `xmin` and the last exactly `xmax`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    range: Range,
    xs: Vec<f64>,
}

impl SampleGrid {
    pub fn new(range: Range) -> Self {
        Self::with_count(range, SAMPLE_COUNT)
    }

    /// Builds a grid with a custom number of points (at least two).
    pub fn with_count(range: Range, count: usize) -> Self {
        let count = count.max(2);
        let step = range.span() / (count - 1) as f64;
        let mut xs: Vec<f64> = (0..count)
            .map(|i| range.xmin + i as f64 * step)
            .collect();
        xs[count - 1] = range.xmax;
        SampleGrid { range, xs }
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// One evaluated expression, aligned to its grid.
///
/// `None` is the non-finite marker: NaN, `+inf` and `-inf` samples all map to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesResult {
    label: String,
    xs: Vec<f64>,
    ys: Vec<Option<f64>>,
}

impl SeriesResult {
    /// Pairs raw samples with the grid they were evaluated on.
    ///
    /// # Errors
    /// `EvalError::OutputLength` if there is not exactly one sample per grid point.
    pub fn from_samples(
        label: impl Into<String>,
        grid: &SampleGrid,
        samples: Vec<f64>,
    ) -> Result<Self, EvalError> {
        if samples.len() != grid.len() {
            return Err(EvalError::OutputLength {
                expected: grid.len(),
                got: samples.len(),
            });
        }
        let ys = samples
            .into_iter()
            .map(|y| y.is_finite().then_some(y))
            .collect();
        Ok(SeriesResult {
            label: label.into(),
            xs: grid.xs().to_vec(),
            ys,
        })
    }

    /// The legend label of the series.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Samples in grid order, `None` where the value was not finite.
    pub fn values(&self) -> &[Option<f64>] {
        &self.ys
    }

    /// Number of samples that will be drawn.
    pub fn finite_count(&self) -> usize {
        self.ys.iter().flatten().count()
    }

    /// Splits the series at every missing sample.
    ///
    /// A run of a single finite point cannot be drawn as a line and is dropped.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();

        for (&x, y) in self.xs.iter().zip(&self.ys) {
            match y {
                Some(y) => current.push((x, *y)),
                None if current.len() > 1 => segments.push(std::mem::take(&mut current)),
                None => current.clear(),
            }
        }
        if current.len() > 1 {
            segments.push(current);
        }
        segments
    }

    /// Smallest and largest finite sample, if any.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        self.ys.iter().flatten().fold(None, |acc, &y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }
}
