//! Frozen classification data sets replayed as bandit contexts.

mod catalog;
pub mod svmlight;

pub use catalog::{DatasetCatalog, DatasetPaths};

use crate::errors::DatasetError;

use std::iter::StepBy;
use std::ops::Range;

/// Borrowed view of one feature row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Context<'a> {
    values: &'a [f64],
}

impl<'a> Context<'a> {
    pub const fn new(values: &'a [f64]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Nonzero coordinates as `(feature, value)` pairs.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.values
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, value)| value != 0.0)
    }

    /// Dot product against a weight column. Zero features never contribute, even
    /// against non-finite weights.
    pub fn dot<I>(&self, column: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        self.values
            .iter()
            .zip(column)
            .filter(|&(&value, _)| value != 0.0)
            .map(|(&value, weight)| value * weight)
            .sum()
    }
}

pub type Sample<'a> = (Context<'a>, usize);

/// Immutable set of `n` dense rows of width `d` with labels in `[0, k)`.
#[derive(Debug, PartialEq)]
pub struct Dataset {
    xs: Vec<f64>,
    ys: Vec<usize>,
    classes: Vec<i64>,
    d: usize,
}

impl Dataset {
    /// Builds a data set from row-major features. Labels are remapped to the rank of
    /// their value among the distinct labels.
    pub fn new(xs: Vec<f64>, labels: Vec<i64>, d: usize) -> Result<Self, DatasetError> {
        if xs.len() != labels.len() * d {
            return Err(DatasetError::Shape(format!(
                "{} values cannot hold {} rows of width {}",
                xs.len(),
                labels.len(),
                d
            )));
        }

        let classes = distinct_classes(&labels);
        let ys = labels
            .iter()
            .map(|label| class_index(&classes, *label))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DatasetError::Shape("label outside of class set".to_string()))?;

        Ok(Self::from_parts(xs, ys, classes, d))
    }

    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<i64>) -> Result<Self, DatasetError> {
        if rows.len() != labels.len() {
            return Err(DatasetError::Shape(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let d = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().position(|row| row.len() != d) {
            return Err(DatasetError::Shape(format!(
                "row {} has {} features, expected {}",
                row,
                rows[row].len(),
                d
            )));
        }

        Self::new(rows.into_iter().flatten().collect(), labels, d)
    }

    pub(crate) fn from_parts(xs: Vec<f64>, ys: Vec<usize>, classes: Vec<i64>, d: usize) -> Self {
        Self { xs, ys, classes, d }
    }

    pub fn n(&self) -> usize {
        self.ys.len()
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn k(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ys.is_empty()
    }

    /// Original label values, label `i` standing for `classes()[i]`.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn labels(&self) -> &[usize] {
        &self.ys
    }

    pub fn get<I: DatasetIndex>(&self, index: I) -> Result<I::Output<'_>, DatasetError> {
        index.fetch(self)
    }

    pub fn get_single(&self, index: usize) -> Result<Sample<'_>, DatasetError> {
        let label = *self.ys.get(index).ok_or(DatasetError::IndexOutOfBounds {
            index,
            len: self.n(),
        })?;
        let row = &self.xs[index * self.d..(index + 1) * self.d];

        Ok((Context::new(row), label))
    }

    pub fn get_range(&self, range: Range<usize>) -> Result<Vec<Sample<'_>>, DatasetError> {
        self.get_many(range)
    }

    /// Samples in the order the indices are given, repeats included.
    pub fn get_many<I>(&self, indices: I) -> Result<Vec<Sample<'_>>, DatasetError>
    where
        I: IntoIterator<Item = usize>,
    {
        indices
            .into_iter()
            .map(|index| self.get_single(index))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> + '_ {
        self.ys.iter().enumerate().map(move |(index, &label)| {
            let row = &self.xs[index * self.d..(index + 1) * self.d];
            (Context::new(row), label)
        })
    }
}

fn distinct_classes(labels: &[i64]) -> Vec<i64> {
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

pub(crate) fn class_index(classes: &[i64], label: i64) -> Option<usize> {
    classes.binary_search(&label).ok()
}

/// Index shapes accepted by [`Dataset::get`].
pub trait DatasetIndex {
    type Output<'a>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError>;
}

impl DatasetIndex for usize {
    type Output<'a> = Sample<'a>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError> {
        dataset.get_single(self)
    }
}

impl DatasetIndex for Range<usize> {
    type Output<'a> = Vec<Sample<'a>>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError> {
        dataset.get_range(self)
    }
}

impl DatasetIndex for StepBy<Range<usize>> {
    type Output<'a> = Vec<Sample<'a>>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError> {
        dataset.get_many(self)
    }
}

impl DatasetIndex for &[usize] {
    type Output<'a> = Vec<Sample<'a>>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError> {
        dataset.get_many(self.iter().copied())
    }
}

impl DatasetIndex for Vec<usize> {
    type Output<'a> = Vec<Sample<'a>>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError> {
        dataset.get_many(self)
    }
}

impl<const N: usize> DatasetIndex for [usize; N] {
    type Output<'a> = Vec<Sample<'a>>;

    fn fetch(self, dataset: &Dataset) -> Result<Self::Output<'_>, DatasetError> {
        dataset.get_many(self)
    }
}
