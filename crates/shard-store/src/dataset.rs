//! Rectangular numeric arrays and their element types.

use serde::{Deserialize, Serialize};
use shard_core::errors::{codes, ErrorInfo, ShardError};

/// Element representation of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Wide 64-bit floating point (headers, clouds, meta).
    Float64,
    /// Narrow 16-bit signed integer (detector data).
    Int16,
}

/// Flat, row-major element storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayData {
    /// Wide floating point elements.
    Float64(Vec<f64>),
    /// Narrow integer elements.
    Int16(Vec<i16>),
}

impl ArrayData {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Float64(values) => values.len(),
            ArrayData::Int16(values) => values.len(),
        }
    }

    /// Whether no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rectangular numeric array stored under one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    shape: Vec<usize>,
    data: ArrayData,
}

/// Element count implied by a shape. An empty shape is a scalar.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
}

impl Dataset {
    /// Builds a dataset, rejecting shapes that disagree with the element count.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, ShardError> {
        let dataset = Self { shape, data };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Builds a wide floating point dataset.
    pub fn from_f64(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, ShardError> {
        Self::new(shape, ArrayData::Float64(values))
    }

    /// Builds a narrow integer dataset.
    pub fn from_i16(shape: Vec<usize>, values: Vec<i16>) -> Result<Self, ShardError> {
        Self::new(shape, ArrayData::Int16(values))
    }

    /// One-dimensional wide record, as used for `meta/meta`.
    pub fn record(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Float64(values),
        }
    }

    pub(crate) fn from_parts_unchecked(shape: Vec<usize>, data: ArrayData) -> Self {
        Self { shape, data }
    }

    /// Checks that the shape describes exactly the stored elements.
    pub fn validate(&self) -> Result<(), ShardError> {
        match element_count(&self.shape) {
            Some(expected) if expected == self.data.len() => Ok(()),
            expected => Err(ShardError::Store(
                ErrorInfo::new(codes::DATASET_SHAPE, "shape does not match element count")
                    .with_context("shape", format!("{:?}", self.shape))
                    .with_context(
                        "expected",
                        expected.map_or_else(|| "overflow".to_string(), |n| n.to_string()),
                    )
                    .with_context("actual", self.data.len().to_string()),
            )),
        }
    }

    /// Extent of each dimension, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major elements.
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the dataset holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored element representation.
    pub fn element_type(&self) -> ElementType {
        match self.data {
            ArrayData::Float64(_) => ElementType::Float64,
            ArrayData::Int16(_) => ElementType::Int16,
        }
    }

    /// Widens every element to `f64`. Exact for both representations.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.data {
            ArrayData::Float64(values) => values.clone(),
            ArrayData::Int16(values) => values.iter().map(|&v| f64::from(v)).collect(),
        }
    }

    /// The first element in row-major order.
    pub fn first_scalar(&self) -> Option<f64> {
        match &self.data {
            ArrayData::Float64(values) => values.first().copied(),
            ArrayData::Int16(values) => values.first().map(|&v| f64::from(v)),
        }
    }

    /// Replaces the first element in row-major order.
    ///
    /// Only wide datasets carry an event-index field, so narrow datasets and
    /// empty datasets are rejected.
    pub fn with_first_scalar(mut self, value: f64) -> Result<Self, ShardError> {
        if let ArrayData::Float64(values) = &mut self.data {
            if let Some(first) = values.first_mut() {
                *first = value;
                return Ok(self);
            }
        }
        Err(ShardError::Store(
            ErrorInfo::new(
                codes::DATASET_SHAPE,
                "dataset has no wide first scalar to relabel",
            )
            .with_context("shape", format!("{:?}", self.shape))
            .with_context("element_type", format!("{:?}", self.element_type())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shape_holds_one_element() {
        assert_eq!(element_count(&[]), Some(1));
        assert!(Dataset::from_f64(vec![], vec![4.0]).is_ok());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = Dataset::from_i16(vec![2, 3], vec![0; 5]).unwrap_err();
        assert_eq!(err.code(), codes::DATASET_SHAPE);
    }

    #[test]
    fn relabel_touches_only_first_element() {
        let ds = Dataset::from_f64(vec![2, 2], vec![0.0, 1.0, 2.0, 3.0])
            .unwrap()
            .with_first_scalar(17.0)
            .unwrap();
        assert_eq!(ds.to_f64_vec(), vec![17.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn relabel_rejects_narrow_and_empty() {
        let narrow = Dataset::from_i16(vec![1], vec![3]).unwrap();
        assert!(narrow.with_first_scalar(1.0).is_err());
        let empty = Dataset::from_f64(vec![0, 4], vec![]).unwrap();
        assert!(empty.with_first_scalar(1.0).is_err());
    }
}
