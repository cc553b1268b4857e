//! Conversion between the wide and narrow element representations.
//!
//! One raw trace yields both a wide header and a narrow data array, so both
//! encodings go through [`encode`].

use crate::dataset::{ArrayData, Dataset, ElementType};

/// Narrows a wide element to the detector-data representation.
///
/// Truncates toward zero, saturates at the `i16` bounds and maps NaN to zero,
/// matching the HDF5 hard conversion from double to short.
pub fn narrow_to_i16(value: f64) -> i16 {
    value as i16
}

/// Re-encodes a dataset with the requested element type, keeping its shape.
pub fn encode(dataset: &Dataset, target: ElementType) -> Dataset {
    let shape = dataset.shape().to_vec();
    let data = match (dataset.data(), target) {
        (ArrayData::Float64(values), ElementType::Float64) => ArrayData::Float64(values.clone()),
        (ArrayData::Int16(values), ElementType::Int16) => ArrayData::Int16(values.clone()),
        (ArrayData::Int16(values), ElementType::Float64) => {
            ArrayData::Float64(values.iter().map(|&v| f64::from(v)).collect())
        }
        (ArrayData::Float64(values), ElementType::Int16) => {
            ArrayData::Int16(values.iter().copied().map(narrow_to_i16).collect())
        }
    };
    Dataset::from_parts_unchecked(shape, data)
}
