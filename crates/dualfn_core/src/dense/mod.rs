//! Dense row-major matrices, the tensor primitive every operator works on.

mod layout;
mod ops;

use crate::{
    dtype::Float,
    error::{Error, Result},
    shape::Shape,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `rows × cols` matrix stored row-major in a contiguous buffer.
///
/// Vectors are matrices with a single column (or row); scalars are `1×1`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "DenseRepr<T>", into = "DenseRepr<T>", bound(serialize = "T: Serialize + Clone", deserialize = "T: Deserialize<'de>"))
)]
pub struct Dense<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Float> Dense<T> {
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::invalid_shape(
                "Dense::new",
                format!("[{}x{}] requires {} elements, got {}", rows, cols, rows * cols, data.len()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::full(rows, cols, T::zero())
    }

    pub fn zeros_like(other: &Self) -> Self {
        Self::zeros(other.rows, other.cols)
    }

    pub fn full(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn scalar(value: T) -> Self {
        Self {
            rows: 1,
            cols: 1,
            data: vec![value],
        }
    }

    /// A column vector.
    pub fn vector(data: Vec<T>) -> Self {
        Self {
            rows: data.len(),
            cols: 1,
            data,
        }
    }

    pub fn row_vector(data: Vec<T>) -> Self {
        Self {
            rows: 1,
            cols: data.len(),
            data,
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut func: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(func(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Builds a matrix from `f64` literals, converting to `T`.
    pub fn from_f64(rows: usize, cols: usize, data: &[f64]) -> Result<Self> {
        Self::new(rows, cols, data.iter().map(|&x| T::cast(x)).collect())
    }

    // shape

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape().is_scalar()
    }

    pub fn is_vector(&self) -> bool {
        self.shape().is_vector()
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Fails with `ShapeMismatch` unless `other` has exactly this shape.
    pub fn check_same_shape(&self, op: &'static str, other: &Self) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(Error::shape_mismatch(op, self.shape(), other.shape()))
        }
    }

    /// Fails with `ShapeMismatch` unless this is a `1×1` matrix.
    pub fn check_scalar(&self, op: &'static str) -> Result<()> {
        if self.is_scalar() {
            Ok(())
        } else {
            Err(Error::shape_mismatch(op, Shape::SCALAR, self.shape()))
        }
    }

    // data

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn at(&self, i: usize, j: usize) -> Result<T> {
        self.check_index("Dense::at", i, j)?;
        Ok(self.data[i * self.cols + j])
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        self.check_index("Dense::set", i, j)?;
        self.data[i * self.cols + j] = value;
        Ok(())
    }

    /// Element `i` of the row-major buffer.
    pub fn at_flat(&self, i: usize) -> Result<T> {
        self.data.get(i).copied().ok_or(Error::IndexOutOfBounds {
            op: "Dense::at_flat",
            index: i,
            size: self.data.len(),
        })
    }

    /// The value of a `1×1` matrix.
    pub fn scalar_value(&self) -> Result<T> {
        self.check_scalar("Dense::scalar_value")?;
        Ok(self.data[0])
    }

    fn check_index(&self, op: &'static str, i: usize, j: usize) -> Result<()> {
        if i >= self.rows {
            return Err(Error::IndexOutOfBounds { op, index: i, size: self.rows });
        }
        if j >= self.cols {
            return Err(Error::IndexOutOfBounds { op, index: j, size: self.cols });
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct DenseRepr<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

#[cfg(feature = "serde")]
impl<T> TryFrom<DenseRepr<T>> for Dense<T> {
    type Error = Error;

    fn try_from(repr: DenseRepr<T>) -> Result<Self> {
        if repr.data.len() != repr.rows * repr.cols {
            return Err(Error::invalid_shape(
                "Dense::deserialize",
                format!("[{}x{}] requires {} elements, got {}", repr.rows, repr.cols, repr.rows * repr.cols, repr.data.len()),
            ));
        }
        Ok(Self {
            rows: repr.rows,
            cols: repr.cols,
            data: repr.data,
        })
    }
}

#[cfg(feature = "serde")]
impl<T> From<Dense<T>> for DenseRepr<T> {
    fn from(dense: Dense<T>) -> Self {
        Self {
            rows: dense.rows,
            cols: dense.cols,
            data: dense.data,
        }
    }
}
