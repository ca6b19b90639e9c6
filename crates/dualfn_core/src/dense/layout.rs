use super::Dense;
use crate::{
    dtype::Float,
    error::{Error, Result},
    shape::Shape,
};

impl<T: Float> Dense<T> {
    /// Same buffer, new dimensions.
    pub fn reshape(&self, rows: usize, cols: usize) -> Result<Self> {
        if rows * cols != self.size() {
            return Err(Error::invalid_shape(
                "Dense::reshape",
                format!("cannot reshape {} into [{}x{}]", self.shape(), rows, cols),
            ));
        }
        Ok(Self {
            rows,
            cols,
            data: self.data.clone(),
        })
    }

    /// The row-major buffer as a column vector.
    pub fn flatten(&self) -> Self {
        Self::vector(self.data.clone())
    }

    /// The block `[from_row, to_row) × [from_col, to_col)`.
    pub fn slice(&self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> Result<Self> {
        self.check_block("Dense::slice", from_row, from_col, to_row, to_col)?;
        let cols = to_col - from_col;
        let mut data = Vec::with_capacity((to_row - from_row) * cols);
        for i in from_row..to_row {
            let start = i * self.cols + from_col;
            data.extend_from_slice(&self.data[start..start + cols]);
        }
        Ok(Self {
            rows: to_row - from_row,
            cols,
            data,
        })
    }

    /// Copies `block` into this matrix with its top-left corner at `(from_row, from_col)`.
    pub fn set_slice(&mut self, from_row: usize, from_col: usize, block: &Self) -> Result<()> {
        let (to_row, to_col) = (from_row + block.rows, from_col + block.cols);
        self.check_block("Dense::set_slice", from_row, from_col, to_row, to_col)?;
        for (bi, i) in (from_row..to_row).enumerate() {
            let start = i * self.cols + from_col;
            self.data[start..start + block.cols].copy_from_slice(&block.data[bi * block.cols..(bi + 1) * block.cols]);
        }
        Ok(())
    }

    /// Row `i` as a `1×cols` row vector.
    pub fn row(&self, i: usize) -> Result<Self> {
        if i >= self.rows {
            return Err(Error::IndexOutOfBounds {
                op: "Dense::row",
                index: i,
                size: self.rows,
            });
        }
        Ok(Self::row_vector(self.data[i * self.cols..(i + 1) * self.cols].to_vec()))
    }

    /// Column `j` as a `rows×1` column vector.
    pub fn col(&self, j: usize) -> Result<Self> {
        if j >= self.cols {
            return Err(Error::IndexOutOfBounds {
                op: "Dense::col",
                index: j,
                size: self.cols,
            });
        }
        Ok(Self::vector((0..self.rows).map(|i| self.data[i * self.cols + j]).collect()))
    }

    /// Overwrites row `i` with the elements of a vector of length `cols`.
    pub fn set_row(&mut self, i: usize, values: &Self) -> Result<()> {
        if i >= self.rows {
            return Err(Error::IndexOutOfBounds {
                op: "Dense::set_row",
                index: i,
                size: self.rows,
            });
        }
        if !values.is_vector() || values.size() != self.cols {
            return Err(Error::shape_mismatch("Dense::set_row", Shape::new(1, self.cols), values.shape()));
        }
        self.data[i * self.cols..(i + 1) * self.cols].copy_from_slice(&values.data);
        Ok(())
    }

    /// Overwrites column `j` with the elements of a vector of length `rows`.
    pub fn set_col(&mut self, j: usize, values: &Self) -> Result<()> {
        if j >= self.cols {
            return Err(Error::IndexOutOfBounds {
                op: "Dense::set_col",
                index: j,
                size: self.cols,
            });
        }
        if !values.is_vector() || values.size() != self.rows {
            return Err(Error::shape_mismatch("Dense::set_col", Shape::new(self.rows, 1), values.shape()));
        }
        for (i, &v) in values.data.iter().enumerate() {
            self.data[i * self.cols + j] = v;
        }
        Ok(())
    }

    /// Concatenates the flattened buffers of `items` into one column vector.
    pub fn concat_vectors(items: &[&Self]) -> Self {
        let mut data = Vec::with_capacity(items.iter().map(|m| m.size()).sum());
        for m in items {
            data.extend_from_slice(&m.data);
        }
        Self::vector(data)
    }

    /// Stacks equally sized vectors as the rows of a new matrix.
    pub fn stack_rows(items: &[&Self]) -> Result<Self> {
        let Some(first) = items.first() else {
            return Ok(Self::zeros(0, 0));
        };
        let cols = first.size();
        let mut data = Vec::with_capacity(items.len() * cols);
        for m in items {
            if !m.is_vector() || m.size() != cols {
                return Err(Error::shape_mismatch("Dense::stack_rows", Shape::new(cols, 1), m.shape()));
            }
            data.extend_from_slice(&m.data);
        }
        Ok(Self {
            rows: items.len(),
            cols,
            data,
        })
    }

    /// This matrix followed by one new row per vector in `items`.
    pub fn append_rows(&self, items: &[&Self]) -> Result<Self> {
        let mut data = Vec::with_capacity(self.size() + items.len() * self.cols);
        data.extend_from_slice(&self.data);
        for m in items {
            if !m.is_vector() || m.size() != self.cols {
                return Err(Error::shape_mismatch("Dense::append_rows", Shape::new(1, self.cols), m.shape()));
            }
            data.extend_from_slice(&m.data);
        }
        Ok(Self {
            rows: self.rows + items.len(),
            cols: self.cols,
            data,
        })
    }

    /// Circular right shift of the row-major buffer by `places`.
    pub fn rotate_right(&self, places: usize) -> Self {
        let mut data = self.data.clone();
        if !data.is_empty() {
            data.rotate_right(places % self.data.len());
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    /// Circular left shift of the row-major buffer by `places`.
    pub fn rotate_left(&self, places: usize) -> Self {
        let mut data = self.data.clone();
        if !data.is_empty() {
            data.rotate_left(places % self.data.len());
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    fn check_block(&self, op: &'static str, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> Result<()> {
        if from_row > to_row || to_row > self.rows {
            return Err(Error::IndexOutOfBounds {
                op,
                index: to_row.max(from_row),
                size: self.rows,
            });
        }
        if from_col > to_col || to_col > self.cols {
            return Err(Error::IndexOutOfBounds {
                op,
                index: to_col.max(from_col),
                size: self.cols,
            });
        }
        Ok(())
    }
}
