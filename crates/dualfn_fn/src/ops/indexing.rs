//! Element, row, column and block selection.
//!
//! Backward scatters the upstream gradient into a zero matrix of the input's
//! shape at the coordinates forward read from.

use crate::{
    function::{check_gy, check_scalar_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{
    error::{Error, Result},
    Dense, Float, Shape,
};

fn check_range(op: &'static str, what: &str, index: usize, size: usize) -> Result<()> {
    if index < size {
        Ok(())
    } else {
        let err = Error::configuration(op, format!("{} {} out of range for size {}", what, index, size));
        tracing::debug!(%err, "rejecting forward");
        Err(err)
    }
}

/// The element at `(i, j)` as a `1×1` matrix.
pub struct At<T: Float> {
    x: OperandRef<T>,
    i: usize,
    j: usize,
    cache: Cached<Shape>,
}

impl<T: Float> At<T> {
    pub fn new(x: OperandRef<T>, i: usize, j: usize) -> Self {
        Self {
            x,
            i,
            j,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for At<T> {
    fn name(&self) -> &'static str {
        "At"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        check_range("At", "row", self.i, x.rows())?;
        check_range("At", "column", self.j, x.cols())?;
        let y = Dense::scalar(x.at(self.i, self.j)?);
        self.cache.store(x.shape());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "At").entered();
        let shape = *self.cache.get("At")?;
        let g = check_scalar_gy("At", gy)?;
        if self.x.requires_grad() {
            let mut gx = Dense::zeros(shape.rows, shape.cols);
            gx.set(self.i, self.j, g)?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// Row `i` as a `1×cols` row vector.
pub struct RowView<T: Float> {
    x: OperandRef<T>,
    i: usize,
    cache: Cached<Shape>,
}

impl<T: Float> RowView<T> {
    pub fn new(x: OperandRef<T>, i: usize) -> Self {
        Self {
            x,
            i,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for RowView<T> {
    fn name(&self) -> &'static str {
        "RowView"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        check_range("RowView", "row", self.i, x.rows())?;
        let y = x.row(self.i)?;
        self.cache.store(x.shape());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "RowView").entered();
        let shape = *self.cache.get("RowView")?;
        check_gy("RowView", gy, Shape::new(1, shape.cols))?;
        if self.x.requires_grad() {
            let mut gx = Dense::zeros(shape.rows, shape.cols);
            gx.set_row(self.i, gy)?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// Column `j` as a `rows×1` column vector.
pub struct ColView<T: Float> {
    x: OperandRef<T>,
    j: usize,
    cache: Cached<Shape>,
}

impl<T: Float> ColView<T> {
    pub fn new(x: OperandRef<T>, j: usize) -> Self {
        Self {
            x,
            j,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for ColView<T> {
    fn name(&self) -> &'static str {
        "ColView"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        check_range("ColView", "column", self.j, x.cols())?;
        let y = x.col(self.j)?;
        self.cache.store(x.shape());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "ColView").entered();
        let shape = *self.cache.get("ColView")?;
        check_gy("ColView", gy, Shape::new(shape.rows, 1))?;
        if self.x.requires_grad() {
            let mut gx = Dense::zeros(shape.rows, shape.cols);
            gx.set_col(self.j, gy)?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// The block `[from_row, to_row) × [from_col, to_col)`.
pub struct Slice<T: Float> {
    x: OperandRef<T>,
    from_row: usize,
    from_col: usize,
    to_row: usize,
    to_col: usize,
    cache: Cached<Shape>,
}

impl<T: Float> Slice<T> {
    pub fn new(x: OperandRef<T>, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> Self {
        Self {
            x,
            from_row,
            from_col,
            to_row,
            to_col,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for Slice<T> {
    fn name(&self) -> &'static str {
        "Slice"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        if self.from_row > self.to_row || self.from_col > self.to_col {
            return Err(Error::configuration(
                "Slice",
                format!(
                    "inverted range [{}, {}) x [{}, {})",
                    self.from_row, self.to_row, self.from_col, self.to_col
                ),
            ));
        }
        check_range("Slice", "row end", self.to_row, x.rows() + 1)?;
        check_range("Slice", "column end", self.to_col, x.cols() + 1)?;
        let y = x.slice(self.from_row, self.from_col, self.to_row, self.to_col)?;
        self.cache.store(x.shape());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Slice").entered();
        let shape = *self.cache.get("Slice")?;
        check_gy(
            "Slice",
            gy,
            Shape::new(self.to_row - self.from_row, self.to_col - self.from_col),
        )?;
        if self.x.requires_grad() {
            let mut gx = Dense::zeros(shape.rows, shape.cols);
            gx.set_slice(self.from_row, self.from_col, gy)?;
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}
