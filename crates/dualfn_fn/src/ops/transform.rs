//! Layout changes: reshaping, joining and rotating.
//!
//! Joining functions record each operand's shape in forward so backward can
//! split the upstream gradient back into differently sized pieces.

use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{
    error::{Error, Result},
    Dense, Float, Shape,
};

fn accumulate_pieces<T: Float>(xs: &[OperandRef<T>], pieces: Vec<Dense<T>>) -> Result<()> {
    for (x, piece) in xs.iter().zip(pieces) {
        x.acc_grad(piece)?;
    }
    Ok(())
}

pub struct Reshape<T: Float> {
    x: OperandRef<T>,
    rows: usize,
    cols: usize,
    cache: Cached<Shape>,
}

impl<T: Float> Reshape<T> {
    pub fn new(x: OperandRef<T>, rows: usize, cols: usize) -> Self {
        Self {
            x,
            rows,
            cols,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for Reshape<T> {
    fn name(&self) -> &'static str {
        "Reshape"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        if self.rows * self.cols != x.size() {
            return Err(Error::invalid_shape(
                "Reshape",
                format!("cannot reshape {} into {}", x.shape(), Shape::new(self.rows, self.cols)),
            ));
        }
        let y = x.reshape(self.rows, self.cols)?;
        self.cache.store(x.shape());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Reshape").entered();
        let shape = *self.cache.get("Reshape")?;
        check_gy("Reshape", gy, Shape::new(self.rows, self.cols))?;
        if self.x.requires_grad() {
            self.x.acc_grad(gy.reshape(shape.rows, shape.cols)?)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// The row-major elements of `x` as a column vector.
pub struct Flatten<T: Float> {
    x: OperandRef<T>,
    cache: Cached<Shape>,
}

impl<T: Float> Flatten<T> {
    pub fn new(x: OperandRef<T>) -> Self {
        Self { x, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for Flatten<T> {
    fn name(&self) -> &'static str {
        "Flatten"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        self.cache.store(x.shape());
        Ok(x.flatten())
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Flatten").entered();
        let shape = *self.cache.get("Flatten")?;
        check_gy("Flatten", gy, Shape::new(shape.size(), 1))?;
        if self.x.requires_grad() {
            self.x.acc_grad(gy.reshape(shape.rows, shape.cols)?)?;
        }
        self.cache.consume();
        Ok(())
    }
}

/// The flattened operands joined end to end into one column vector.
pub struct Concat<T: Float> {
    xs: Vec<OperandRef<T>>,
    cache: Cached<Vec<Shape>>,
}

impl<T: Float> Concat<T> {
    pub fn new(xs: Vec<OperandRef<T>>) -> Self {
        Self { xs, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for Concat<T> {
    fn name(&self) -> &'static str {
        "Concat"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        self.xs.clone()
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let values: Vec<Dense<T>> = self.xs.iter().map(|x| x.value()).collect();
        let y = Dense::concat_vectors(&values.iter().collect::<Vec<_>>());
        self.cache.store(values.iter().map(|v| v.shape()).collect());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Concat", operands = self.xs.len()).entered();
        let shapes = self.cache.get("Concat")?;
        let total = shapes.iter().map(|s| s.size()).sum();
        check_gy("Concat", gy, Shape::new(total, 1))?;

        let mut pieces = Vec::with_capacity(self.xs.len());
        let mut offset = 0;
        for (x, shape) in self.xs.iter().zip(shapes) {
            let end = offset + shape.size();
            if x.requires_grad() {
                pieces.push((x, Dense::new(shape.rows, shape.cols, gy.data()[offset..end].to_vec())?));
            }
            offset = end;
        }
        for (x, piece) in pieces {
            x.acc_grad(piece)?;
        }

        self.cache.consume();
        Ok(())
    }
}

/// Equally sized vectors stacked as the rows of a matrix.
pub struct Stack<T: Float> {
    xs: Vec<OperandRef<T>>,
    cache: Cached<Vec<Shape>>,
}

impl<T: Float> Stack<T> {
    pub fn new(xs: Vec<OperandRef<T>>) -> Self {
        Self { xs, cache: Cached::new() }
    }
}

impl<T: Float> Function<T> for Stack<T> {
    fn name(&self) -> &'static str {
        "Stack"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        self.xs.clone()
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let values: Vec<Dense<T>> = self.xs.iter().map(|x| x.value()).collect();
        if let Some(first) = values.first() {
            for v in &values {
                if !v.is_vector() || v.size() != first.size() {
                    return Err(Error::shape_mismatch("Stack", first.shape(), v.shape()));
                }
            }
        }
        let y = Dense::stack_rows(&values.iter().collect::<Vec<_>>())?;
        self.cache.store(values.iter().map(|v| v.shape()).collect());
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Stack", operands = self.xs.len()).entered();
        let shapes = self.cache.get("Stack")?;
        let cols = shapes.first().map_or(0, |s| s.size());
        check_gy("Stack", gy, Shape::new(shapes.len(), cols))?;

        let mut pieces = Vec::with_capacity(self.xs.len());
        let mut grads = Vec::with_capacity(self.xs.len());
        for (i, (x, shape)) in self.xs.iter().zip(shapes).enumerate() {
            if x.requires_grad() {
                pieces.push(x.clone());
                grads.push(gy.row(i)?.reshape(shape.rows, shape.cols)?);
            }
        }
        accumulate_pieces(&pieces, grads)?;

        self.cache.consume();
        Ok(())
    }
}

/// `x` with one extra row per vector in `rows`.
pub struct AppendRows<T: Float> {
    x: OperandRef<T>,
    rows: Vec<OperandRef<T>>,
    cache: Cached<(Shape, Vec<Shape>)>,
}

impl<T: Float> AppendRows<T> {
    pub fn new(x: OperandRef<T>, rows: Vec<OperandRef<T>>) -> Self {
        Self {
            x,
            rows,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for AppendRows<T> {
    fn name(&self) -> &'static str {
        "AppendRows"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        let mut operands = vec![self.x.clone()];
        operands.extend(self.rows.iter().cloned());
        operands
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        let rows: Vec<Dense<T>> = self.rows.iter().map(|r| r.value()).collect();
        for r in &rows {
            if !r.is_vector() || r.size() != x.cols() {
                return Err(Error::shape_mismatch("AppendRows", Shape::new(1, x.cols()), r.shape()));
            }
        }
        let y = x.append_rows(&rows.iter().collect::<Vec<_>>())?;
        self.cache.store((x.shape(), rows.iter().map(|r| r.shape()).collect()));
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "AppendRows").entered();
        let (shape, row_shapes) = self.cache.get("AppendRows")?;
        check_gy("AppendRows", gy, Shape::new(shape.rows + row_shapes.len(), shape.cols))?;

        let gx = if self.x.requires_grad() {
            Some(gy.slice(0, 0, shape.rows, shape.cols)?)
        } else {
            None
        };
        let mut pieces = Vec::with_capacity(self.rows.len());
        let mut grads = Vec::with_capacity(self.rows.len());
        for (i, (r, row_shape)) in self.rows.iter().zip(row_shapes).enumerate() {
            if r.requires_grad() {
                pieces.push(r.clone());
                grads.push(gy.row(shape.rows + i)?.reshape(row_shape.rows, row_shape.cols)?);
            }
        }

        if let Some(gx) = gx {
            self.x.acc_grad(gx)?;
        }
        accumulate_pieces(&pieces, grads)?;

        self.cache.consume();
        Ok(())
    }
}

/// Circular right shift of the row-major buffer.
pub struct RotateR<T: Float> {
    x: OperandRef<T>,
    places: usize,
    cache: Cached<Shape>,
}

impl<T: Float> RotateR<T> {
    pub fn new(x: OperandRef<T>, places: usize) -> Self {
        Self {
            x,
            places,
            cache: Cached::new(),
        }
    }
}

impl<T: Float> Function<T> for RotateR<T> {
    fn name(&self) -> &'static str {
        "RotateR"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        self.cache.reset();
        let x = self.x.value();
        self.cache.store(x.shape());
        Ok(x.rotate_right(self.places))
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "RotateR").entered();
        let shape = *self.cache.get("RotateR")?;
        check_gy("RotateR", gy, shape)?;
        if self.x.requires_grad() {
            self.x.acc_grad(gy.rotate_left(self.places))?;
        }
        self.cache.consume();
        Ok(())
    }
}
