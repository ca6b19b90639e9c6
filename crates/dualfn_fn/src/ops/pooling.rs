use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{
    error::{Error, Result},
    Dense, Float, Shape,
};

struct PoolState {
    input: Shape,
    output: Shape,
    /// Flat input index of the maximum of each window, in output order.
    argmax: Vec<usize>,
}

/// Max pooling over non-overlapping `rows × cols` windows.
///
/// The windows partition the input, so its dimensions must be multiples of
/// the window; the output has `x.rows / rows × x.cols / cols` elements.
/// Within a window the first maximum in row-major order wins.
pub struct MaxPooling<T: Float> {
    x: OperandRef<T>,
    rows: usize,
    cols: usize,
    cache: Cached<PoolState>,
}

impl<T: Float> MaxPooling<T> {
    pub fn new(x: OperandRef<T>, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::configuration(
                "MaxPooling",
                format!("window must be non-empty, got {}x{}", rows, cols),
            ));
        }
        Ok(Self {
            x,
            rows,
            cols,
            cache: Cached::new(),
        })
    }
}

impl<T: Float> Function<T> for MaxPooling<T> {
    fn name(&self) -> &'static str {
        "MaxPooling"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        let _span = tracing::trace_span!("forward", op = "MaxPooling").entered();
        self.cache.reset();
        let x = self.x.value();
        let partitions = self.rows <= x.rows()
            && self.cols <= x.cols()
            && x.rows() % self.rows == 0
            && x.cols() % self.cols == 0;
        if !partitions {
            let err = Error::configuration(
                "MaxPooling",
                format!("window {}x{} does not partition input {}", self.rows, self.cols, x.shape()),
            );
            tracing::debug!(%err, "rejecting input");
            return Err(err);
        }

        let output = Shape::new(x.rows() / self.rows, x.cols() / self.cols);
        let data = x.data();
        let mut argmax = Vec::with_capacity(output.size());
        let mut y = Vec::with_capacity(output.size());
        for oi in 0..output.rows {
            for oj in 0..output.cols {
                let mut best = (oi * self.rows) * x.cols() + oj * self.cols;
                for i in oi * self.rows..(oi + 1) * self.rows {
                    for j in oj * self.cols..(oj + 1) * self.cols {
                        let k = i * x.cols() + j;
                        if data[k] > data[best] {
                            best = k;
                        }
                    }
                }
                argmax.push(best);
                y.push(data[best]);
            }
        }

        let y = Dense::new(output.rows, output.cols, y)?;
        self.cache.store(PoolState {
            input: x.shape(),
            output,
            argmax,
        });
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "MaxPooling").entered();
        let state = self.cache.get("MaxPooling")?;
        check_gy("MaxPooling", gy, state.output)?;
        if self.x.requires_grad() {
            let mut gx = Dense::zeros(state.input.rows, state.input.cols);
            let buf = gx.data_mut();
            for (&k, &g) in state.argmax.iter().zip(gy.data()) {
                buf[k] = buf[k] + g;
            }
            self.x.acc_grad(gx)?;
        }
        self.cache.consume();
        Ok(())
    }
}
