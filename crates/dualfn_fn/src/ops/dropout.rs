use crate::{
    function::{check_gy, Cached, Function},
    operand::OperandRef,
};
use dualfn_core::{
    error::{Error, Result},
    Dense, Float,
};
use rand::{distributions::Distribution, RngCore};
use rand_distr::Bernoulli;

/// Inverted dropout: each element is zeroed with probability `p` and the
/// survivors are scaled by `1 / (1 - p)`.
///
/// The mask drawn in forward is kept for backward, so the gradient sees
/// exactly the same elements dropped.
pub struct Dropout<T: Float, R> {
    x: OperandRef<T>,
    p: f64,
    rng: R,
    cache: Cached<Dense<T>>,
}

impl<T: Float, R: RngCore + Send> Dropout<T, R> {
    pub fn new(x: OperandRef<T>, p: f64, rng: R) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::configuration(
                "Dropout",
                format!("probability must lie in [0, 1], got {}", p),
            ));
        }
        Ok(Self {
            x,
            p,
            rng,
            cache: Cached::new(),
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    fn draw_mask(&mut self, rows: usize, cols: usize) -> Result<Dense<T>> {
        if self.p >= 1.0 {
            return Ok(Dense::zeros(rows, cols));
        }
        let keep = Bernoulli::new(1.0 - self.p).map_err(|e| Error::configuration("Dropout", e.to_string()))?;
        let scale = T::cast(1.0 / (1.0 - self.p));
        let rng = &mut self.rng;
        Ok(Dense::from_fn(rows, cols, |_, _| {
            if keep.sample(rng) {
                scale
            } else {
                T::zero()
            }
        }))
    }
}

impl<T: Float, R: RngCore + Send> Function<T> for Dropout<T, R> {
    fn name(&self) -> &'static str {
        "Dropout"
    }

    fn operands(&self) -> Vec<OperandRef<T>> {
        vec![self.x.clone()]
    }

    fn forward(&mut self) -> Result<Dense<T>> {
        let _span = tracing::trace_span!("forward", op = "Dropout", p = self.p).entered();
        self.cache.reset();
        let x = self.x.value();
        let mask = self.draw_mask(x.rows(), x.cols())?;
        let y = x.prod(&mask)?;
        self.cache.store(mask);
        Ok(y)
    }

    fn backward(&mut self, gy: &Dense<T>) -> Result<()> {
        let _span = tracing::trace_span!("backward", op = "Dropout").entered();
        let mask = self.cache.get("Dropout")?;
        check_gy("Dropout", gy, mask.shape())?;
        if self.x.requires_grad() {
            self.x.acc_grad(gy.prod(mask)?)?;
        }
        self.cache.consume();
        Ok(())
    }
}
