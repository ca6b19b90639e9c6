#![allow(dead_code)]

use dualfn_core::{
    dtype::DType,
    error::{Error, Result},
    Dense, Float,
};
use dualfn_fn::{Function, Operand, OperandRef, Variable};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

#[macro_export]
macro_rules! test_ops {
    ([$($op:ident),*$(,)?]) => {
        $(
            mod $op {
                use super::*;
                use paste::paste;

                paste! {
                    #[test]
                    fn f32() -> Result<()> {
                        test_functions::[<$op _test>]::<f32>()
                    }

                    #[test]
                    fn f64() -> Result<()> {
                        test_functions::[<$op _test>]::<f64>()
                    }
                }
            }
        )*
    };
}

// Helper functions
pub fn dense<T: Float>(rows: usize, cols: usize, data: &[f64]) -> Dense<T> {
    Dense::from_f64(rows, cols, data).expect("bad test matrix")
}

pub fn var<T: Float>(rows: usize, cols: usize, data: &[f64]) -> Arc<Variable<T>> {
    Variable::new(dense(rows, cols, data), true).into_ref()
}

pub fn constant<T: Float>(rows: usize, cols: usize, data: &[f64]) -> Arc<Variable<T>> {
    Variable::constant(dense(rows, cols, data)).into_ref()
}

pub fn scalar<T: Float>(value: f64, requires_grad: bool) -> Arc<Variable<T>> {
    Variable::scalar(T::cast(value), requires_grad).into_ref()
}

pub fn grad_of<T: Float>(x: &Variable<T>) -> Vec<f64> {
    x.grad()
        .expect("gradient lock")
        .expect("no gradient accumulated")
        .data()
        .iter()
        .map(|v| v.as_f64())
        .collect()
}

pub fn values<T: Float>(x: &Dense<T>) -> Vec<f64> {
    x.data().iter().map(|v| v.as_f64()).collect()
}

/// Default tolerance for values computed directly in `T`.
pub fn tolerance<T: Float>() -> f64 {
    match T::DTYPE {
        DType::F32 => 1e-5,
        DType::F64 => 1e-9,
    }
}

pub fn assert_close_tol(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "length differs: {:?} vs {:?}", actual, expected);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tol * (1.0 + e.abs()),
            "element {} differs: {} vs {} (actual {:?}, expected {:?})",
            i,
            a,
            e,
            actual,
            expected
        );
    }
}

pub fn assert_close<T: Float>(actual: &Dense<T>, expected: &[f64]) {
    assert_close_tol(&values(actual), expected, tolerance::<T>());
}

pub fn assert_grad<T: Float>(x: &Variable<T>, expected: &[f64]) {
    assert_close_tol(&grad_of(x), expected, tolerance::<T>());
}

/// An operand that records every `acc_grad` call.
pub struct Recorder<T> {
    value: Dense<T>,
    requires_grad: bool,
    calls: AtomicUsize,
    received: Mutex<Vec<Dense<T>>>,
}

impl<T: Float> Recorder<T> {
    pub fn new(value: Dense<T>, requires_grad: bool) -> Arc<Self> {
        Arc::new(Self {
            value,
            requires_grad,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Dense<T>> {
        self.received.lock().expect("recorder lock").clone()
    }
}

impl<T: Float> Operand<T> for Recorder<T> {
    fn value(&self) -> Dense<T> {
        self.value.clone()
    }

    fn acc_grad(&self, gx: Dense<T>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().map_err(|_| Error::GradLocked)?.push(gx);
        Ok(())
    }

    fn requires_grad(&self) -> bool {
        self.requires_grad
    }
}

/// An operand whose value can be replaced between passes.
pub struct Slot<T> {
    value: Mutex<Dense<T>>,
    inner: Arc<Variable<T>>,
}

impl<T: Float> Slot<T> {
    pub fn new(value: Dense<T>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value.clone()),
            inner: Variable::new(value, true).into_ref(),
        })
    }

    pub fn set(&self, value: Dense<T>) {
        *self.value.lock().expect("slot lock") = value;
    }

    pub fn grad(&self) -> Result<Option<Dense<T>>> {
        self.inner.grad()
    }
}

impl<T: Float> Operand<T> for Slot<T> {
    fn value(&self) -> Dense<T> {
        self.value.lock().expect("slot lock").clone()
    }

    fn acc_grad(&self, gx: Dense<T>) -> Result<()> {
        self.inner.acc_grad(gx)
    }

    fn requires_grad(&self) -> bool {
        true
    }
}

/// One input of a gradient check.
#[derive(Debug, Clone)]
pub struct Input {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
    pub requires_grad: bool,
}

pub fn input(rows: usize, cols: usize, data: &[f64]) -> Input {
    Input {
        rows,
        cols,
        data: data.to_vec(),
        requires_grad: true,
    }
}

pub fn fixed(rows: usize, cols: usize, data: &[f64]) -> Input {
    Input {
        requires_grad: false,
        ..input(rows, cols, data)
    }
}

fn build_variables<T: Float>(inputs: &[Input], nudge: Option<(usize, usize, f64)>) -> Vec<Arc<Variable<T>>> {
    inputs
        .iter()
        .enumerate()
        .map(|(n, inp)| {
            let mut data = inp.data.clone();
            if let Some((which, k, h)) = nudge {
                if which == n {
                    data[k] += h;
                }
            }
            Variable::new(dense(inp.rows, inp.cols, &data), inp.requires_grad).into_ref()
        })
        .collect()
}

fn as_operands<T: Float>(vars: &[Arc<Variable<T>>]) -> Vec<OperandRef<T>> {
    vars.iter().map(|v| v.clone() as OperandRef<T>).collect()
}

/// Weights of the scalar projection `L = Σ w ⊙ y` used by the checker.
fn loss_weights(n: usize) -> Vec<f64> {
    (0..n).map(|k| 1.3 + (0.7 * k as f64).sin()).collect()
}

fn loss<T: Float>(y: &Dense<T>) -> f64 {
    values(y).iter().zip(loss_weights(y.size())).map(|(a, w)| a * w).sum()
}

/// Compares `backward` against central differences of `L = Σ w ⊙ forward()`
/// for every element of every input that requires a gradient.
pub fn check_gradients<T, F>(inputs: &[Input], build: F) -> Result<()>
where
    T: Float,
    F: Fn(Vec<OperandRef<T>>) -> Box<dyn Function<T>>,
{
    let (h, tol) = match T::DTYPE {
        DType::F32 => (1e-2, 2e-2),
        DType::F64 => (1e-5, 1e-5),
    };

    let vars = build_variables::<T>(inputs, None);
    let mut f = build(as_operands(&vars));
    let y = f.forward()?;
    let gy = Dense::from_f64(y.rows(), y.cols(), &loss_weights(y.size()))?;
    f.backward(&gy)?;

    for (n, inp) in inputs.iter().enumerate() {
        if !inp.requires_grad {
            assert_eq!(vars[n].grad()?, None, "input {} must not receive a gradient", n);
            continue;
        }
        let analytic = grad_of(&vars[n]);
        let mut numeric = Vec::with_capacity(inp.data.len());
        for k in 0..inp.data.len() {
            let plus = build(as_operands(&build_variables::<T>(inputs, Some((n, k, h))))).forward()?;
            let minus = build(as_operands(&build_variables::<T>(inputs, Some((n, k, -h))))).forward()?;
            numeric.push((loss(&plus) - loss(&minus)) / (2.0 * h));
        }
        assert_close_tol(&analytic, &numeric, tol);
    }
    Ok(())
}
