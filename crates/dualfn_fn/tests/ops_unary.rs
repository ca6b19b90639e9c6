mod utils;

use dualfn_core::{
    error::{Error, Result},
    Float, Shape,
};
use dualfn_fn::{
    math::LOG_ZERO_DERIV,
    ops::{
        Abs, Cos, Exp, HardSigmoid, HardTanh, Identity, LeakyReLU, Log, Mish, Neg, Pow, ReLU, Reciprocal, Sigmoid,
        Sin, Softplus, Softsign, SoftShrink, Sqrt, Square, Swish, SwishB, Tan, Tanh, Threshold, CELU, ELU, GELU,
        SELU,
    },
    Function, OperandRef,
};
use utils::*;

test_ops!([
    forward_values,
    smooth,
    piecewise,
    elementary,
    parameterized,
    parameter_gradients,
    parameter_shape,
    log_domain,
    pow,
    mish_large_inputs,
    zero_parameters,
    failed_forward_clears_state
]);

/// Kept at least 0.1 away from every kink of the piecewise activations.
const X: [f64; 6] = [-1.7, -0.6, 0.35, 0.9, 1.8, 2.2];
const POSITIVE: [f64; 4] = [0.4, 0.9, 1.6, 2.7];

fn check_unary<T, F>(data: &[f64], build: F) -> Result<()>
where
    T: Float,
    F: Fn(OperandRef<T>) -> Box<dyn Function<T>>,
{
    check_gradients::<T, _>(&[input(1, data.len(), data)], |x| build(x[0].clone()))
}

mod test_functions {
    use super::*;

    pub fn forward_values_test<T: Float>() -> Result<()> {
        let x = var::<T>(1, 3, &[-2.0, 0.0, 3.0]);

        assert_close(&Sigmoid::new(x.clone()).forward()?, &[0.11920292202211755, 0.5, 0.9525741268224334]);
        assert_close(&ReLU::new(x.clone()).forward()?, &[0.0, 0.0, 3.0]);
        assert_close(&HardTanh::new(x.clone()).forward()?, &[-1.0, 0.0, 1.0]);
        assert_close(&HardSigmoid::new(x.clone()).forward()?, &[0.1, 0.5, 1.0]);
        assert_close(&Abs::new(x.clone()).forward()?, &[2.0, 0.0, 3.0]);
        assert_close(&Neg::new(x.clone()).forward()?, &[2.0, 0.0, -3.0]);
        assert_close(&Square::new(x.clone()).forward()?, &[4.0, 0.0, 9.0]);
        assert_close(&Identity::new(x.clone()).forward()?, &[-2.0, 0.0, 3.0]);

        let alpha = scalar::<T>(0.1, false);
        assert_close(&LeakyReLU::new(x.clone(), alpha).forward()?, &[-0.2, 0.0, 3.0]);

        let threshold = scalar::<T>(0.5, false);
        let k = scalar::<T>(-7.0, false);
        assert_close(&Threshold::new(x.clone(), threshold, k).forward()?, &[-7.0, -7.0, 3.0]);

        let lambda = scalar::<T>(1.0, false);
        assert_close(&SoftShrink::new(x, lambda).forward()?, &[-1.0, 0.0, 2.0]);
        Ok(())
    }

    pub fn smooth_test<T: Float>() -> Result<()> {
        check_unary::<T, _>(&X, |x| Box::new(Sigmoid::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Tanh::new(x)))?;
        check_unary::<T, _>(&[-0.9, -0.3, 0.2, 0.7], |x| Box::new(Tan::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Softsign::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Mish::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(GELU::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Swish::new(x)))
    }

    pub fn piecewise_test<T: Float>() -> Result<()> {
        check_unary::<T, _>(&X, |x| Box::new(ReLU::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(HardSigmoid::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(HardTanh::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Abs::new(x)))
    }

    pub fn elementary_test<T: Float>() -> Result<()> {
        check_unary::<T, _>(&X, |x| Box::new(Sin::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Cos::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Neg::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Exp::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Identity::new(x)))?;
        check_unary::<T, _>(&X, |x| Box::new(Square::new(x)))?;
        check_unary::<T, _>(&POSITIVE, |x| Box::new(Reciprocal::new(x)))?;
        check_unary::<T, _>(&POSITIVE, |x| Box::new(Log::new(x)))?;
        check_unary::<T, _>(&POSITIVE, |x| Box::new(Sqrt::new(x)))
    }

    pub fn parameterized_test<T: Float>() -> Result<()> {
        check_gradients::<T, _>(&[input(2, 3, &X), fixed(1, 1, &[1.3])], |x| {
            Box::new(CELU::new(x[0].clone(), x[1].clone()))
        })?;
        check_gradients::<T, _>(&[input(2, 3, &X), fixed(1, 1, &[1.67]), fixed(1, 1, &[1.05])], |x| {
            Box::new(SELU::new(x[0].clone(), x[1].clone(), x[2].clone()))
        })?;
        check_gradients::<T, _>(&[input(2, 3, &X), fixed(1, 1, &[2.0]), fixed(1, 1, &[20.0])], |x| {
            Box::new(Softplus::new(x[0].clone(), x[1].clone(), x[2].clone()))
        })?;
        check_gradients::<T, _>(&[input(2, 3, &X), fixed(1, 1, &[0.5])], |x| {
            Box::new(SoftShrink::new(x[0].clone(), x[1].clone()))
        })
    }

    pub fn parameter_gradients_test<T: Float>() -> Result<()> {
        check_gradients::<T, _>(&[input(2, 3, &X), input(1, 1, &[0.1])], |x| {
            Box::new(LeakyReLU::new(x[0].clone(), x[1].clone()))
        })?;
        check_gradients::<T, _>(&[input(2, 3, &X), input(1, 1, &[0.7])], |x| {
            Box::new(ELU::new(x[0].clone(), x[1].clone()))
        })?;
        check_gradients::<T, _>(&[input(2, 3, &X), fixed(1, 1, &[0.5]), input(1, 1, &[-0.3])], |x| {
            Box::new(Threshold::new(x[0].clone(), x[1].clone(), x[2].clone()))
        })?;
        check_gradients::<T, _>(&[input(2, 3, &X), input(1, 1, &[0.6])], |x| {
            Box::new(SwishB::new(x[0].clone(), x[1].clone()))
        })?;

        // Threshold's k collects one unit of gradient per element at or below the threshold
        let x = var::<T>(1, 4, &[0.1, 0.9, -2.0, 0.4]);
        let threshold = scalar::<T>(0.5, true);
        let k = scalar::<T>(0.0, true);
        let mut f = Threshold::new(x.clone(), threshold.clone(), k.clone());
        f.forward()?;
        f.backward(&dense(1, 4, &[1.0, 1.0, 2.0, 0.5]))?;
        assert_grad(&x, &[0.0, 1.0, 0.0, 0.0]);
        assert_grad(&k, &[3.5]);
        assert_eq!(threshold.grad()?, None);
        Ok(())
    }

    pub fn parameter_shape_test<T: Float>() -> Result<()> {
        let x = var::<T>(1, 2, &[1.0, -1.0]);
        let alpha = var::<T>(1, 2, &[0.5, 0.5]);
        let mut f = ELU::new(x, alpha);
        assert_eq!(
            f.forward().unwrap_err(),
            Error::shape_mismatch("ELU", Shape::SCALAR, Shape::new(1, 2))
        );
        assert_eq!(f.name(), "ELU");
        assert_eq!(f.operands().len(), 2);
        Ok(())
    }

    pub fn log_domain_test<T: Float>() -> Result<()> {
        let negative = var::<T>(1, 2, &[1.0, -0.5]);
        let err = Log::new(negative.clone()).forward().unwrap_err();
        assert!(matches!(err, Error::Domain { op: "Log", .. }), "{}", err);

        let x = var::<T>(1, 2, &[0.0, 4.0]);
        let mut f = Log::new(x.clone());
        f.forward()?;
        f.backward(&dense(1, 2, &[2.0, 2.0]))?;
        assert_grad(&x, &[2.0 * LOG_ZERO_DERIV, 0.5]);
        Ok(())
    }

    pub fn pow_test<T: Float>() -> Result<()> {
        let x = var::<T>(1, 2, &[2.0, 3.0]);
        let mut f = Pow::new(x.clone(), T::cast(3.0));
        assert_close(&f.forward()?, &[8.0, 27.0]);
        f.backward(&dense(1, 2, &[1.0, 0.5]))?;
        assert_grad(&x, &[12.0, 13.5]);

        check_unary::<T, _>(&POSITIVE, |x| Box::new(Pow::new(x, T::cast(1.5))))
    }

    pub fn mish_large_inputs_test<T: Float>() -> Result<()> {
        let x = var::<T>(1, 5, &[25.0, 50.0, 1000.0, -30.0, -1000.0]);
        let mut f = Mish::new(x.clone());
        let y = f.forward()?;
        assert!(values(&y).iter().all(|v| v.is_finite()), "{:?}", values(&y));
        assert_close_tol(&values(&y), &[25.0, 50.0, 1000.0, 0.0, 0.0], 1e-6);

        f.backward(&dense(1, 5, &[1.0; 5]))?;
        let g = grad_of(&x);
        assert!(g.iter().all(|v| v.is_finite()), "{:?}", g);
        assert_close_tol(&g, &[1.0, 1.0, 1.0, 0.0, 0.0], 1e-6);
        Ok(())
    }

    pub fn zero_parameters_test<T: Float>() -> Result<()> {
        let x = var::<T>(1, 3, &[-1.0, 0.5, 2.0]);

        let err = CELU::new(x.clone(), scalar::<T>(0.0, false)).forward().unwrap_err();
        assert!(matches!(err, Error::Configuration { op: "CELU", .. }), "{}", err);

        let mut f = Softplus::new(x.clone(), scalar::<T>(0.0, false), scalar::<T>(20.0, false));
        let err = f.forward().unwrap_err();
        assert!(matches!(err, Error::Configuration { op: "Softplus", .. }), "{}", err);
        let err = f.backward(&dense(1, 3, &[1.0; 3])).unwrap_err();
        assert_eq!(err, Error::MissingCachedState { op: "Softplus" });
        assert_eq!(x.grad()?, None);
        Ok(())
    }

    pub fn failed_forward_clears_state_test<T: Float>() -> Result<()> {
        let x = Slot::new(dense::<T>(1, 2, &[1.0, 4.0]));
        let mut f = Log::new(x.clone());
        f.forward()?;

        // a rejected second pass must not leave the first pass usable
        x.set(dense::<T>(1, 2, &[-1.0, 4.0]));
        let err = f.forward().unwrap_err();
        assert!(matches!(err, Error::Domain { op: "Log", .. }), "{}", err);
        let err = f.backward(&dense(1, 2, &[1.0, 1.0])).unwrap_err();
        assert_eq!(err, Error::MissingCachedState { op: "Log" });
        assert_eq!(x.grad()?, None);
        Ok(())
    }
}
