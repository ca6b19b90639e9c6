mod utils;

use dualfn_core::{
    error::{Error, Result},
    Float, Shape,
};
use dualfn_fn::{ops::MaxPooling, Function};
use utils::*;

test_ops!([max_pooling, ragged, ties, invalid_window]);

#[rustfmt::skip]
const GRID: [f64; 16] = [
    1.0, 5.0, -2.0, 0.0,
    3.0, 2.0,  4.0, 7.0,
    0.5, 0.0,  9.0, 1.0,
    6.0, 1.0, -3.0, 8.0,
];

mod test_functions {
    use super::*;

    pub fn max_pooling_test<T: Float>() -> Result<()> {
        let x = var::<T>(4, 4, &GRID);
        let mut f = MaxPooling::new(x.clone(), 2, 2)?;
        let y = f.forward()?;
        assert_eq!(y.shape(), Shape::new(2, 2));
        assert_close(&y, &[5.0, 7.0, 6.0, 9.0]);

        f.backward(&dense(2, 2, &[1.0, 2.0, 3.0, 4.0]))?;
        #[rustfmt::skip]
        let expected = [
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 2.0,
            0.0, 0.0, 4.0, 0.0,
            3.0, 0.0, 0.0, 0.0,
        ];
        assert_grad(&x, &expected);

        check_gradients::<T, _>(&[input(4, 4, &GRID)], |x| {
            Box::new(MaxPooling::new(x[0].clone(), 2, 2).expect("non-empty window"))
        })
    }

    pub fn ragged_test<T: Float>() -> Result<()> {
        // the last row and column do not fill a 2x2 window
        let x = var::<T>(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let mut f = MaxPooling::new(x.clone(), 2, 2)?;
        let err = f.forward().unwrap_err();
        assert!(matches!(err, Error::Configuration { op: "MaxPooling", .. }), "{}", err);
        let err = f.backward(&dense(1, 1, &[1.0])).unwrap_err();
        assert_eq!(err, Error::MissingCachedState { op: "MaxPooling" });

        // a window that divides only one dimension is rejected too
        let x = var::<T>(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let err = MaxPooling::new(x.clone(), 2, 2)?.forward().unwrap_err();
        assert!(matches!(err, Error::Configuration { op: "MaxPooling", .. }), "{}", err);
        assert_eq!(x.grad()?, None);
        Ok(())
    }

    pub fn ties_test<T: Float>() -> Result<()> {
        let x = var::<T>(2, 2, &[3.0, 3.0, 3.0, 3.0]);
        let mut f = MaxPooling::new(x.clone(), 2, 2)?;
        f.forward()?;
        f.backward(&dense(1, 1, &[1.0]))?;
        assert_grad(&x, &[1.0, 0.0, 0.0, 0.0]);
        Ok(())
    }

    pub fn invalid_window_test<T: Float>() -> Result<()> {
        let x = var::<T>(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let err = MaxPooling::new(x.clone(), 0, 2).err();
        assert!(matches!(err, Some(Error::Configuration { op: "MaxPooling", .. })));

        let mut f = MaxPooling::new(x.clone(), 3, 1)?;
        let err = f.forward().unwrap_err();
        assert!(matches!(err, Error::Configuration { op: "MaxPooling", .. }), "{}", err);

        let mut f = MaxPooling::new(x.clone(), 2, 3)?;
        assert_close(&f.forward()?, &[6.0]);
        let err = f.backward(&dense(2, 1, &[1.0, 1.0])).unwrap_err();
        assert_eq!(err, Error::shape_mismatch("MaxPooling", Shape::new(1, 1), Shape::new(2, 1)));
        assert_eq!(x.grad()?, None);
        Ok(())
    }
}
