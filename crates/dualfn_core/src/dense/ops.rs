use super::Dense;
use crate::{
    dtype::Float,
    error::{Error, Result},
    shape::Shape,
};
use dualfn_cpu::ops::{binary, matmul, reduction, unary};

impl<T: Float> Dense<T> {
    // elementwise

    pub fn map(&self, func: impl Fn(T) -> T + Send + Sync) -> Self {
        let mut out = Self::zeros(self.rows, self.cols);
        unary::map(&self.data, &mut out.data, func);
        out
    }

    pub fn map_inplace(&mut self, func: impl Fn(T) -> T + Send + Sync) {
        unary::map_inplace(&mut self.data, func);
    }

    /// Combines two same-shaped matrices element by element.
    pub fn zip_map(&self, op: &'static str, other: &Self, func: impl Fn(T, T) -> T + Send + Sync) -> Result<Self> {
        self.check_same_shape(op, other)?;
        let mut out = Self::zeros(self.rows, self.cols);
        binary::zip_map(&self.data, &other.data, &mut out.data, func);
        Ok(out)
    }

    pub fn zip_map_inplace(&mut self, op: &'static str, other: &Self, func: impl Fn(T, T) -> T + Send + Sync) -> Result<()> {
        self.check_same_shape(op, other)?;
        binary::zip_map_inplace(&mut self.data, &other.data, func);
        Ok(())
    }

    /// Combines three same-shaped matrices element by element.
    pub fn zip3_map(&self, op: &'static str, b: &Self, c: &Self, func: impl Fn(T, T, T) -> T + Send + Sync) -> Result<Self> {
        self.check_same_shape(op, b)?;
        self.check_same_shape(op, c)?;
        let mut out = Self::zeros(self.rows, self.cols);
        binary::zip3_map(&self.data, &b.data, &c.data, &mut out.data, func);
        Ok(out)
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_map("Dense::add", other, |a, b| a + b)
    }

    pub fn add_inplace(&mut self, other: &Self) -> Result<()> {
        self.zip_map_inplace("Dense::add", other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_map("Dense::sub", other, |a, b| a - b)
    }

    /// Elementwise (Hadamard) product.
    pub fn prod(&self, other: &Self) -> Result<Self> {
        self.zip_map("Dense::prod", other, |a, b| a * b)
    }

    pub fn div(&self, other: &Self) -> Result<Self> {
        self.zip_map("Dense::div", other, |a, b| a / b)
    }

    pub fn add_scalar(&self, value: T) -> Self {
        self.map(move |x| x + value)
    }

    pub fn prod_scalar(&self, value: T) -> Self {
        self.map(move |x| x * value)
    }

    pub fn neg(&self) -> Self {
        self.map(|x| -x)
    }

    pub fn sqrt(&self) -> Self {
        self.map(|x| x.sqrt())
    }

    pub fn pow(&self, power: T) -> Self {
        self.map(move |x| x.powf(power))
    }

    // reductions

    pub fn sum(&self) -> T {
        reduction::sum(&self.data)
    }

    /// The largest element; `None` for an empty matrix.
    pub fn max(&self) -> Option<T> {
        reduction::max(&self.data)
    }

    /// Flat index of the first largest element.
    pub fn argmax(&self) -> Option<usize> {
        reduction::argmax(&self.data)
    }

    /// Frobenius inner product `Σ self ⊙ other`.
    pub fn dot(&self, other: &Self) -> Result<T> {
        if self.size() != other.size() || !(self.same_shape(other) || (self.is_vector() && other.is_vector())) {
            return Err(Error::shape_mismatch("Dense::dot", self.shape(), other.shape()));
        }
        Ok(self.data.iter().zip(&other.data).fold(T::zero(), |acc, (&a, &b)| acc + a * b))
    }

    // linear algebra

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::shape_mismatch(
                "Dense::mul",
                Shape::new(self.cols, other.cols),
                other.shape(),
            ));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        matmul::matmul(self.rows, self.cols, other.cols, &self.data, &other.data, &mut out.data);
        Ok(out)
    }

    /// `selfᵀ · other`, without materializing the transpose.
    pub fn mul_t(&self, other: &Self) -> Result<Self> {
        if self.rows != other.rows {
            return Err(Error::shape_mismatch(
                "Dense::mul_t",
                Shape::new(self.rows, other.cols),
                other.shape(),
            ));
        }
        let mut out = Self::zeros(self.cols, other.cols);
        matmul::matmul_tn(self.cols, self.rows, other.cols, &self.data, &other.data, &mut out.data);
        Ok(out)
    }

    /// `self · otherᵀ`, without materializing the transpose.
    pub fn mul_nt(&self, other: &Self) -> Result<Self> {
        if self.cols != other.cols {
            return Err(Error::shape_mismatch(
                "Dense::mul_nt",
                Shape::new(other.rows, self.cols),
                other.shape(),
            ));
        }
        let mut out = Self::zeros(self.rows, other.rows);
        matmul::matmul_nt(self.rows, self.cols, other.rows, &self.data, &other.data, &mut out.data);
        Ok(out)
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        matmul::transpose(self.rows, self.cols, &self.data, &mut out.data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: usize, cols: usize, data: &[f64]) -> Dense<f64> {
        Dense::from_f64(rows, cols, data).unwrap()
    }

    #[test]
    fn elementwise_requires_same_shape() {
        let a = m(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = m(1, 4, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            a.add(&b).unwrap_err(),
            Error::shape_mismatch("Dense::add", Shape::new(2, 2), Shape::new(1, 4))
        );
        assert_eq!(a.prod(&a).unwrap().data(), &[1.0, 4.0, 9.0, 16.0]);
    }

    #[test]
    fn mul_variants_agree() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = m(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let ab = a.mul(&b).unwrap();
        assert_eq!(ab.data(), &[58.0, 64.0, 139.0, 154.0]);
        assert_eq!(a.transpose().mul_t(&b).unwrap(), ab);
        assert_eq!(a.mul_nt(&b.transpose()).unwrap(), ab);
        assert!(a.mul(&a).is_err());
    }

    #[test]
    fn dot_accepts_row_and_column_vectors() {
        let col = Dense::vector(vec![1.0, 2.0, 3.0]);
        let row = Dense::row_vector(vec![4.0, 5.0, 6.0]);
        assert_eq!(col.dot(&row).unwrap(), 32.0);
        assert!(m(2, 2, &[1.0; 4]).dot(&col).is_err());
    }

    #[test]
    fn reductions() {
        let a = m(2, 2, &[1.0, 5.0, 5.0, -2.0]);
        assert_eq!(a.sum(), 9.0);
        assert_eq!(a.max(), Some(5.0));
        assert_eq!(a.argmax(), Some(1));
    }
}
