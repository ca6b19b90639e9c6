use num_traits::FromPrimitive;
use std::fmt::{Debug, Display};
use std::iter::Sum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Floating-point element type of a [`Dense`](crate::Dense).
pub trait Float:
    num_traits::Float + FromPrimitive + Sum + Debug + Display + Default + Send + Sync + 'static
{
    const DTYPE: DType;

    /// Converts an `f64` literal, rounding to the nearest representable value.
    fn cast(x: f64) -> Self;

    fn as_f64(self) -> f64;
}

impl Float for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn cast(x: f64) -> Self {
        x as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Float for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn cast(x: f64) -> Self {
        x
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}
