pub mod binary;
pub mod dropout;
pub mod indexing;
pub mod matmul;
pub mod pooling;
pub mod reduction;
pub mod scalar;
pub mod softmax;
pub mod sparsemax;
pub mod transform;
pub mod unary;

pub use binary::{Add, Div, Max, Min, Prod, Sub};
pub use dropout::Dropout;
pub use indexing::{At, ColView, RowView, Slice};
pub use matmul::{Affine, Dot, Mul, MulT, Transpose};
pub use pooling::MaxPooling;
pub use reduction::{CumSum, ReduceMax, ReduceMean, ReduceSum, ScalarMax};
pub use scalar::{AddScalar, DivScalar, ProdScalar, ReverseSubScalar, SubScalar};
pub use softmax::{LogSoftmax, Softmax};
pub use sparsemax::{SparseMax, SparseMaxLoss};
pub use transform::{AppendRows, Concat, Flatten, Reshape, RotateR, Stack};
pub use unary::{
    Abs, Activation, Cos, Exp, HardSigmoid, HardTanh, Identity, LeakyReLU, Log, Mish, Neg, Pow, ReLU, Reciprocal,
    Sigmoid, Sin, Softplus, Softsign, SoftShrink, Sqrt, Square, Swish, SwishB, Tan, Tanh, Threshold, Unary, CELU,
    ELU, GELU, SELU,
};
