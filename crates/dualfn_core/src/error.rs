use crate::shape::Shape;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ShapeMismatch {
        op: &'static str,
        expected: Shape,
        got: Shape,
    },
    InvalidShape {
        op: &'static str,
        message: String,
    },
    Domain {
        op: &'static str,
        message: String,
    },
    MissingCachedState {
        op: &'static str,
    },
    Configuration {
        op: &'static str,
        message: String,
    },
    IndexOutOfBounds {
        op: &'static str,
        index: usize,
        size: usize,
    },
    GradLocked,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn shape_mismatch(op: &'static str, expected: Shape, got: Shape) -> Self {
        Self::ShapeMismatch { op, expected, got }
    }

    pub fn invalid_shape(op: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            op,
            message: message.into(),
        }
    }

    pub fn domain(op: &'static str, message: impl Into<String>) -> Self {
        Self::Domain {
            op,
            message: message.into(),
        }
    }

    pub fn configuration(op: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            op,
            message: message.into(),
        }
    }

    /// Name of the operator that raised the error, if any.
    pub fn op(&self) -> Option<&'static str> {
        match self {
            Self::ShapeMismatch { op, .. }
            | Self::InvalidShape { op, .. }
            | Self::Domain { op, .. }
            | Self::MissingCachedState { op }
            | Self::Configuration { op, .. }
            | Self::IndexOutOfBounds { op, .. } => Some(op),
            Self::GradLocked => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { op, expected, got } => {
                write!(f, "Shape mismatch ({}): expected {}, got {}", op, expected, got)
            }
            Self::InvalidShape { op, message } => write!(f, "Invalid shape ({}): {}", op, message),
            Self::Domain { op, message } => write!(f, "Domain error ({}): {}", op, message),
            Self::MissingCachedState { op } => {
                write!(f, "Missing cached state ({}): backward called without a matching forward", op)
            }
            Self::Configuration { op, message } => write!(f, "Invalid configuration ({}): {}", op, message),
            Self::IndexOutOfBounds { op, index, size } => {
                write!(f, "Index out of bounds ({}): index {} is out of bounds for size {}", op, index, size)
            }
            Self::GradLocked => write!(f, "Grad is locked"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_op_and_shapes() {
        let err = Error::shape_mismatch("Add", Shape::new(2, 3), Shape::new(3, 2));
        assert_eq!(err.to_string(), "Shape mismatch (Add): expected [2x3], got [3x2]");
        assert_eq!(err.op(), Some("Add"));
        assert_eq!(Error::GradLocked.op(), None);
    }
}
