use lamina_tensor::TensorError;
use thiserror::Error;

/// An error type for the linear-algebra kernels.
///
/// Every structural check runs before the destination is written, so an error always
/// leaves the destination untouched.
#[derive(Error, Debug, PartialEq)]
pub enum LinalgError {
    /// Operand shapes are incompatible for the requested operation.
    #[error("Dimension mismatch in {op}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Name of the operation that rejected the operands.
        op: &'static str,
        /// The shape the operation required.
        expected: Vec<usize>,
        /// The shape that was provided.
        actual: Vec<usize>,
    },

    /// An argument is outside the set of accepted values.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        arg: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Tensor error
    #[error("Error with the tensor: {0}")]
    TensorError(#[from] TensorError),
}

impl LinalgError {
    pub(crate) fn dimension_mismatch(
        op: &'static str,
        expected: &[usize],
        actual: &[usize],
    ) -> Self {
        log::debug!("{op}: rejected operand shape {actual:?}, expected {expected:?}");
        Self::DimensionMismatch {
            op,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::debug!("rejected argument `{arg}`: {reason}");
        Self::InvalidArgument { arg, reason }
    }
}
