#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! The kernels are plain functions over [`lamina_tensor`] tensors and views. Storage order,
//! element type and memory space are generic parameters, so every combination is resolved at
//! compile time and operands that disagree are rejected by the type checker. Shape checks run
//! before anything is written.
//!
//! ```rust
//! use lamina_linalg::blas3::{prod, Transpose};
//! use lamina_linalg::reduce::sum;
//! use lamina_tensor::Tensor2;
//!
//! let a = Tensor2::<f32>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let mut gram = Tensor2::<f32>::zeros([2, 2]);
//! prod(&mut gram, &a, &a, Transpose::No, Transpose::Yes, 1.0, 0.0).unwrap();
//! assert_eq!(gram.as_slice(), &[14.0, 32.0, 32.0, 77.0]);
//!
//! let col_sums = sum(&a, 0).unwrap();
//! assert_eq!(col_sums.as_slice(), &[5.0, 7.0, 9.0]);
//! ```

/// Strided matrix-multiply primitive backed by `matrixmultiply`.
pub mod backend;

/// Dense matrix products and transposition.
///
/// Provides [`blas3::prod`], its opposite-layout convenience forms, the diagonal sparse
/// left-operand product [`blas3::prod_dia`] and the copying [`blas3::transpose`].
pub mod blas3;

/// Elementwise combination of a matrix with a vector broadcast along one axis.
pub mod broadcast;

/// Error types for the kernels.
///
/// Defines [`LinalgError`] for handling failures during linear-algebra operations.
pub mod error;

/// Reductions of a matrix to a row or a column.
pub mod reduce;

/// Diagonal sparse matrix times vector.
pub mod sparse;

pub use blas3::Transpose;
pub use broadcast::BinaryFunctor;
pub use error::LinalgError;
pub use reduce::ReduceFunctor;
