#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `lamina-tensor` provides the containers used by the `lamina` linear-algebra kernels: owned
//! tensors whose storage order (row-major or column-major) is part of their type, borrowed
//! views that reinterpret a buffer without copying it, and a diagonal (DIA) sparse matrix.
//!
//! # Architecture
//!
//! - **Tensor**: owned multi-dimensional array with shape, strides and a layout marker
//! - **TensorStorage**: the contiguous buffer behind a tensor
//! - **TensorView / TensorViewMut**: borrowed views with their own offset, shape and strides
//! - **MemoryLayout**: the [`RowMajor`] and [`ColumnMajor`] storage orders
//! - **DiaMatrix**: banded sparse matrix stored by diagonals
//!
//! # Quick Start
//!
//! ```rust
//! use lamina_tensor::{ColumnMajor, Tensor2};
//!
//! // A 2x3 row-major matrix
//! let a = Tensor2::<f32>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! assert_eq!(a.get([1, 2]), Some(&6.0));
//!
//! // Its transpose, without copying: a 3x2 column-major view on the same buffer
//! let at = a.transposed_view();
//! assert_eq!(at.shape, [3, 2]);
//! assert_eq!(at.layout, ColumnMajor);
//! assert_eq!(at.get([2, 1]), Some(&6.0));
//! ```
//!
//! # Type Aliases
//!
//! - [`Tensor1`]: One-dimensional tensor (vector)
//! - [`Tensor2`]: Two-dimensional tensor (matrix), row-major by default

/// Device module containing the runtime device tag.
pub mod device;

/// device_marker module containing zero-cost device type markers.
pub mod device_marker;

/// Diagonal sparse matrix storage.
pub mod dia;

/// Storage-order markers and stride computation.
pub mod layout;

/// Serde module for JSON/other format serialization and deserialization.
///
/// This module provides serialization support for tensors and diagonal matrices when the
/// `serde` feature is enabled.
#[cfg(feature = "serde")]
pub mod serde;

/// Storage module containing the owned element buffer.
pub mod storage;

/// Tensor module containing the main tensor implementation and error types.
///
/// This module provides the core [`tensor::Tensor`] struct and related functionality.
pub mod tensor;

/// View module containing non-owning tensor view implementations.
///
/// This module provides [`view::TensorView`] and [`view::TensorViewMut`] for zero-copy
/// reinterpretations of existing tensor data.
pub mod view;

pub use crate::device::Device;
pub use crate::device_marker::{Cpu, CpuDevice, DeviceMarker};
pub use crate::dia::DiaMatrix;
pub use crate::layout::{ColumnMajor, LayoutKind, MemoryLayout, RowMajor};
pub(crate) use crate::tensor::get_strides_from_shape;
pub use crate::tensor::{Tensor, TensorError};
pub use crate::view::{AsTensorView, AsTensorViewMut, TensorView, TensorViewMut};

/// Type alias for a 1-dimensional tensor.
pub type Tensor1<T, D = Cpu> = Tensor<T, 1, RowMajor, D>;

/// Type alias for a 2-dimensional tensor.
pub type Tensor2<T, L = RowMajor, D = Cpu> = Tensor<T, 2, L, D>;
