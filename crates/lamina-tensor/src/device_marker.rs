//! Memory-space marker types for compile-time dispatch.
//!
//! The memory space of a tensor is part of its type, so operands that live in different
//! spaces cannot be combined by accident: the compiler rejects the call instead of the
//! kernel failing at runtime.
//!
//! # Examples
//!
//! ```
//! use lamina_tensor::{CpuDevice, RowMajor, Tensor2};
//!
//! fn scale<D: CpuDevice>(tensor: &Tensor2<f32, RowMajor, D>, factor: f32) -> Tensor2<f32, RowMajor, D> {
//!     tensor.map(|&x| x * factor)
//! }
//!
//! let t = Tensor2::<f32>::from_shape_val([4, 4], 1.0);
//! let scaled = scale(&t, 2.0);
//! assert_eq!(scaled.as_slice(), &[2.0; 16]);
//! ```

use crate::device::Device;

/// Marker trait for memory spaces.
///
/// The trait is sealed; only the built-in markers implement it.
pub trait DeviceMarker: private::Sealed + Clone + Copy + Default + Send + Sync + 'static {
    /// Returns the runtime tag of the memory space.
    fn device_info() -> Device;
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Cpu {}
}

/// Marker trait for memory spaces whose elements can be read directly from the host.
///
/// Slice accessors such as [`crate::Tensor::as_slice`] are only available for these.
pub trait CpuDevice: DeviceMarker {}

/// Zero-sized marker for host memory. This is the default memory space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cpu;

impl CpuDevice for Cpu {}

impl DeviceMarker for Cpu {
    fn device_info() -> Device {
        Device::Cpu
    }
}
