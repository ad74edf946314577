//! Owned element buffers.
//!
//! A [`TensorStorage`] owns the contiguous buffer behind a tensor. It knows nothing about
//! shape or layout; those live on [`crate::Tensor`] and the view types, which is what lets
//! several views reinterpret one buffer without copying it.

use std::marker::PhantomData;

use crate::{
    device::Device,
    device_marker::{CpuDevice, DeviceMarker},
};

/// Contiguous element buffer residing in memory space `D`.
///
/// # Thread Safety
///
/// `TensorStorage` is `Send + Sync` whenever `T` is.
pub struct TensorStorage<T, D: DeviceMarker> {
    data: Vec<T>,
    _device: PhantomData<D>,
}

impl<T, D: DeviceMarker> TensorStorage<T, D> {
    /// Creates a new buffer taking ownership of `value`.
    pub fn from_vec(value: Vec<T>) -> Self {
        Self {
            data: value,
            _device: PhantomData,
        }
    }

    /// Returns the pointer to the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Returns the mutable pointer to the first element.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Returns the number of elements in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the memory space where the buffer is allocated.
    #[inline]
    pub fn device(&self) -> Device {
        D::device_info()
    }

    /// Consumes the storage and returns the underlying vector.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T, D: CpuDevice> TensorStorage<T, D> {
    /// Returns the buffer as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the buffer as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Clone, D: DeviceMarker> Clone for TensorStorage<T, D> {
    fn clone(&self) -> Self {
        Self::from_vec(self.data.clone())
    }
}

impl<T: std::fmt::Debug, D: DeviceMarker> std::fmt::Debug for TensorStorage<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorStorage")
            .field("device", &D::device_info())
            .field("len", &self.data.len())
            .finish()
    }
}
