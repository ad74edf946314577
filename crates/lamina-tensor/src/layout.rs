//! Storage-order markers.
//!
//! A 2-D tensor stores its elements either row by row ([`RowMajor`]) or column by column
//! ([`ColumnMajor`]). The order is part of the tensor type, and every layout names its
//! opposite through [`MemoryLayout::Transposed`], which is what allows a transposed view to
//! be built by reinterpreting the same buffer.
//!
//! Row and column always refer to the logical axes (axis 0 and axis 1). Only the strides
//! differ between the two layouts:
//!
//! ```
//! use lamina_tensor::{ColumnMajor, MemoryLayout, RowMajor};
//!
//! assert_eq!(RowMajor::strides([2, 3]), [3, 1]);
//! assert_eq!(ColumnMajor::strides([2, 3]), [1, 2]);
//! ```

/// Runtime tag of a [`MemoryLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutKind {
    /// The last axis varies fastest in memory.
    RowMajor,
    /// The first axis varies fastest in memory.
    ColumnMajor,
}

impl LayoutKind {
    /// Returns the opposite storage order.
    pub fn transposed(self) -> Self {
        match self {
            LayoutKind::RowMajor => LayoutKind::ColumnMajor,
            LayoutKind::ColumnMajor => LayoutKind::RowMajor,
        }
    }
}

/// Marker trait for storage orders.
///
/// The trait is sealed; only [`RowMajor`] and [`ColumnMajor`] implement it.
pub trait MemoryLayout:
    private::Sealed + Clone + Copy + Default + std::fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// The opposite storage order. Transposing twice gives back `Self`.
    type Transposed: MemoryLayout<Transposed = Self>;

    /// Runtime tag of this layout.
    const KIND: LayoutKind;

    /// Computes contiguous strides for `shape` in this storage order.
    fn strides<const N: usize>(shape: [usize; N]) -> [usize; N];
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::RowMajor {}
    impl Sealed for super::ColumnMajor {}
}

/// Row-major (C-contiguous) storage order. This is the default layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RowMajor;

/// Column-major (Fortran-contiguous) storage order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColumnMajor;

impl MemoryLayout for RowMajor {
    type Transposed = ColumnMajor;

    const KIND: LayoutKind = LayoutKind::RowMajor;

    fn strides<const N: usize>(shape: [usize; N]) -> [usize; N] {
        crate::get_strides_from_shape(shape)
    }
}

impl MemoryLayout for ColumnMajor {
    type Transposed = RowMajor;

    const KIND: LayoutKind = LayoutKind::ColumnMajor;

    fn strides<const N: usize>(shape: [usize; N]) -> [usize; N] {
        let mut strides = [0; N];
        let mut stride = 1;
        for (s, &dim) in strides.iter_mut().zip(shape.iter()) {
            *s = stride;
            stride *= dim;
        }
        strides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_strides() {
        assert_eq!(RowMajor::strides([4]), [1]);
        assert_eq!(RowMajor::strides([2, 3]), [3, 1]);
        assert_eq!(RowMajor::strides([2, 3, 4]), [12, 4, 1]);
    }

    #[test]
    fn test_column_major_strides() {
        assert_eq!(ColumnMajor::strides([4]), [1]);
        assert_eq!(ColumnMajor::strides([2, 3]), [1, 2]);
        assert_eq!(ColumnMajor::strides([2, 3, 4]), [1, 2, 6]);
    }

    #[test]
    fn test_transposed_kind() {
        assert_eq!(
            <<RowMajor as MemoryLayout>::Transposed as MemoryLayout>::KIND,
            LayoutKind::ColumnMajor
        );
        assert_eq!(
            <<ColumnMajor as MemoryLayout>::Transposed as MemoryLayout>::KIND,
            LayoutKind::RowMajor
        );
        assert_eq!(LayoutKind::RowMajor.transposed().transposed(), LayoutKind::RowMajor);
    }
}
