use crate::{
    device_marker::{CpuDevice, DeviceMarker},
    layout::MemoryLayout,
    storage::TensorStorage,
    Tensor, TensorError,
};

/// A non-owning, read-only view into tensor data.
///
/// `TensorView` borrows the storage of a tensor and carries its own offset, shape, strides and
/// storage-order marker. Views enable zero-copy reinterpretations such as transposition and
/// block selection.
///
/// # Lifetime
///
/// The view borrows the storage for its lifetime `'a`, so the borrow checker guarantees that
/// the source tensor outlives the view and is not mutated while the view exists.
///
/// # Examples
///
/// ```rust
/// use lamina_tensor::{RowMajor, Tensor2};
///
/// let t = Tensor2::<i32>::from_shape_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
///
/// // The transposed view reinterprets the buffer in the opposite storage order.
/// let view = t.transposed_view();
/// assert_eq!(view.get([0, 1]), Some(&3));
///
/// // Copying keeps the column-major order, so the buffer is unchanged.
/// let contiguous = view.as_contiguous();
/// assert_eq!(contiguous.as_slice(), &[1, 2, 3, 4]);
///
/// // Converting to row-major lays the transpose out row by row.
/// assert_eq!(contiguous.to_layout::<RowMajor>().as_slice(), &[1, 3, 2, 4]);
/// ```
pub struct TensorView<'a, T, const N: usize, L: MemoryLayout, D: DeviceMarker> {
    /// Reference to the storage held by another tensor.
    pub storage: &'a TensorStorage<T, D>,

    /// Offset, in elements, of the view's first element inside the storage.
    pub offset: usize,

    /// The shape of the tensor view.
    pub shape: [usize; N],

    /// The strides for accessing elements in the view.
    pub strides: [usize; N],

    /// The storage-order marker of the view.
    pub layout: L,
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> Clone for TensorView<'_, T, N, L, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> Copy for TensorView<'_, T, N, L, D> {}

impl<'a, T, const N: usize, L: MemoryLayout, D: DeviceMarker> TensorView<'a, T, N, L, D> {
    /// Returns a raw pointer to the first element of the view.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr().wrapping_add(self.offset)
    }

    /// Returns the total number of elements in the view.
    ///
    /// This is computed from the view's shape, not the underlying storage size.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Storage offset of the element at `index`, without bounds checking.
    #[inline]
    pub fn get_iter_offset_unchecked(&self, index: [usize; N]) -> usize {
        index
            .iter()
            .zip(self.strides.iter())
            .fold(self.offset, |acc, (i, s)| acc + i * s)
    }

    /// Storage offset of the element at `index`, or `None` if out of bounds.
    pub fn get_iter_offset(&self, index: [usize; N]) -> Option<usize> {
        if index.iter().zip(self.shape.iter()).any(|(i, s)| i >= s) {
            return None;
        }
        Some(self.get_iter_offset_unchecked(index))
    }

    /// Checks that every element addressed by the offset, shape and strides lies inside the
    /// storage.
    ///
    /// The fields of a view are public, so a hand-built view may describe more elements than
    /// its storage holds. Kernels working through raw pointers or unchecked access call this
    /// first. An empty view addresses nothing and always passes.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::IndexOutOfBounds`] with the last addressed position and the
    /// storage length.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::Tensor2;
    ///
    /// let t = Tensor2::<u8>::zeros([2, 2]);
    /// let mut view = t.view();
    /// assert!(view.check_extent().is_ok());
    ///
    /// view.shape = [3, 2];
    /// assert!(view.check_extent().is_err());
    /// ```
    pub fn check_extent(&self) -> Result<(), TensorError> {
        let len = self.storage.len();
        if self.shape.iter().any(|&s| s == 0) {
            return Ok(());
        }
        let last = self
            .shape
            .iter()
            .zip(self.strides.iter())
            .try_fold(self.offset, |acc, (&s, &stride)| {
                (s - 1).checked_mul(stride)?.checked_add(acc)
            })
            .unwrap_or(usize::MAX);
        if last >= len {
            return Err(TensorError::index_out_of_bounds(last, len));
        }
        Ok(())
    }
}

impl<'a, T, const N: usize, L: MemoryLayout, D: CpuDevice> TensorView<'a, T, N, L, D> {
    /// Gets the element at the given index without bounds checking.
    ///
    /// The view's offset and strides are used to compute the position in the storage.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the index is within the bounds defined by the
    /// view's shape. Out-of-bounds access results in undefined behavior.
    pub fn get_unchecked(&self, index: [usize; N]) -> &'a T {
        let offset = self.get_iter_offset_unchecked(index);
        unsafe { self.storage.as_slice().get_unchecked(offset) }
    }

    /// Gets the element at the given index, or `None` if the index is out of bounds.
    pub fn get(&self, index: [usize; N]) -> Option<&'a T> {
        self.get_iter_offset(index)
            .and_then(|offset| self.storage.as_slice().get(offset))
    }

    /// Converts the view to an owned tensor with contiguous memory in the view's layout.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lamina_tensor::Tensor2;
    ///
    /// let t = Tensor2::<i32>::from_shape_vec([2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    /// let block = t.block_view(0, 2, 1, 2).unwrap();
    /// assert_eq!(block.as_contiguous().as_slice(), &[2, 3, 5, 6]);
    /// ```
    pub fn as_contiguous(&self) -> Tensor<T, N, L, D>
    where
        T: Clone,
    {
        Tensor::from_shape_fn(self.shape, |index| self.get_unchecked(index).clone())
    }
}

impl<'a, T, L: MemoryLayout, D: DeviceMarker> TensorView<'a, T, 2, L, D> {
    /// Number of rows (axis 0).
    #[inline]
    pub fn height(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns (axis 1).
    #[inline]
    pub fn width(&self) -> usize {
        self.shape[1]
    }

    /// Reinterprets the view in the opposite storage order with swapped shape.
    ///
    /// Transposing twice gives back a view with the original layout, shape and strides.
    pub fn transposed(self) -> TensorView<'a, T, 2, L::Transposed, D> {
        TensorView {
            storage: self.storage,
            offset: self.offset,
            shape: [self.shape[1], self.shape[0]],
            strides: [self.strides[1], self.strides[0]],
            layout: <L::Transposed as Default>::default(),
        }
    }
}

/// A non-owning, mutable view into tensor data.
///
/// This is the mutable counterpart of [`TensorView`]; it holds an exclusive borrow of the
/// storage, so no other view of the same tensor can exist at the same time.
pub struct TensorViewMut<'a, T, const N: usize, L: MemoryLayout, D: DeviceMarker> {
    /// Exclusive reference to the storage held by another tensor.
    pub storage: &'a mut TensorStorage<T, D>,

    /// Offset, in elements, of the view's first element inside the storage.
    pub offset: usize,

    /// The shape of the tensor view.
    pub shape: [usize; N],

    /// The strides for accessing elements in the view.
    pub strides: [usize; N],

    /// The storage-order marker of the view.
    pub layout: L,
}

impl<'a, T, const N: usize, L: MemoryLayout, D: DeviceMarker> TensorViewMut<'a, T, N, L, D> {
    /// Returns a mutable raw pointer to the first element of the view.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr().wrapping_add(self.offset)
    }

    /// Returns the total number of elements in the view.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> TensorView<'_, T, N, L, D> {
        TensorView {
            storage: &*self.storage,
            offset: self.offset,
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        }
    }

    /// Checks that the view stays inside its storage. See [`TensorView::check_extent`].
    pub fn check_extent(&self) -> Result<(), TensorError> {
        self.as_view().check_extent()
    }

    /// Reborrows as a shorter-lived mutable view.
    pub fn reborrow(&mut self) -> TensorViewMut<'_, T, N, L, D> {
        TensorViewMut {
            storage: &mut *self.storage,
            offset: self.offset,
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        }
    }
}

impl<'a, T, const N: usize, L: MemoryLayout, D: CpuDevice> TensorViewMut<'a, T, N, L, D> {
    /// Gets a mutable reference to the element at the given index without bounds checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the index is within the bounds defined by the
    /// view's shape.
    pub fn get_unchecked_mut(&mut self, index: [usize; N]) -> &mut T {
        let offset = self.as_view().get_iter_offset_unchecked(index);
        unsafe { self.storage.as_mut_slice().get_unchecked_mut(offset) }
    }

    /// Gets a mutable reference to the element at the given index, or `None` if out of bounds.
    pub fn get_mut(&mut self, index: [usize; N]) -> Option<&mut T> {
        let offset = self.as_view().get_iter_offset(index)?;
        self.storage.as_mut_slice().get_mut(offset)
    }
}

impl<'a, T, L: MemoryLayout, D: DeviceMarker> TensorViewMut<'a, T, 2, L, D> {
    /// Reinterprets the view in the opposite storage order with swapped shape.
    pub fn transposed(self) -> TensorViewMut<'a, T, 2, L::Transposed, D> {
        TensorViewMut {
            storage: self.storage,
            offset: self.offset,
            shape: [self.shape[1], self.shape[0]],
            strides: [self.strides[1], self.strides[0]],
            layout: <L::Transposed as Default>::default(),
        }
    }
}

/// Anything that can be read as a [`TensorView`].
///
/// Implemented for owned tensors and for both view types, so operations can take any of
/// them as a source operand.
pub trait AsTensorView<T, const N: usize, L: MemoryLayout, D: DeviceMarker> {
    /// Borrows `self` as a read-only view.
    fn as_tensor_view(&self) -> TensorView<'_, T, N, L, D>;
}

/// Anything that can be written through a [`TensorViewMut`].
pub trait AsTensorViewMut<T, const N: usize, L: MemoryLayout, D: DeviceMarker>:
    AsTensorView<T, N, L, D>
{
    /// Borrows `self` as a mutable view.
    fn as_tensor_view_mut(&mut self) -> TensorViewMut<'_, T, N, L, D>;
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> AsTensorView<T, N, L, D>
    for Tensor<T, N, L, D>
{
    fn as_tensor_view(&self) -> TensorView<'_, T, N, L, D> {
        self.view()
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> AsTensorViewMut<T, N, L, D>
    for Tensor<T, N, L, D>
{
    fn as_tensor_view_mut(&mut self) -> TensorViewMut<'_, T, N, L, D> {
        self.view_mut()
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> AsTensorView<T, N, L, D>
    for TensorView<'_, T, N, L, D>
{
    fn as_tensor_view(&self) -> TensorView<'_, T, N, L, D> {
        *self
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> AsTensorView<T, N, L, D>
    for TensorViewMut<'_, T, N, L, D>
{
    fn as_tensor_view(&self) -> TensorView<'_, T, N, L, D> {
        self.as_view()
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> AsTensorViewMut<T, N, L, D>
    for TensorViewMut<'_, T, N, L, D>
{
    fn as_tensor_view_mut(&mut self) -> TensorViewMut<'_, T, N, L, D> {
        self.reborrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnMajor, RowMajor, Tensor2};

    #[test]
    fn test_tensor_view_from_storage() {
        let storage = TensorStorage::<u8, crate::Cpu>::from_vec(vec![1, 2, 3, 4, 5, 6, 7, 8]);

        let view = TensorView::<u8, 1, RowMajor, _> {
            storage: &storage,
            offset: 2,
            shape: [3],
            strides: [2],
            layout: RowMajor,
        };

        assert_eq!(view.numel(), 3);
        assert_eq!(view.get_unchecked([0]), &3);
        assert_eq!(view.get_unchecked([1]), &5);
        assert_eq!(view.get_unchecked([2]), &7);
        assert!(view.get([3]).is_none());
        assert_eq!(view.as_contiguous().as_slice(), &[3, 5, 7]);
    }

    #[test]
    fn test_transposed_twice_is_identity() -> Result<(), TensorError> {
        let t = Tensor2::<f32, ColumnMajor>::from_shape_fn([3, 2], |[i, j]| (i * 2 + j) as f32);
        let tt = t.transposed_view().transposed();
        assert_eq!(tt.layout, ColumnMajor);
        assert_eq!(tt.shape, t.shape);
        assert_eq!(tt.strides, t.strides);
        assert_eq!(tt.as_contiguous().as_slice(), t.as_slice());
        Ok(())
    }

    #[test]
    fn test_view_mut_transposed() -> Result<(), TensorError> {
        let mut t = Tensor2::<i32>::zeros([2, 3]);
        let mut tv = t.transposed_view_mut();
        assert_eq!(tv.shape, [3, 2]);
        *tv.get_unchecked_mut([1, 0]) = 5;
        assert!(tv.get_mut([3, 0]).is_none());
        let back = tv.transposed();
        assert_eq!(back.as_view().get([0, 1]), Some(&5));
        assert_eq!(t.as_slice(), &[0, 5, 0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_as_tensor_view_impls() -> Result<(), TensorError> {
        fn first<V: AsTensorView<u8, 2, RowMajor, crate::Cpu>>(v: &V) -> u8 {
            *v.as_tensor_view().get_unchecked([0, 0])
        }

        let mut t = Tensor2::<u8>::from_shape_vec([2, 2], vec![4, 3, 2, 1])?;
        assert_eq!(first(&t), 4);
        assert_eq!(first(&t.block_view(1, 1, 1, 1)?), 1);
        let vm = t.view_mut();
        assert_eq!(first(&vm), 4);
        Ok(())
    }

    #[test]
    fn test_check_extent() -> Result<(), TensorError> {
        let backing = Tensor2::<f32>::zeros([1, 1]);
        let oversized = TensorView {
            storage: &backing.storage,
            offset: 0,
            shape: [3, 3],
            strides: [3, 1],
            layout: RowMajor,
        };
        assert_eq!(
            oversized.check_extent(),
            Err(TensorError::index_out_of_bounds(8, 1))
        );

        let overflowing = TensorView {
            strides: [usize::MAX, 1],
            ..oversized
        };
        assert!(overflowing.check_extent().is_err());

        let empty = TensorView {
            offset: 10,
            shape: [0, 3],
            ..oversized
        };
        empty.check_extent()?;

        let mut t = Tensor2::<f32, ColumnMajor>::zeros([3, 4]);
        t.block_view(1, 2, 2, 2)?.check_extent()?;
        t.transposed_view().check_extent()?;
        let mut vm = t.view_mut();
        vm.check_extent()?;
        vm.offset = 1;
        assert!(vm.check_extent().is_err());
        Ok(())
    }
}
