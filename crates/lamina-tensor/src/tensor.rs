use thiserror::Error;

use super::{
    device_marker::{Cpu, CpuDevice, DeviceMarker},
    layout::{MemoryLayout, RowMajor},
    storage::TensorStorage,
    view::{TensorView, TensorViewMut},
};

/// Error type for tensor construction and access.
#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    /// Type casting operation failed.
    ///
    /// This occurs when a value cannot be represented in the target element type, e.g. a NaN
    /// or an out-of-range value converted to an integer.
    #[error("Type cast failed: source data cannot be safely converted to target type. Check value ranges.")]
    CastError,

    /// Tensor shape does not match the provided data.
    ///
    /// # Example
    /// ```ignore
    /// // Error: shape [2, 3] expects 6 elements, but got 5
    /// let tensor = Tensor2::<u8>::from_shape_vec([2, 3], vec![1, 2, 3, 4, 5])?;
    /// ```
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted
        index: usize,
        /// The size of the dimension being indexed
        size: usize,
    },

    /// The offsets or diagonal storage of a [`crate::DiaMatrix`] are inconsistent.
    #[error("Invalid diagonal storage: {0}")]
    InvalidDiagonals(String),
}

impl TensorError {
    /// Creates an InvalidShape error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an IndexOutOfBounds error with clear context.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }
}

/// Computes the strides for a row-major (C-contiguous) tensor layout.
///
/// For row-major layout, the rightmost dimension has stride 1, and each dimension's
/// stride is the product of all dimensions to its right.
///
/// # Examples
///
/// ```rust
/// use lamina_tensor::tensor::get_strides_from_shape;
///
/// assert_eq!(get_strides_from_shape([2, 3]), [3, 1]);
/// assert_eq!(get_strides_from_shape([2, 3, 4]), [12, 4, 1]);
/// ```
pub fn get_strides_from_shape<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides: [usize; N] = [0; N];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// A multi-dimensional array with owned data.
///
/// # Type Parameters
///
/// * `T` - The element type stored in the tensor
/// * `N` - The number of dimensions
/// * `L` - The storage order ([`RowMajor`] or [`crate::ColumnMajor`])
/// * `D` - The memory-space marker (e.g. [`Cpu`])
///
/// # Memory Layout
///
/// The shape and the layout marker fully determine the strides: element `[i, j]` of a
/// row-major matrix of width `w` lives at `i * w + j`, the same element of a column-major
/// matrix of height `h` lives at `i + j * h`. Row and column always mean axis 0 and axis 1,
/// whatever the storage order.
///
/// # Examples
///
/// ```rust
/// use lamina_tensor::{ColumnMajor, Tensor2};
///
/// let r = Tensor2::<u8>::from_shape_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
/// let c = Tensor2::<u8, ColumnMajor>::from_shape_vec([2, 2], vec![1, 3, 2, 4]).unwrap();
/// assert_eq!(r.get([0, 1]), c.get([0, 1]));
/// assert_eq!(c.strides, [1, 2]);
/// ```
pub struct Tensor<T, const N: usize, L: MemoryLayout = RowMajor, D: DeviceMarker = Cpu> {
    /// The storage of the tensor.
    pub storage: TensorStorage<T, D>,
    /// The shape of the tensor.
    pub shape: [usize; N],
    /// The strides of the tensor data in memory.
    pub strides: [usize; N],
    /// The storage-order marker.
    pub layout: L,
}

/// Decomposes a storage position into a logical index for contiguous `strides`.
fn index_from_storage_offset<const N: usize>(
    offset: usize,
    shape: [usize; N],
    strides: [usize; N],
) -> [usize; N] {
    let mut index = [0; N];
    for k in 0..N {
        index[k] = (offset / strides[k]) % shape[k];
    }
    index
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> Tensor<T, N, L, D> {
    /// Get the data of the tensor as a pointer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }

    /// Get the data of the tensor as a mutable pointer.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr()
    }

    /// Consumes the tensor and returns the underlying vector in storage order.
    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.storage.into_vec()
    }

    /// Returns the memory space where the tensor is allocated.
    #[inline]
    pub fn device(&self) -> crate::device::Device {
        self.storage.device()
    }

    /// Creates a new `Tensor` with the given shape and data.
    ///
    /// The data is taken in storage order, i.e. row by row for [`RowMajor`] and column by
    /// column for [`crate::ColumnMajor`].
    ///
    /// # Errors
    ///
    /// If the number of elements in the data does not match the shape of the tensor, an error is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::Tensor2;
    ///
    /// let t = Tensor2::<u8>::from_shape_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
    /// assert_eq!(t.shape, [2, 2]);
    /// ```
    pub fn from_shape_vec(shape: [usize; N], data: Vec<T>) -> Result<Self, TensorError> {
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            storage: TensorStorage::from_vec(data),
            shape,
            strides: L::strides(shape),
            layout: L::default(),
        })
    }

    /// Creates a new `Tensor` with the given shape and slice of data, in storage order.
    ///
    /// # Errors
    ///
    /// If the number of elements in the data does not match the shape of the tensor, an error is returned.
    pub fn from_shape_slice(shape: [usize; N], data: &[T]) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        Self::from_shape_vec(shape, data.to_vec())
    }

    /// Creates a new `Tensor` with the given shape, every element set to `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::{Tensor1, Tensor2};
    ///
    /// let t = Tensor1::<u8>::from_shape_val([4], 0);
    /// assert_eq!(t.as_slice(), vec![0, 0, 0, 0]);
    ///
    /// let t = Tensor2::<u8>::from_shape_val([2, 2], 1);
    /// assert_eq!(t.as_slice(), vec![1, 1, 1, 1]);
    /// ```
    pub fn from_shape_val(shape: [usize; N], value: T) -> Self
    where
        T: Clone,
    {
        let numel = shape.iter().product::<usize>();
        Self {
            storage: TensorStorage::from_vec(vec![value; numel]),
            shape,
            strides: L::strides(shape),
            layout: L::default(),
        }
    }

    /// Create a new `Tensor` with the given shape and a function to generate the data.
    ///
    /// The function `f` is called with the logical index of each element, independently of
    /// the storage order.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::{ColumnMajor, Tensor2};
    ///
    /// let t = Tensor2::<u8>::from_shape_fn([2, 2], |[i, j]| (i * 2 + j) as u8);
    /// assert_eq!(t.as_slice(), vec![0, 1, 2, 3]);
    ///
    /// let t = Tensor2::<u8, ColumnMajor>::from_shape_fn([2, 2], |[i, j]| (i * 2 + j) as u8);
    /// assert_eq!(t.as_slice(), vec![0, 2, 1, 3]);
    /// ```
    pub fn from_shape_fn<F>(shape: [usize; N], f: F) -> Self
    where
        F: Fn([usize; N]) -> T,
    {
        let numel = shape.iter().product::<usize>();
        let strides = L::strides(shape);
        let data: Vec<T> = (0..numel)
            .map(|offset| f(index_from_storage_offset(offset, shape, strides)))
            .collect();
        Self {
            storage: TensorStorage::from_vec(data),
            shape,
            strides,
            layout: L::default(),
        }
    }

    /// Create a new tensor with all elements set to zero.
    pub fn zeros(shape: [usize; N]) -> Self
    where
        T: Clone + num_traits::Zero,
    {
        Self::from_shape_val(shape, T::zero())
    }

    /// Returns the number of elements in the tensor.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the storage offset of the element at the given index, or `None` if out of bounds.
    pub fn get_iter_offset(&self, index: [usize; N]) -> Option<usize> {
        let mut offset = 0;
        for ((&idx, dim_size), stride) in index.iter().zip(self.shape).zip(self.strides) {
            if idx >= dim_size {
                return None;
            }
            offset += idx * stride;
        }
        Some(offset)
    }

    /// Get the storage offset of the element at the given index without checking dim sizes.
    pub fn get_iter_offset_unchecked(&self, index: [usize; N]) -> usize {
        let mut offset = 0;
        for (&idx, stride) in index.iter().zip(self.strides) {
            offset += idx * stride;
        }
        offset
    }

    /// Return a read-only view over the whole tensor.
    pub fn view(&self) -> TensorView<'_, T, N, L, D> {
        TensorView {
            storage: &self.storage,
            offset: 0,
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        }
    }

    /// Return a mutable view over the whole tensor.
    pub fn view_mut(&mut self) -> TensorViewMut<'_, T, N, L, D> {
        TensorViewMut {
            storage: &mut self.storage,
            offset: 0,
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        }
    }
}

impl<T, const N: usize, L: MemoryLayout, D: CpuDevice> Tensor<T, N, L, D> {
    /// Returns the tensor data as a slice, in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// Returns the tensor data as a mutable slice, in storage order.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    /// Returns an iterator over the elements in storage order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Get the element at the given index without checking if the index is out of bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::Tensor2;
    ///
    /// let t = Tensor2::<u8>::from_shape_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
    /// assert_eq!(*t.get_unchecked([0, 1]), 2);
    /// assert_eq!(*t.get_unchecked([1, 0]), 3);
    /// ```
    pub fn get_unchecked(&self, index: [usize; N]) -> &T {
        let offset = self.get_iter_offset_unchecked(index);
        unsafe { self.storage.as_slice().get_unchecked(offset) }
    }

    /// Get the element at the given index, or `None` if the index is out of bounds.
    pub fn get(&self, index: [usize; N]) -> Option<&T> {
        self.get_iter_offset(index)
            .and_then(|i| self.storage.as_slice().get(i))
    }

    /// Get a mutable reference to the element at the given index, or `None` if out of bounds.
    pub fn get_mut(&mut self, index: [usize; N]) -> Option<&mut T> {
        self.get_iter_offset(index)
            .and_then(|i| self.storage.as_mut_slice().get_mut(i))
    }

    /// Apply a function to each element of the tensor.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::Tensor1;
    ///
    /// let t = Tensor1::<u8>::from_shape_vec([4], vec![1, 2, 3, 4]).unwrap();
    /// let t2 = t.map(|x| *x + 1);
    /// assert_eq!(t2.as_slice(), vec![2, 3, 4, 5]);
    /// ```
    pub fn map<U, F>(&self, f: F) -> Tensor<U, N, L, D>
    where
        F: Fn(&T) -> U,
    {
        Tensor {
            storage: TensorStorage::from_vec(self.as_slice().iter().map(f).collect()),
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        }
    }

    /// Copies the tensor into another storage order.
    ///
    /// The logical content is unchanged; only the physical arrangement of the elements
    /// differs. This is the copying counterpart of [`Tensor::transposed_view`].
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::{ColumnMajor, Tensor2};
    ///
    /// let t = Tensor2::<u8>::from_shape_vec([2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    /// let c = t.to_layout::<ColumnMajor>();
    /// assert_eq!(c.as_slice(), &[1, 4, 2, 5, 3, 6]);
    /// assert_eq!(c.get([1, 2]), Some(&6));
    /// ```
    pub fn to_layout<L2: MemoryLayout>(&self) -> Tensor<T, N, L2, D>
    where
        T: Clone,
    {
        Tensor::from_shape_fn(self.shape, |index| self.get_unchecked(index).clone())
    }

    /// Cast the tensor to a new element type.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::CastError`] if any value is not representable in `U`.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::Tensor1;
    ///
    /// let t = Tensor1::<u8>::from_shape_vec([4], vec![1, 2, 3, 4]).unwrap();
    /// let t2 = t.cast::<f32>().unwrap();
    /// assert_eq!(t2.as_slice(), vec![1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn cast<U>(&self) -> Result<Tensor<U, N, L, D>, TensorError>
    where
        T: num_traits::ToPrimitive + Copy,
        U: num_traits::NumCast,
    {
        let data = self
            .as_slice()
            .iter()
            .map(|&x| U::from(x).ok_or(TensorError::CastError))
            .collect::<Result<Vec<U>, _>>()?;
        Ok(Tensor {
            storage: TensorStorage::from_vec(data),
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        })
    }
}

impl<T, L: MemoryLayout, D: DeviceMarker> Tensor<T, 2, L, D> {
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

    /// Creates a transposed view with the opposite storage order.
    ///
    /// No element is copied or moved: the view reinterprets the same buffer with the shape
    /// and the strides swapped, so element `[j, i]` of the view is element `[i, j]` of the
    /// tensor. The view borrows the tensor and cannot outlive it.
    ///
    /// Prefer [`Tensor::to_layout`] or a copying transpose for code that does not need to
    /// alias the buffer; the view is kept mainly for the product kernels.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::{ColumnMajor, Tensor2};
    ///
    /// let t = Tensor2::<u8>::from_shape_vec([2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    /// let tv = t.transposed_view();
    /// assert_eq!(tv.shape, [3, 2]);
    /// assert_eq!(tv.layout, ColumnMajor);
    /// assert_eq!(tv.get([2, 1]), Some(&6));
    /// assert_eq!(tv.get([0, 1]), Some(&4));
    /// ```
    pub fn transposed_view(&self) -> TensorView<'_, T, 2, L::Transposed, D> {
        self.view().transposed()
    }

    /// Mutable variant of [`Tensor::transposed_view`].
    pub fn transposed_view_mut(&mut self) -> TensorViewMut<'_, T, 2, L::Transposed, D> {
        self.view_mut().transposed()
    }

    /// Creates a view onto a rectangular block of the matrix.
    ///
    /// The block covers rows `start_row..start_row + num_rows` and columns
    /// `start_col..start_col + num_cols`. The view keeps the tensor's strides, so any block can
    /// be addressed in either storage order.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::IndexOutOfBounds`] if the block does not fit in the matrix.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_tensor::Tensor2;
    ///
    /// let t = Tensor2::<u8>::from_shape_fn([3, 3], |[i, j]| (i * 3 + j) as u8);
    /// let block = t.block_view(1, 2, 1, 2).unwrap();
    /// assert_eq!(block.shape, [2, 2]);
    /// assert_eq!(block.as_contiguous().as_slice(), &[4, 5, 7, 8]);
    /// ```
    pub fn block_view(
        &self,
        start_row: usize,
        num_rows: usize,
        start_col: usize,
        num_cols: usize,
    ) -> Result<TensorView<'_, T, 2, L, D>, TensorError> {
        if start_row + num_rows > self.shape[0] {
            return Err(TensorError::index_out_of_bounds(
                start_row + num_rows,
                self.shape[0],
            ));
        }
        if start_col + num_cols > self.shape[1] {
            return Err(TensorError::index_out_of_bounds(
                start_col + num_cols,
                self.shape[1],
            ));
        }
        Ok(TensorView {
            storage: &self.storage,
            offset: start_row * self.strides[0] + start_col * self.strides[1],
            shape: [num_rows, num_cols],
            strides: self.strides,
            layout: self.layout,
        })
    }

    /// Mutable variant of [`Tensor::block_view`].
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::IndexOutOfBounds`] if the block does not fit in the matrix.
    pub fn block_view_mut(
        &mut self,
        start_row: usize,
        num_rows: usize,
        start_col: usize,
        num_cols: usize,
    ) -> Result<TensorViewMut<'_, T, 2, L, D>, TensorError> {
        let view = self.block_view(start_row, num_rows, start_col, num_cols)?;
        let (offset, shape) = (view.offset, view.shape);
        Ok(TensorViewMut {
            storage: &mut self.storage,
            offset,
            shape,
            strides: self.strides,
            layout: self.layout,
        })
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> Clone for Tensor<T, N, L, D>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape,
            strides: self.strides,
            layout: self.layout,
        }
    }
}

impl<T, const N: usize, L: MemoryLayout, D: DeviceMarker> std::fmt::Debug for Tensor<T, N, L, D>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("layout", &L::KIND)
            .field("device", &D::device_info())
            .finish()
    }
}
