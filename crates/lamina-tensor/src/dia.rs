//! Diagonal (DIA) sparse matrix storage.
//!
//! A banded matrix is stored as a list of diagonal offsets (0 = main, +k = k-th super
//! diagonal, -k = k-th sub diagonal) together with one dense lane per diagonal. Lanes are
//! indexed by row: entry `[i, i + offset]` of the `d`-th diagonal is `lane(d)[i]`. Slots whose
//! column falls outside the matrix are stored but never read.
//!
//! ```
//! use lamina_tensor::DiaMatrix;
//!
//! // [ 2 -1  0]
//! // [-1  2 -1]
//! // [ 0 -1  2]
//! let dia = DiaMatrix::<f32>::from_diagonals(
//!     3,
//!     3,
//!     vec![-1, 0, 1],
//!     vec![
//!         0.0, -1.0, -1.0, // sub diagonal, row 0 has no entry
//!         2.0, 2.0, 2.0, // main diagonal
//!         -1.0, -1.0, 0.0, // super diagonal, row 2 has no entry
//!     ],
//! )
//! .unwrap();
//! assert_eq!(dia.get(1, 0), -1.0);
//! assert_eq!(dia.get(0, 2), 0.0);
//! ```

use num_traits::Zero;

use crate::{
    device_marker::{Cpu, CpuDevice, DeviceMarker},
    layout::MemoryLayout,
    storage::TensorStorage,
    Tensor, TensorError,
};

/// Sparse matrix stored by diagonals.
///
/// Offsets are kept sorted and unique. Each diagonal owns a lane of `height` elements.
pub struct DiaMatrix<T, D: DeviceMarker = Cpu> {
    storage: TensorStorage<T, D>,
    offsets: Vec<isize>,
    height: usize,
    width: usize,
}

impl<T, D: DeviceMarker> DiaMatrix<T, D> {
    /// Creates a matrix from its offsets and the concatenated diagonal lanes.
    ///
    /// `data` holds `offsets.len()` lanes of `height` elements each, in the order of
    /// `offsets`. Offsets are sorted on construction, lanes follow them.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidDiagonals`] if an offset is repeated or lies outside
    /// `(-height, width)`, and [`TensorError::InvalidShape`] if `data` does not hold exactly one
    /// lane per offset.
    pub fn from_diagonals(
        height: usize,
        width: usize,
        offsets: Vec<isize>,
        data: Vec<T>,
    ) -> Result<Self, TensorError> {
        let expected = offsets.len() * height;
        if data.len() != expected {
            return Err(TensorError::invalid_shape(expected, data.len()));
        }
        for &offset in &offsets {
            if offset <= -(height as isize) || offset >= width as isize {
                return Err(TensorError::InvalidDiagonals(format!(
                    "offset {offset} out of bounds for {height}x{width} matrix"
                )));
            }
        }

        let mut order: Vec<usize> = (0..offsets.len()).collect();
        order.sort_by_key(|&d| offsets[d]);
        if order.windows(2).any(|w| offsets[w[0]] == offsets[w[1]]) {
            return Err(TensorError::InvalidDiagonals(
                "offsets must be unique".to_string(),
            ));
        }

        let sorted_offsets = order.iter().map(|&d| offsets[d]).collect();
        let data = if order.iter().enumerate().all(|(k, &d)| k == d) {
            data
        } else {
            let mut lanes: Vec<Option<T>> = data.into_iter().map(Some).collect();
            order
                .iter()
                .flat_map(|&d| d * height..(d + 1) * height)
                .filter_map(|i| lanes[i].take())
                .collect()
        };

        Ok(Self {
            storage: TensorStorage::from_vec(data),
            offsets: sorted_offsets,
            height,
            width,
        })
    }

    /// Creates a matrix with the given diagonals, all entries set to zero.
    ///
    /// # Errors
    ///
    /// See [`DiaMatrix::from_diagonals`].
    pub fn zeros(height: usize, width: usize, offsets: Vec<isize>) -> Result<Self, TensorError>
    where
        T: Clone + Zero,
    {
        let data = vec![T::zero(); offsets.len() * height];
        Self::from_diagonals(height, width, offsets, data)
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Sorted diagonal offsets.
    #[inline]
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    /// Number of stored diagonals.
    #[inline]
    pub fn num_diagonals(&self) -> usize {
        self.offsets.len()
    }

    /// Row range `[start, end)` whose entries on the diagonal `offset` fall inside the matrix.
    pub fn row_range(&self, offset: isize) -> std::ops::Range<usize> {
        let start = (-offset).max(0) as usize;
        let end = (self.width as isize - offset).clamp(0, self.height as isize) as usize;
        start..end.max(start)
    }

    /// Memory space where the diagonals are stored.
    pub fn device(&self) -> crate::device::Device {
        self.storage.device()
    }
}

impl<T, D: CpuDevice> DiaMatrix<T, D> {
    /// All lanes, concatenated in offset order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// The lane of the `d`-th stored diagonal, indexed by row.
    ///
    /// # Panics
    ///
    /// Panics if `d >= self.num_diagonals()`.
    pub fn diagonal(&self, d: usize) -> &[T] {
        &self.storage.as_slice()[d * self.height..(d + 1) * self.height]
    }

    /// Mutable lane of the `d`-th stored diagonal.
    ///
    /// # Panics
    ///
    /// Panics if `d >= self.num_diagonals()`.
    pub fn diagonal_mut(&mut self, d: usize) -> &mut [T] {
        let height = self.height;
        &mut self.storage.as_mut_slice()[d * height..(d + 1) * height]
    }

    /// Iterates over `(offset, lane)` pairs.
    pub fn diagonals(&self) -> impl Iterator<Item = (isize, &[T])> + '_ {
        self.offsets
            .iter()
            .enumerate()
            .map(move |(d, &offset)| (offset, self.diagonal(d)))
    }

    /// Value at `[row, col]`; zero if no stored diagonal covers it or it is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> T
    where
        T: Copy + Zero,
    {
        if row >= self.height || col >= self.width {
            return T::zero();
        }
        let offset = col as isize - row as isize;
        match self.offsets.binary_search(&offset) {
            Ok(d) => self.diagonal(d)[row],
            Err(_) => T::zero(),
        }
    }

    /// Extracts the diagonals listed in `offsets` from a dense matrix.
    ///
    /// Entries of `dense` that lie on other diagonals are dropped.
    ///
    /// # Errors
    ///
    /// See [`DiaMatrix::from_diagonals`].
    pub fn from_dense<L: MemoryLayout>(
        dense: &Tensor<T, 2, L, D>,
        offsets: Vec<isize>,
    ) -> Result<Self, TensorError>
    where
        T: Copy + Zero,
    {
        let [height, width] = dense.shape;
        let mut dia = Self::zeros(height, width, offsets)?;
        for d in 0..dia.num_diagonals() {
            let offset = dia.offsets[d];
            let rows = dia.row_range(offset);
            let lane = dia.diagonal_mut(d);
            for i in rows {
                lane[i] = *dense.get_unchecked([i, (i as isize + offset) as usize]);
            }
        }
        Ok(dia)
    }

    /// Expands the matrix into a dense tensor.
    pub fn to_dense<L: MemoryLayout>(&self) -> Tensor<T, 2, L, D>
    where
        T: Copy + Zero,
    {
        Tensor::from_shape_fn([self.height, self.width], |[i, j]| self.get(i, j))
    }
}

impl<T: Clone, D: DeviceMarker> Clone for DiaMatrix<T, D> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            offsets: self.offsets.clone(),
            height: self.height,
            width: self.width,
        }
    }
}

impl<T, D: DeviceMarker> std::fmt::Debug for DiaMatrix<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiaMatrix")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("offsets", &self.offsets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnMajor, Tensor2};

    #[test]
    fn test_identity() -> Result<(), TensorError> {
        let dia = DiaMatrix::<f32>::from_diagonals(3, 3, vec![0], vec![1.0; 3])?;
        assert_eq!(dia.num_diagonals(), 1);
        assert_eq!(dia.get(1, 1), 1.0);
        assert_eq!(dia.get(1, 2), 0.0);
        assert_eq!(dia.get(3, 0), 0.0);
        Ok(())
    }

    #[test]
    fn test_offsets_sorted_with_lanes() -> Result<(), TensorError> {
        let dia = DiaMatrix::<i32>::from_diagonals(2, 3, vec![1, -1, 0], vec![1, 2, 3, 4, 5, 6])?;
        assert_eq!(dia.offsets(), &[-1, 0, 1]);
        assert_eq!(dia.diagonal(0), &[3, 4]);
        assert_eq!(dia.diagonal(1), &[5, 6]);
        assert_eq!(dia.diagonal(2), &[1, 2]);
        assert_eq!(dia.get(1, 0), 4);
        assert_eq!(dia.get(0, 1), 1);
        assert_eq!(dia.get(1, 2), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_offsets() {
        let res = DiaMatrix::<f32>::from_diagonals(2, 2, vec![0, 0], vec![0.0; 4]);
        assert!(matches!(res, Err(TensorError::InvalidDiagonals(_))));

        let res = DiaMatrix::<f32>::from_diagonals(2, 2, vec![2], vec![0.0; 2]);
        assert!(matches!(res, Err(TensorError::InvalidDiagonals(_))));

        let res = DiaMatrix::<f32>::from_diagonals(2, 2, vec![-2], vec![0.0; 2]);
        assert!(matches!(res, Err(TensorError::InvalidDiagonals(_))));

        let res = DiaMatrix::<f32>::from_diagonals(2, 2, vec![0], vec![0.0; 3]);
        assert_eq!(res.err(), Some(TensorError::invalid_shape(2, 3)));
    }

    #[test]
    fn test_row_range() -> Result<(), TensorError> {
        let dia = DiaMatrix::<f32>::zeros(3, 5, vec![-2, 0, 3])?;
        assert_eq!(dia.row_range(-2), 2..3);
        assert_eq!(dia.row_range(0), 0..3);
        assert_eq!(dia.row_range(3), 0..2);
        Ok(())
    }

    #[test]
    fn test_dense_roundtrip() -> Result<(), TensorError> {
        let dense = Tensor2::<f64, ColumnMajor>::from_shape_fn([3, 4], |[i, j]| {
            if j == i || j == i + 1 {
                (i * 4 + j + 1) as f64
            } else {
                0.0
            }
        });
        let dia = DiaMatrix::from_dense(&dense, vec![0, 1])?;
        assert_eq!(dia.diagonal(0), &[1.0, 6.0, 11.0]);
        assert_eq!(dia.diagonal(1), &[2.0, 7.0, 12.0]);
        let back = dia.to_dense::<ColumnMajor>();
        assert_eq!(back.as_slice(), dense.as_slice());
        Ok(())
    }
}
