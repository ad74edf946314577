use lamina_tensor::{AsTensorView, AsTensorViewMut, CpuDevice, DiaMatrix, RowMajor};
use num_traits::Float;

use crate::{blas3::Transpose, error::LinalgError};

/// Diagonal sparse matrix times dense vector: `dst = fact_c * dst + fact_av * opA(A) * v`.
///
/// Only the stored diagonals are visited. With [`Transpose::Yes`] the entry `A[i, i + offset]`
/// contributes to row `i + offset` of the result instead of row `i`. When `fact_c` is zero the
/// previous content of `dst` is not read.
///
/// # Arguments
///
/// * `dst` - Destination vector, `rows(opA(A))` long.
/// * `a` - The sparse matrix.
/// * `v` - Input vector, `cols(opA(A))` long.
/// * `trans_a` - Transpose flag for `a`.
/// * `fact_av` - Scale applied to the product.
/// * `fact_c` - Scale applied to the previous content of `dst`.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v` or `dst` has the wrong length. `dst` is
/// left untouched in that case.
///
/// # Example
///
/// ```
/// use lamina_linalg::{blas3::Transpose, sparse::spmv};
/// use lamina_tensor::{DiaMatrix, Tensor1};
///
/// let a = DiaMatrix::<f32>::from_diagonals(3, 3, vec![0], vec![1.0; 3]).unwrap();
/// let v = Tensor1::<f32>::from_shape_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
/// let mut dst = Tensor1::<f32>::zeros([3]);
/// spmv(&mut dst, &a, &v, Transpose::No, 1.0, 0.0).unwrap();
/// assert_eq!(dst.as_slice(), &[1.0, 2.0, 3.0]);
/// ```
pub fn spmv<T, D, Dst, Src>(
    dst: &mut Dst,
    a: &DiaMatrix<T, D>,
    v: &Src,
    trans_a: Transpose,
    fact_av: T,
    fact_c: T,
) -> Result<(), LinalgError>
where
    T: Float,
    D: CpuDevice,
    Dst: AsTensorViewMut<T, 1, RowMajor, D>,
    Src: AsTensorView<T, 1, RowMajor, D>,
{
    let v = v.as_tensor_view();
    let mut dst = dst.as_tensor_view_mut();

    let [rows, cols] = trans_a.apply([a.height(), a.width()]);
    if v.shape != [cols] {
        return Err(LinalgError::dimension_mismatch("spmv", &[cols], &v.shape));
    }
    if dst.shape != [rows] {
        return Err(LinalgError::dimension_mismatch("spmv", &[rows], &dst.shape));
    }
    v.check_extent()?;
    dst.check_extent()?;

    log::trace!(
        "spmv: {} diagonals {}x{} trans_a={trans_a:?}",
        a.num_diagonals(),
        a.height(),
        a.width()
    );

    for i in 0..rows {
        let di = dst.get_unchecked_mut([i]);
        *di = if fact_c.is_zero() {
            T::zero()
        } else {
            fact_c * *di
        };
    }

    for (offset, lane) in a.diagonals() {
        for i in a.row_range(offset) {
            let j = (i as isize + offset) as usize;
            let (row, col) = match trans_a {
                Transpose::No => (i, j),
                Transpose::Yes => (j, i),
            };
            let di = dst.get_unchecked_mut([row]);
            *di = *di + fact_av * lane[i] * *v.get_unchecked([col]);
        }
    }

    Ok(())
}
