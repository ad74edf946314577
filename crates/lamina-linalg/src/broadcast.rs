use lamina_tensor::{
    AsTensorView, AsTensorViewMut, CpuDevice, LayoutKind, MemoryLayout, RowMajor, TensorError,
    TensorView,
};
use num_traits::{Float, NumCast};

use crate::error::LinalgError;

/// Elementwise operator combining a matrix element `x` with a vector element `y`.
///
/// Numeric parameters ride inside the variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryFunctor<T> {
    /// `x + y`
    Add,
    /// `x - y`
    Subtract,
    /// `x * y`
    Multiply,
    /// `x / y`
    Divide,
    /// `min(x, y)`
    Min,
    /// `max(x, y)`
    Max,
    /// `x` raised to the power `y`
    Pow,
    /// Four-quadrant arctangent of `x / y`
    Atan2,
    /// `sqrt(x^2 + y^2)`
    Norm,
    /// `ln(exp(x) + exp(y))`, stabilised by the larger argument
    LogAddExp,
    /// `a * x + y`
    Axpy(T),
    /// `x + b * y`
    Xpby(T),
    /// `a * x + b * y`
    Axpby(T, T),
}

impl<T: Float> BinaryFunctor<T> {
    /// Applies the functor.
    ///
    /// ```
    /// use lamina_linalg::broadcast::BinaryFunctor;
    ///
    /// assert_eq!(BinaryFunctor::Axpby(2.0, 3.0).apply(1.0, 1.0), 5.0);
    /// assert_eq!(BinaryFunctor::<f64>::Norm.apply(3.0, 4.0), 5.0);
    /// ```
    #[inline]
    pub fn apply(self, x: T, y: T) -> T {
        match self {
            BinaryFunctor::Add => x + y,
            BinaryFunctor::Subtract => x - y,
            BinaryFunctor::Multiply => x * y,
            BinaryFunctor::Divide => x / y,
            BinaryFunctor::Min => x.min(y),
            BinaryFunctor::Max => x.max(y),
            BinaryFunctor::Pow => x.powf(y),
            BinaryFunctor::Atan2 => x.atan2(y),
            BinaryFunctor::Norm => x.hypot(y),
            BinaryFunctor::LogAddExp => {
                let m = x.max(y);
                if m.is_infinite() {
                    m
                } else {
                    m + ((x - m).exp() + (y - m).exp()).ln()
                }
            }
            BinaryFunctor::Axpy(a) => a * x + y,
            BinaryFunctor::Xpby(b) => x + b * y,
            BinaryFunctor::Axpby(a, b) => a * x + b * y,
        }
    }
}

/// Validates `axis` and the vector length against a matrix shape.
fn check_broadcast(
    op: &'static str,
    shape: [usize; 2],
    axis: usize,
    v_shape: [usize; 1],
) -> Result<(), LinalgError> {
    let len = match axis {
        0 => shape[0],
        1 => shape[1],
        _ => {
            return Err(LinalgError::invalid_argument(
                "axis",
                format!("expected 0 or 1, got {axis}"),
            ))
        }
    };
    if v_shape != [len] {
        return Err(LinalgError::dimension_mismatch(op, &[len], &v_shape));
    }
    Ok(())
}

/// Converts the broadcast vector to the matrix element type.
fn cast_vector<T, V2, D>(
    v: &TensorView<'_, V2, 1, RowMajor, D>,
) -> Result<Vec<T>, LinalgError>
where
    T: Float,
    V2: NumCast + Copy,
    D: CpuDevice,
{
    (0..v.shape[0])
        .map(|k| {
            T::from(*v.get_unchecked([k])).ok_or_else(|| TensorError::CastError.into())
        })
        .collect()
}

/// Visits every index of an `h×w` matrix in storage order.
fn for_each_index<L: MemoryLayout>(shape: [usize; 2], mut f: impl FnMut(usize, usize)) {
    let [h, w] = shape;
    match L::KIND {
        LayoutKind::RowMajor => {
            for i in 0..h {
                for j in 0..w {
                    f(i, j);
                }
            }
        }
        LayoutKind::ColumnMajor => {
            for j in 0..w {
                for i in 0..h {
                    f(i, j);
                }
            }
        }
    }
}

/// Combines a matrix with a vector broadcast along `axis`.
///
/// Computes `dst[i, j] = fact_old * dst[i, j] + fact_new * bf(src[i, j], v[k])` with `k = i`
/// for axis 0 (`v` has one entry per row) and `k = j` for axis 1 (one entry per column). The
/// vector may hold another numeric type; its entries are converted to `T` up front. When
/// `fact_old` is zero the previous content of `dst` is not read. Use
/// [`matrix_op_vec_inplace`] when the destination is also the source.
///
/// # Errors
///
/// - [`LinalgError::InvalidArgument`] if `axis` is neither 0 nor 1.
/// - [`LinalgError::DimensionMismatch`] if `dst` and `src` differ in shape or `v` has the
///   wrong length.
/// - [`LinalgError::TensorError`] if an entry of `v` is not representable in `T`, or an
///   operand view reaches past its storage.
///
/// `dst` is left untouched on error.
///
/// # Example
///
/// ```
/// use lamina_linalg::broadcast::{matrix_op_vec, BinaryFunctor};
/// use lamina_tensor::{Tensor1, Tensor2};
///
/// let src = Tensor2::<f32>::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let v = Tensor1::<f32>::from_shape_vec([2], vec![10.0, 100.0]).unwrap();
/// let mut dst = Tensor2::<f32>::zeros([2, 2]);
/// matrix_op_vec(&mut dst, &src, &v, 1, BinaryFunctor::Multiply, 1.0, 0.0).unwrap();
/// assert_eq!(dst.as_slice(), &[10.0, 200.0, 30.0, 400.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn matrix_op_vec<T, V2, L, D, Dst, Src, Vec1>(
    dst: &mut Dst,
    src: &Src,
    v: &Vec1,
    axis: usize,
    bf: BinaryFunctor<T>,
    fact_new: T,
    fact_old: T,
) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    Dst: AsTensorViewMut<T, 2, L, D>,
    Src: AsTensorView<T, 2, L, D>,
    V2: NumCast + Copy,
    Vec1: AsTensorView<V2, 1, RowMajor, D>,
{
    let src = src.as_tensor_view();
    let v = v.as_tensor_view();
    let mut dst = dst.as_tensor_view_mut();

    if dst.shape != src.shape {
        return Err(LinalgError::dimension_mismatch(
            "matrix_op_vec",
            &src.shape,
            &dst.shape,
        ));
    }
    check_broadcast("matrix_op_vec", src.shape, axis, v.shape)?;
    src.check_extent()?;
    v.check_extent()?;
    dst.check_extent()?;
    let ys = cast_vector::<T, _, _>(&v)?;

    log::trace!("matrix_op_vec: along axis {axis} of {:?}", src.shape);

    for_each_index::<L>(src.shape, |i, j| {
        let y = ys[if axis == 0 { i } else { j }];
        let value = fact_new * bf.apply(*src.get_unchecked([i, j]), y);
        let d = dst.get_unchecked_mut([i, j]);
        *d = if fact_old.is_zero() {
            value
        } else {
            fact_old * *d + value
        };
    });

    Ok(())
}

/// In-place variant of [`matrix_op_vec`]: `a[i, j] = fact_old * a[i, j] + fact_new * bf(a[i, j], v[k])`.
///
/// # Errors
///
/// - [`LinalgError::InvalidArgument`] if `axis` is neither 0 nor 1.
/// - [`LinalgError::DimensionMismatch`] if `v` has the wrong length.
/// - [`LinalgError::TensorError`] if an entry of `v` is not representable in `T`.
pub fn matrix_op_vec_inplace<T, V2, L, D, A, Vec1>(
    a: &mut A,
    v: &Vec1,
    axis: usize,
    bf: BinaryFunctor<T>,
    fact_new: T,
    fact_old: T,
) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    V2: NumCast + Copy,
    Vec1: AsTensorView<V2, 1, RowMajor, D>,
{
    let v = v.as_tensor_view();
    let mut a = a.as_tensor_view_mut();

    check_broadcast("matrix_op_vec_inplace", a.shape, axis, v.shape)?;
    v.check_extent()?;
    a.check_extent()?;
    let ys = cast_vector::<T, _, _>(&v)?;

    log::trace!("matrix_op_vec_inplace: along axis {axis} of {:?}", a.shape);

    for_each_index::<L>(a.shape, |i, j| {
        let y = ys[if axis == 0 { i } else { j }];
        let x = a.get_unchecked_mut([i, j]);
        let value = fact_new * bf.apply(*x, y);
        *x = if fact_old.is_zero() {
            value
        } else {
            fact_old * *x + value
        };
    });

    Ok(())
}

/// Adds `v` to every column of `a`; `v` has one entry per row.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v.len() != a.height`.
#[deprecated(note = "use `matrix_op_vec_inplace(a, v, 0, BinaryFunctor::Add, 1, 0)`")]
pub fn matrix_plus_col<T, L, D, A, Vec1>(a: &mut A, v: &Vec1) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    Vec1: AsTensorView<T, 1, RowMajor, D>,
{
    matrix_op_vec_inplace(a, v, 0, BinaryFunctor::Add, T::one(), T::zero())
}

/// Multiplies every column of `a` pointwise by `v`; `v` has one entry per row.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v.len() != a.height`.
#[deprecated(note = "use `matrix_op_vec_inplace(a, v, 0, BinaryFunctor::Multiply, 1, 0)`")]
pub fn matrix_times_col<T, L, D, A, Vec1>(a: &mut A, v: &Vec1) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    Vec1: AsTensorView<T, 1, RowMajor, D>,
{
    matrix_op_vec_inplace(a, v, 0, BinaryFunctor::Multiply, T::one(), T::zero())
}

/// Divides every column of `a` pointwise by `v`; `v` has one entry per row.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v.len() != a.height`.
#[deprecated(note = "use `matrix_op_vec_inplace(a, v, 0, BinaryFunctor::Divide, 1, 0)`")]
pub fn matrix_divide_col<T, L, D, A, Vec1>(a: &mut A, v: &Vec1) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    Vec1: AsTensorView<T, 1, RowMajor, D>,
{
    matrix_op_vec_inplace(a, v, 0, BinaryFunctor::Divide, T::one(), T::zero())
}

/// Adds `v` to every row of `a`; `v` has one entry per column.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v.len() != a.width`.
#[deprecated(note = "use `matrix_op_vec_inplace(a, v, 1, BinaryFunctor::Add, 1, 0)`")]
pub fn matrix_plus_row<T, L, D, A, Vec1>(a: &mut A, v: &Vec1) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    Vec1: AsTensorView<T, 1, RowMajor, D>,
{
    matrix_op_vec_inplace(a, v, 1, BinaryFunctor::Add, T::one(), T::zero())
}

/// Multiplies every row of `a` pointwise by `v`; `v` has one entry per column.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v.len() != a.width`.
#[deprecated(note = "use `matrix_op_vec_inplace(a, v, 1, BinaryFunctor::Multiply, 1, 0)`")]
pub fn matrix_times_row<T, L, D, A, Vec1>(a: &mut A, v: &Vec1) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    Vec1: AsTensorView<T, 1, RowMajor, D>,
{
    matrix_op_vec_inplace(a, v, 1, BinaryFunctor::Multiply, T::one(), T::zero())
}

/// Divides every row of `a` pointwise by `v`; `v` has one entry per column.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `v.len() != a.width`.
#[deprecated(note = "use `matrix_op_vec_inplace(a, v, 1, BinaryFunctor::Divide, 1, 0)`")]
pub fn matrix_divide_row<T, L, D, A, Vec1>(a: &mut A, v: &Vec1) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    A: AsTensorViewMut<T, 2, L, D>,
    Vec1: AsTensorView<T, 1, RowMajor, D>,
{
    matrix_op_vec_inplace(a, v, 1, BinaryFunctor::Divide, T::one(), T::zero())
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lamina_tensor::{ColumnMajor, Tensor1, Tensor2};

    #[test]
    fn test_binary_functors() {
        assert_eq!(BinaryFunctor::Add.apply(2.0f32, 3.0), 5.0);
        assert_eq!(BinaryFunctor::Subtract.apply(2.0f32, 3.0), -1.0);
        assert_eq!(BinaryFunctor::Multiply.apply(2.0f32, 3.0), 6.0);
        assert_eq!(BinaryFunctor::Divide.apply(3.0f32, 2.0), 1.5);
        assert_eq!(BinaryFunctor::Min.apply(2.0f32, 3.0), 2.0);
        assert_eq!(BinaryFunctor::Max.apply(2.0f32, 3.0), 3.0);
        assert_eq!(BinaryFunctor::Pow.apply(2.0f32, 3.0), 8.0);
        assert_relative_eq!(
            BinaryFunctor::Atan2.apply(1.0f64, 1.0),
            std::f64::consts::FRAC_PI_4
        );
        assert_eq!(BinaryFunctor::Axpy(2.0f32).apply(2.0, 3.0), 7.0);
        assert_eq!(BinaryFunctor::Xpby(2.0f32).apply(2.0, 3.0), 8.0);
        assert_eq!(BinaryFunctor::Axpby(2.0f32, -1.0).apply(2.0, 3.0), 1.0);
    }

    #[test]
    fn test_binary_log_add_exp() {
        assert_relative_eq!(
            BinaryFunctor::LogAddExp.apply(1e4f64, 1e4),
            1e4 + 2f64.ln()
        );
        assert_eq!(
            BinaryFunctor::LogAddExp.apply(f64::NEG_INFINITY, f64::NEG_INFINITY),
            f64::NEG_INFINITY
        );
        assert_relative_eq!(BinaryFunctor::LogAddExp.apply(f64::NEG_INFINITY, 0.0), 0.0);
    }

    #[test]
    fn test_matrix_op_vec_axes() -> Result<(), LinalgError> {
        let src = Tensor2::<f64>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let col = Tensor1::<f64>::from_shape_vec([2], vec![10.0, 20.0])?;
        let row = Tensor1::<f64>::from_shape_vec([3], vec![1.0, 2.0, 3.0])?;

        let mut dst = Tensor2::<f64>::from_shape_val([2, 3], f64::NAN);
        matrix_op_vec(&mut dst, &src, &col, 0, BinaryFunctor::Add, 1.0, 0.0)?;
        assert_eq!(dst.as_slice(), &[11.0, 12.0, 13.0, 24.0, 25.0, 26.0]);

        matrix_op_vec(&mut dst, &src, &row, 1, BinaryFunctor::Subtract, 2.0, 1.0)?;
        assert_eq!(dst.as_slice(), &[11.0, 12.0, 13.0, 30.0, 31.0, 32.0]);
        Ok(())
    }

    #[test]
    fn test_matrix_op_vec_column_major() -> Result<(), LinalgError> {
        let src = Tensor2::<f32, ColumnMajor>::from_shape_fn([2, 3], |[i, j]| (i * 3 + j + 1) as f32);
        let v = Tensor1::<f32>::from_shape_vec([3], vec![1.0, 10.0, 100.0])?;
        let mut dst = Tensor2::<f32, ColumnMajor>::zeros([2, 3]);
        matrix_op_vec(&mut dst, &src, &v, 1, BinaryFunctor::Multiply, 1.0, 0.0)?;
        assert_eq!(dst.get([0, 2]), Some(&300.0));
        assert_eq!(dst.get([1, 1]), Some(&50.0));
        Ok(())
    }

    #[test]
    fn test_matrix_op_vec_errors() -> Result<(), LinalgError> {
        let src = Tensor2::<f32>::zeros([2, 3]);
        let v = Tensor1::<f32>::zeros([3]);
        let mut dst = Tensor2::<f32>::from_shape_val([2, 3], 4.0);

        let res = matrix_op_vec(&mut dst, &src, &v, 0, BinaryFunctor::Add, 1.0, 0.0);
        assert!(matches!(res, Err(LinalgError::DimensionMismatch { .. })));

        let res = matrix_op_vec(&mut dst, &src, &v, 2, BinaryFunctor::Add, 1.0, 0.0);
        assert!(matches!(res, Err(LinalgError::InvalidArgument { arg: "axis", .. })));

        let mut small = Tensor2::<f32>::zeros([3, 3]);
        let res = matrix_op_vec(&mut small, &src, &v, 1, BinaryFunctor::Add, 1.0, 0.0);
        assert!(matches!(res, Err(LinalgError::DimensionMismatch { .. })));

        assert_eq!(dst.as_slice(), &[4.0; 6]);
        Ok(())
    }

    #[test]
    fn test_matrix_op_vec_other_vector_type() -> Result<(), LinalgError> {
        let src = Tensor2::<f64>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let idx = Tensor1::<u8>::from_shape_vec([2], vec![1, 3])?;
        let mut dst = Tensor2::<f64>::zeros([2, 3]);
        matrix_op_vec(&mut dst, &src, &idx, 0, BinaryFunctor::Multiply, 1.0, 0.0)?;
        assert_eq!(dst.as_slice(), &[1.0, 2.0, 3.0, 12.0, 15.0, 18.0]);

        let mut a = Tensor2::<f32, ColumnMajor>::from_shape_val([2, 2], 1.0);
        let offsets = Tensor1::<i32>::from_shape_vec([2], vec![-1, 2])?;
        matrix_op_vec_inplace(&mut a, &offsets, 1, BinaryFunctor::Add, 1.0, 0.0)?;
        assert_eq!(a.as_slice(), &[0.0, 0.0, 3.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_matrix_op_vec_view_past_storage() -> Result<(), LinalgError> {
        let src = Tensor2::<f32>::from_shape_val([2, 2], 1.0);
        let backing = Tensor1::<f32>::from_shape_val([1], 1.0);
        let mut v = backing.view();
        v.shape = [2];
        let mut dst = Tensor2::<f32>::from_shape_val([2, 2], 4.0);

        let res = matrix_op_vec(&mut dst, &src, &v, 0, BinaryFunctor::Add, 1.0, 0.0);
        assert!(matches!(res, Err(LinalgError::TensorError(_))));
        let res = matrix_op_vec_inplace(&mut dst, &v, 1, BinaryFunctor::Add, 1.0, 0.0);
        assert!(matches!(res, Err(LinalgError::TensorError(_))));
        assert_eq!(dst.as_slice(), &[4.0; 4]);
        Ok(())
    }

    #[test]
    fn test_inplace_with_factors() -> Result<(), LinalgError> {
        let mut a = Tensor2::<f64>::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0])?;
        let v = Tensor1::<f64>::from_shape_vec([2], vec![1.0, 2.0])?;
        matrix_op_vec_inplace(&mut a, &v, 0, BinaryFunctor::Multiply, 0.5, 1.0)?;
        assert_eq!(a.as_slice(), &[1.5, 3.0, 6.0, 8.0]);
        Ok(())
    }

    #[test]
    fn test_legacy_col_wrappers() -> Result<(), LinalgError> {
        let mut a = Tensor2::<f32>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let v = Tensor1::<f32>::from_shape_vec([2], vec![10.0, 20.0])?;
        matrix_plus_col(&mut a, &v)?;
        assert_eq!(a.as_slice(), &[11.0, 12.0, 13.0, 24.0, 25.0, 26.0]);

        let v = Tensor1::<f32>::from_shape_vec([2], vec![2.0, 0.5])?;
        matrix_times_col(&mut a, &v)?;
        assert_eq!(a.as_slice(), &[22.0, 24.0, 26.0, 12.0, 12.5, 13.0]);
        matrix_divide_col(&mut a, &v)?;
        assert_eq!(a.as_slice(), &[11.0, 12.0, 13.0, 24.0, 25.0, 26.0]);

        let wrong = Tensor1::<f32>::zeros([3]);
        assert!(matrix_plus_col(&mut a, &wrong).is_err());

        let mut inf = Tensor2::<f32>::from_shape_val([2, 1], f32::INFINITY);
        matrix_plus_col(&mut inf, &v)?;
        assert_eq!(inf.as_slice(), &[f32::INFINITY; 2]);
        Ok(())
    }

    #[test]
    fn test_legacy_row_wrappers() -> Result<(), LinalgError> {
        let mut a = Tensor2::<f64, ColumnMajor>::from_shape_val([2, 3], 1.0);
        let v = Tensor1::<f64>::from_shape_vec([3], vec![1.0, 2.0, 4.0])?;
        matrix_plus_row(&mut a, &v)?;
        matrix_times_row(&mut a, &v)?;
        matrix_divide_row(&mut a, &v)?;
        for i in 0..2 {
            assert_eq!(a.get([i, 0]), Some(&2.0));
            assert_eq!(a.get([i, 1]), Some(&3.0));
            assert_eq!(a.get([i, 2]), Some(&5.0));
        }

        let wrong = Tensor1::<f64>::zeros([2]);
        assert!(matrix_times_row(&mut a, &wrong).is_err());
        Ok(())
    }
}
