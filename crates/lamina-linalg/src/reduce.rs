use lamina_tensor::{
    AsTensorView, AsTensorViewMut, CpuDevice, MemoryLayout, RowMajor, Tensor, TensorError,
};
use num_traits::{Float, NumCast};

use crate::error::LinalgError;

/// Operator collapsing the values along one axis of a matrix into one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReduceFunctor {
    /// Sum of the values.
    #[default]
    Add,
    /// Sum divided by the axis length.
    Mean,
    /// Sum of the squared values.
    AddSquared,
    /// Largest value.
    Max,
    /// Index of the largest value; ties resolve to the first occurrence.
    ArgMax,
    /// Index of the smallest value; ties resolve to the first occurrence.
    ArgMin,
    /// Smallest value.
    Min,
    /// Product computed in log space, `exp(sum(ln x))`. Non-positive input gives NaN.
    Mult,
    /// `ln(sum(exp x))`, stabilised by subtracting the axis maximum.
    LogAddExp,
    /// `sum(exp x)`, stabilised by subtracting the axis maximum.
    AddExp,
}

impl ReduceFunctor {
    /// Reduces `values` to a single value.
    ///
    /// An empty input yields the identity of the functor (`0` for the sums, `1` for
    /// [`ReduceFunctor::Mult`], `-inf` for [`ReduceFunctor::LogAddExp`] and
    /// [`ReduceFunctor::Max`], `+inf` for [`ReduceFunctor::Min`], NaN for
    /// [`ReduceFunctor::Mean`]).
    ///
    /// # Errors
    ///
    /// [`ReduceFunctor::ArgMax`] and [`ReduceFunctor::ArgMin`] fail with
    /// [`LinalgError::InvalidArgument`] on an empty input, and with
    /// [`TensorError::CastError`] if the index is not representable in `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_linalg::reduce::ReduceFunctor;
    ///
    /// assert_eq!(ReduceFunctor::ArgMax.reduce(&[3.0f32, 5.0, 5.0, 2.0]).unwrap(), 1.0);
    /// let lse = ReduceFunctor::LogAddExp.reduce(&[1e4f64, 1e4]).unwrap();
    /// assert!((lse - (1e4 + 2f64.ln())).abs() < 1e-9);
    /// ```
    pub fn reduce<T: Float>(self, values: &[T]) -> Result<T, LinalgError> {
        let max = || values.iter().fold(T::neg_infinity(), |acc, &x| acc.max(x));

        let result = match self {
            ReduceFunctor::Add => sum_by(values, |x| x),
            ReduceFunctor::Mean => {
                let len = T::from(values.len()).ok_or(TensorError::CastError)?;
                sum_by(values, |x| x) / len
            }
            ReduceFunctor::AddSquared => sum_by(values, |x| x * x),
            ReduceFunctor::Max => max(),
            ReduceFunctor::Min => values.iter().fold(T::infinity(), |acc, &x| acc.min(x)),
            ReduceFunctor::ArgMax => arg_extremum(values, |x, best| x > best)?,
            ReduceFunctor::ArgMin => arg_extremum(values, |x, best| x < best)?,
            ReduceFunctor::Mult => sum_by(values, |x| x.ln()).exp(),
            ReduceFunctor::LogAddExp => {
                let m = max();
                if m.is_infinite() {
                    m
                } else {
                    m + sum_by(values, |x| (x - m).exp()).ln()
                }
            }
            ReduceFunctor::AddExp => {
                let m = max();
                if m == T::neg_infinity() {
                    T::zero()
                } else if m.is_infinite() {
                    m
                } else {
                    m.exp() * sum_by(values, |x| (x - m).exp())
                }
            }
        };

        Ok(result)
    }
}

fn sum_by<T: Float>(values: &[T], f: impl Fn(T) -> T) -> T {
    values.iter().fold(T::zero(), |acc, &x| acc + f(x))
}

/// Index of the first element preferred by `better` over every earlier candidate.
fn arg_extremum<T: Float>(values: &[T], better: impl Fn(T, T) -> bool) -> Result<T, LinalgError> {
    let (&first, rest) = values.split_first().ok_or_else(|| {
        LinalgError::invalid_argument("rf", "cannot take arg-extremum of an empty axis")
    })?;

    let mut best = first;
    let mut best_idx = 0;
    for (idx, &x) in rest.iter().enumerate() {
        if better(x, best) {
            best = x;
            best_idx = idx + 1;
        }
    }

    T::from(best_idx).ok_or_else(|| TensorError::CastError.into())
}

/// Which axis is collapsed by a reduction.
#[derive(Clone, Copy)]
enum Collapse {
    /// Collapse axis 0, one result per column.
    Rows,
    /// Collapse axis 1, one result per row.
    Cols,
}

fn reduce_along<T, V, L, D, Dst, Src>(
    op: &'static str,
    dst: &mut Dst,
    src: &Src,
    collapse: Collapse,
    rf: ReduceFunctor,
    fact_new: T,
    fact_old: T,
) -> Result<(), LinalgError>
where
    T: Float,
    V: NumCast + Copy,
    L: MemoryLayout,
    D: CpuDevice,
    Dst: AsTensorViewMut<V, 1, RowMajor, D>,
    Src: AsTensorView<T, 2, L, D>,
{
    let src = src.as_tensor_view();
    let mut dst = dst.as_tensor_view_mut();

    let [h, w] = src.shape;
    let (outer, inner) = match collapse {
        Collapse::Rows => (w, h),
        Collapse::Cols => (h, w),
    };
    if dst.shape != [outer] {
        return Err(LinalgError::dimension_mismatch(op, &[outer], &dst.shape));
    }
    src.check_extent()?;
    dst.check_extent()?;

    log::trace!("{op}: {rf:?} over {outer} lanes of length {inner}");

    let lane_value = |k: usize, l: usize| match collapse {
        Collapse::Rows => *src.get_unchecked([l, k]),
        Collapse::Cols => *src.get_unchecked([k, l]),
    };

    // every result is computed and cast before dst is written
    let mut lane = Vec::with_capacity(inner);
    let mut results = Vec::with_capacity(outer);
    for k in 0..outer {
        lane.clear();
        lane.extend((0..inner).map(|l| lane_value(k, l)));
        let mut value = fact_new * rf.reduce(&lane)?;
        if !fact_old.is_zero() {
            let old = *dst.as_view().get_unchecked([k]);
            let old = T::from(old).ok_or(TensorError::CastError)?;
            value = value + fact_old * old;
        }
        results.push(V::from(value).ok_or(TensorError::CastError)?);
    }

    for (k, value) in results.into_iter().enumerate() {
        *dst.get_unchecked_mut([k]) = value;
    }

    Ok(())
}

/// Reduces a matrix to one row: `dst = fact_old * dst + fact_new * rf(src)`.
///
/// Each column of `src` is collapsed with `rf`, so `dst` must have length `src.width`. The
/// result is computed in the element type of `src` and cast to the element type of `dst`,
/// which lets index-valued functors write into integer vectors. When `fact_old` is zero the
/// previous content of `dst` is not read.
///
/// # Errors
///
/// - [`LinalgError::DimensionMismatch`] if `dst` has the wrong length.
/// - [`LinalgError::InvalidArgument`] for an arg-extremum over an empty axis.
/// - [`TensorError::CastError`] if a result is not representable in the `dst` element type.
///
/// `dst` is left untouched on error.
///
/// # Example
///
/// ```
/// use lamina_linalg::reduce::{reduce_to_row, ReduceFunctor};
/// use lamina_tensor::{Tensor1, Tensor2};
///
/// let src = Tensor2::<f32>::from_shape_vec([2, 3], vec![1.0, 5.0, 3.0, 4.0, 2.0, 6.0]).unwrap();
/// let mut dst = Tensor1::<u32>::zeros([3]);
/// reduce_to_row(&mut dst, &src, ReduceFunctor::ArgMax, 1.0, 0.0).unwrap();
/// assert_eq!(dst.as_slice(), &[1, 0, 1]);
/// ```
pub fn reduce_to_row<T, V, L, D, Dst, Src>(
    dst: &mut Dst,
    src: &Src,
    rf: ReduceFunctor,
    fact_new: T,
    fact_old: T,
) -> Result<(), LinalgError>
where
    T: Float,
    V: NumCast + Copy,
    L: MemoryLayout,
    D: CpuDevice,
    Dst: AsTensorViewMut<V, 1, RowMajor, D>,
    Src: AsTensorView<T, 2, L, D>,
{
    reduce_along(
        "reduce_to_row",
        dst,
        src,
        Collapse::Rows,
        rf,
        fact_new,
        fact_old,
    )
}

/// Reduces a matrix to one column: `dst = fact_old * dst + fact_new * rf(src)`.
///
/// Each row of `src` is collapsed with `rf`, so `dst` must have length `src.height`.
/// Otherwise identical to [`reduce_to_row`].
///
/// # Errors
///
/// See [`reduce_to_row`].
pub fn reduce_to_col<T, V, L, D, Dst, Src>(
    dst: &mut Dst,
    src: &Src,
    rf: ReduceFunctor,
    fact_new: T,
    fact_old: T,
) -> Result<(), LinalgError>
where
    T: Float,
    V: NumCast + Copy,
    L: MemoryLayout,
    D: CpuDevice,
    Dst: AsTensorViewMut<V, 1, RowMajor, D>,
    Src: AsTensorView<T, 2, L, D>,
{
    reduce_along(
        "reduce_to_col",
        dst,
        src,
        Collapse::Cols,
        rf,
        fact_new,
        fact_old,
    )
}

/// Sums a matrix along `axis` into a new vector.
///
/// Axis 0 sums every column ([`reduce_to_row`]), axis 1 sums every row ([`reduce_to_col`]).
///
/// # Errors
///
/// Returns [`LinalgError::InvalidArgument`] if `axis` is neither 0 nor 1.
///
/// # Example
///
/// ```
/// use lamina_linalg::reduce::sum;
/// use lamina_tensor::Tensor2;
///
/// let src = Tensor2::<f64>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(sum(&src, 0).unwrap().as_slice(), &[5.0, 7.0, 9.0]);
/// assert_eq!(sum(&src, 1).unwrap().as_slice(), &[6.0, 15.0]);
/// assert!(sum(&src, 2).is_err());
/// ```
pub fn sum<T, L, D, Src>(src: &Src, axis: usize) -> Result<Tensor<T, 1, RowMajor, D>, LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    Src: AsTensorView<T, 2, L, D>,
{
    let [h, w] = src.as_tensor_view().shape;
    match axis {
        0 => {
            let mut dst = Tensor::<T, 1, RowMajor, D>::zeros([w]);
            reduce_to_row(&mut dst, src, ReduceFunctor::Add, T::one(), T::zero())?;
            Ok(dst)
        }
        1 => {
            let mut dst = Tensor::<T, 1, RowMajor, D>::zeros([h]);
            reduce_to_col(&mut dst, src, ReduceFunctor::Add, T::one(), T::zero())?;
            Ok(dst)
        }
        _ => Err(LinalgError::invalid_argument(
            "axis",
            format!("expected 0 or 1, got {axis}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lamina_tensor::{ColumnMajor, Tensor1, Tensor2};

    #[test]
    fn test_functors() -> Result<(), LinalgError> {
        let x = [1.0f64, 2.0, 4.0];
        assert_relative_eq!(ReduceFunctor::Add.reduce(&x)?, 7.0);
        assert_relative_eq!(ReduceFunctor::Mean.reduce(&x)?, 7.0 / 3.0);
        assert_relative_eq!(ReduceFunctor::AddSquared.reduce(&x)?, 21.0);
        assert_relative_eq!(ReduceFunctor::Max.reduce(&x)?, 4.0);
        assert_relative_eq!(ReduceFunctor::Min.reduce(&x)?, 1.0);
        assert_relative_eq!(ReduceFunctor::ArgMax.reduce(&x)?, 2.0);
        assert_relative_eq!(ReduceFunctor::ArgMin.reduce(&x)?, 0.0);
        assert_relative_eq!(ReduceFunctor::Mult.reduce(&x)?, 8.0, epsilon = 1e-12);
        assert_relative_eq!(
            ReduceFunctor::LogAddExp.reduce(&x)?,
            (1f64.exp() + 2f64.exp() + 4f64.exp()).ln(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            ReduceFunctor::AddExp.reduce(&x)?,
            1f64.exp() + 2f64.exp() + 4f64.exp(),
            epsilon = 1e-9
        );
        Ok(())
    }

    #[test]
    fn test_arg_ties_first_occurrence() -> Result<(), LinalgError> {
        assert_eq!(ReduceFunctor::ArgMax.reduce(&[3.0f32, 5.0, 5.0, 2.0])?, 1.0);
        assert_eq!(ReduceFunctor::ArgMin.reduce(&[3.0f32, 2.0, 5.0, 2.0])?, 1.0);
        Ok(())
    }

    #[test]
    fn test_log_domain_large_inputs() -> Result<(), LinalgError> {
        let x = [1e4f64, 1e4 - 1.0, -1e4];
        let lse = ReduceFunctor::LogAddExp.reduce(&x)?;
        assert!(lse.is_finite());
        assert_relative_eq!(lse, 1e4 + (1.0 + (-1f64).exp()).ln(), epsilon = 1e-9);

        let x = [-1e4f32, -1e4];
        assert_relative_eq!(ReduceFunctor::LogAddExp.reduce(&x)?, -1e4 + 2f32.ln());
        Ok(())
    }

    #[test]
    fn test_infinite_maximum() -> Result<(), LinalgError> {
        let neg = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        assert_eq!(ReduceFunctor::LogAddExp.reduce(&neg)?, f64::NEG_INFINITY);
        assert_eq!(ReduceFunctor::AddExp.reduce(&neg)?, 0.0);

        let pos = [1.0, f64::INFINITY];
        assert_eq!(ReduceFunctor::LogAddExp.reduce(&pos)?, f64::INFINITY);
        assert_eq!(ReduceFunctor::AddExp.reduce(&pos)?, f64::INFINITY);
        Ok(())
    }

    #[test]
    fn test_empty_axis() -> Result<(), LinalgError> {
        let x: [f32; 0] = [];
        assert_eq!(ReduceFunctor::Add.reduce(&x)?, 0.0);
        assert_eq!(ReduceFunctor::Mult.reduce(&x)?, 1.0);
        assert_eq!(ReduceFunctor::AddExp.reduce(&x)?, 0.0);
        assert_eq!(ReduceFunctor::LogAddExp.reduce(&x)?, f32::NEG_INFINITY);
        assert_eq!(ReduceFunctor::Max.reduce(&x)?, f32::NEG_INFINITY);
        assert!(ReduceFunctor::Mean.reduce(&x)?.is_nan());
        assert!(matches!(
            ReduceFunctor::ArgMax.reduce(&x),
            Err(LinalgError::InvalidArgument { arg: "rf", .. })
        ));
        Ok(())
    }

    #[test]
    fn test_mult_non_positive_is_nan() -> Result<(), LinalgError> {
        assert!(ReduceFunctor::Mult.reduce(&[2.0f64, -1.0])?.is_nan());
        assert_eq!(ReduceFunctor::Mult.reduce(&[0.0f64, 3.0])?, 0.0);
        Ok(())
    }

    #[test]
    fn test_reduce_to_row_and_col_layouts() -> Result<(), LinalgError> {
        let r = Tensor2::<f32>::from_shape_fn([2, 3], |[i, j]| (i * 3 + j) as f32);
        let c = r.to_layout::<ColumnMajor>();

        let mut row_r = Tensor1::<f32>::zeros([3]);
        let mut row_c = Tensor1::<f32>::zeros([3]);
        reduce_to_row(&mut row_r, &r, ReduceFunctor::Add, 1.0, 0.0)?;
        reduce_to_row(&mut row_c, &c, ReduceFunctor::Add, 1.0, 0.0)?;
        assert_eq!(row_r.as_slice(), &[3.0, 5.0, 7.0]);
        assert_eq!(row_r.as_slice(), row_c.as_slice());

        let mut col_r = Tensor1::<f32>::zeros([2]);
        let mut col_c = Tensor1::<f32>::zeros([2]);
        reduce_to_col(&mut col_r, &r, ReduceFunctor::Max, 1.0, 0.0)?;
        reduce_to_col(&mut col_c, &c, ReduceFunctor::Max, 1.0, 0.0)?;
        assert_eq!(col_r.as_slice(), &[2.0, 5.0]);
        assert_eq!(col_r.as_slice(), col_c.as_slice());
        Ok(())
    }

    #[test]
    fn test_reduce_factors() -> Result<(), LinalgError> {
        let src = Tensor2::<f64>::from_shape_val([4, 2], 1.0);
        let mut dst = Tensor1::<f64>::from_shape_val([2], 10.0);
        reduce_to_row(&mut dst, &src, ReduceFunctor::Add, 2.0, 0.5)?;
        assert_eq!(dst.as_slice(), &[13.0, 13.0]);

        let mut dst = Tensor1::<f64>::from_shape_val([2], f64::NAN);
        reduce_to_row(&mut dst, &src, ReduceFunctor::Add, 1.0, 0.0)?;
        assert_eq!(dst.as_slice(), &[4.0, 4.0]);
        Ok(())
    }

    #[test]
    fn test_reduce_zeros_and_ones() -> Result<(), LinalgError> {
        let zeros = Tensor2::<f32>::zeros([5, 3]);
        let mut dst = Tensor1::<f32>::from_shape_val([3], 7.0);
        reduce_to_row(&mut dst, &zeros, ReduceFunctor::default(), 1.0, 0.0)?;
        assert_eq!(dst.as_slice(), &[0.0; 3]);

        let ones = Tensor2::<f32>::from_shape_val([5, 3], 1.0);
        reduce_to_row(&mut dst, &ones, ReduceFunctor::default(), 1.0, 0.0)?;
        assert_eq!(dst.as_slice(), &[5.0; 3]);
        Ok(())
    }

    #[test]
    fn test_reduce_cast_failure_leaves_dst() -> Result<(), LinalgError> {
        let src = Tensor2::<f32>::from_shape_vec([1, 2], vec![-1.0, 300.0])?;
        let mut dst = Tensor1::<u8>::from_shape_val([2], 9);
        let res = reduce_to_row(&mut dst, &src, ReduceFunctor::Add, 1.0, 0.0);
        assert_eq!(res, Err(LinalgError::TensorError(TensorError::CastError)));
        assert_eq!(dst.as_slice(), &[9, 9]);
        Ok(())
    }

    #[test]
    fn test_reduce_dimension_mismatch() {
        let src = Tensor2::<f32>::zeros([2, 3]);
        let mut dst = Tensor1::<f32>::zeros([2]);
        let res = reduce_to_row(&mut dst, &src, ReduceFunctor::Add, 1.0, 0.0);
        assert_eq!(
            res,
            Err(LinalgError::DimensionMismatch {
                op: "reduce_to_row",
                expected: vec![3],
                actual: vec![2],
            })
        );
    }

    #[test]
    fn test_reduce_view_past_storage() -> Result<(), LinalgError> {
        let src = Tensor2::<f32>::from_shape_val([2, 3], 1.0);
        let mut view = src.view();
        view.offset = 2;
        let mut dst = Tensor1::<f32>::from_shape_val([3], 4.0);
        let res = reduce_to_row(&mut dst, &view, ReduceFunctor::Add, 1.0, 0.0);
        assert_eq!(
            res,
            Err(LinalgError::TensorError(TensorError::IndexOutOfBounds {
                index: 7,
                size: 6,
            }))
        );
        assert_eq!(dst.as_slice(), &[4.0; 3]);
        Ok(())
    }

    #[test]
    fn test_sum_transposed_view() -> Result<(), LinalgError> {
        let src = Tensor2::<f32>::from_shape_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let view = src.transposed_view();
        assert_eq!(sum(&view, 0)?.as_slice(), &[6.0, 15.0]);
        assert_eq!(sum(&view, 1)?.as_slice(), &[5.0, 7.0, 9.0]);
        Ok(())
    }
}
