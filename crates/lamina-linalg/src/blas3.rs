use lamina_tensor::{
    AsTensorView, AsTensorViewMut, CpuDevice, DiaMatrix, MemoryLayout, TensorView,
};
use num_traits::Float;

use crate::{
    backend::{Gemm, GemmOperand},
    error::LinalgError,
};

/// Whether an operand enters a product as is or transposed.
///
/// Parsed from the usual BLAS flags: `'n'` for [`Transpose::No`] and `'t'` for
/// [`Transpose::Yes`].
///
/// ```
/// use lamina_linalg::blas3::Transpose;
///
/// assert_eq!(Transpose::try_from('t').unwrap(), Transpose::Yes);
/// assert!(Transpose::try_from('x').is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transpose {
    /// Use the operand as stored.
    #[default]
    No,
    /// Use the transpose of the operand.
    Yes,
}

impl Transpose {
    /// Shape of the operand after the flag is applied.
    pub fn apply(self, shape: [usize; 2]) -> [usize; 2] {
        match self {
            Transpose::No => shape,
            Transpose::Yes => [shape[1], shape[0]],
        }
    }
}

impl TryFrom<char> for Transpose {
    type Error = LinalgError;

    fn try_from(flag: char) -> Result<Self, Self::Error> {
        match flag {
            'n' | 'N' => Ok(Transpose::No),
            't' | 'T' => Ok(Transpose::Yes),
            other => Err(LinalgError::invalid_argument(
                "trans",
                format!("expected 'n' or 't', got {other:?}"),
            )),
        }
    }
}

fn gemm_operand<T, L: MemoryLayout, D: CpuDevice>(
    view: &TensorView<'_, T, 2, L, D>,
    trans: Transpose,
) -> GemmOperand<*const T> {
    let operand = GemmOperand {
        ptr: view.as_ptr(),
        row_stride: view.strides[0] as isize,
        col_stride: view.strides[1] as isize,
    };
    match trans {
        Transpose::No => operand,
        Transpose::Yes => operand.transposed(),
    }
}

/// Checks that `C` (m×n) can hold `opA(A)` (m×k) times `opB(B)` (k×n) and returns `[m, k, n]`.
fn product_dims(
    op: &'static str,
    c_shape: [usize; 2],
    a_shape: [usize; 2],
    b_shape: [usize; 2],
) -> Result<[usize; 3], LinalgError> {
    let [m, k] = a_shape;
    let [kb, n] = b_shape;
    if k != kb {
        return Err(LinalgError::dimension_mismatch(op, &[k, n], &b_shape));
    }
    if c_shape != [m, n] {
        return Err(LinalgError::dimension_mismatch(op, &[m, n], &c_shape));
    }
    Ok([m, k, n])
}

/// Dense matrix product `C = fact_c * C + fact_ab * opA(A) * opB(B)`.
///
/// `opX` is the identity or the transpose according to the flag. The three operands share
/// element type, storage order and memory space; `A` and `B` may be tensors or views, `C` a
/// tensor or a mutable view. When `fact_c` is zero the previous content of `C` is not read.
///
/// # Arguments
///
/// * `c` - The destination matrix of shape `[m, n]`.
/// * `a` - The left operand, `[m, k]` after `trans_a`.
/// * `b` - The right operand, `[k, n]` after `trans_b`.
/// * `trans_a` - Transpose flag for `a`.
/// * `trans_b` - Transpose flag for `b`.
/// * `fact_ab` - Scale applied to the product.
/// * `fact_c` - Scale applied to the previous content of `c`.
///
/// # Errors
///
/// - [`LinalgError::DimensionMismatch`] if the shapes are incompatible.
/// - [`LinalgError::TensorError`] wrapping `IndexOutOfBounds` if an operand view addresses
///   elements past the end of its storage.
///
/// `c` is left untouched on error.
///
/// # Example
///
/// ```
/// use lamina_linalg::blas3::{prod, Transpose};
/// use lamina_tensor::Tensor2;
///
/// let a = Tensor2::<f32>::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let b = Tensor2::<f32>::from_shape_vec([2, 1], vec![1.0, 1.0]).unwrap();
/// let mut c = Tensor2::<f32>::zeros([2, 1]);
/// prod(&mut c, &a, &b, Transpose::No, Transpose::No, 1.0, 0.0).unwrap();
/// assert_eq!(c.as_slice(), &[3.0, 7.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn prod<T, L, D, C, A, B>(
    c: &mut C,
    a: &A,
    b: &B,
    trans_a: Transpose,
    trans_b: Transpose,
    fact_ab: T,
    fact_c: T,
) -> Result<(), LinalgError>
where
    T: Gemm,
    L: MemoryLayout,
    D: CpuDevice,
    C: AsTensorViewMut<T, 2, L, D>,
    A: AsTensorView<T, 2, L, D>,
    B: AsTensorView<T, 2, L, D>,
{
    let a = a.as_tensor_view();
    let b = b.as_tensor_view();
    let mut c = c.as_tensor_view_mut();

    let [m, k, n] = product_dims(
        "prod",
        c.shape,
        trans_a.apply(a.shape),
        trans_b.apply(b.shape),
    )?;
    a.check_extent()?;
    b.check_extent()?;
    c.check_extent()?;

    log::trace!(
        "prod: gemm m={m} k={k} n={n} trans_a={trans_a:?} trans_b={trans_b:?} layout={:?} on {:?}",
        L::KIND,
        D::device_info()
    );

    let c_operand = GemmOperand {
        ptr: c.as_mut_ptr(),
        row_stride: c.strides[0] as isize,
        col_stride: c.strides[1] as isize,
    };

    // SAFETY: every operand passed `check_extent`, so each address reached through its shape
    // and strides lies inside its storage, and `c` is exclusively borrowed.
    unsafe {
        T::gemm(
            m,
            k,
            n,
            fact_ab,
            gemm_operand(&a, trans_a),
            gemm_operand(&b, trans_b),
            fact_c,
            c_operand,
        );
    }

    Ok(())
}

/// Dense product `C = fact_c * C + fact_ab * A * B` with `B` stored in the opposite layout.
///
/// `b` holds the logical `k×n` matrix `B`. It is reinterpreted as a transposed view and
/// forwarded to [`prod`] with `trans_b = Transpose::Yes`; no element is copied.
///
/// # Errors
///
/// See [`prod`].
///
/// # Example
///
/// ```
/// use lamina_linalg::blas3::prod_rhs_other_layout;
/// use lamina_tensor::{ColumnMajor, Tensor2};
///
/// let a = Tensor2::<f64>::from_shape_vec([1, 2], vec![1.0, 2.0]).unwrap();
/// let b = Tensor2::<f64, ColumnMajor>::from_shape_vec([2, 2], vec![1.0, 0.0, 1.0, 1.0]).unwrap();
/// let mut c = Tensor2::<f64>::zeros([1, 2]);
/// prod_rhs_other_layout(&mut c, &a, &b, 1.0, 0.0).unwrap();
/// assert_eq!(c.as_slice(), &[1.0, 3.0]);
/// ```
pub fn prod_rhs_other_layout<T, L, D, C, A, B>(
    c: &mut C,
    a: &A,
    b: &B,
    fact_ab: T,
    fact_c: T,
) -> Result<(), LinalgError>
where
    T: Gemm,
    L: MemoryLayout,
    D: CpuDevice,
    C: AsTensorViewMut<T, 2, L, D>,
    A: AsTensorView<T, 2, L, D>,
    B: AsTensorView<T, 2, L::Transposed, D>,
{
    let bt = b.as_tensor_view().transposed();
    prod(c, a, &bt, Transpose::No, Transpose::Yes, fact_ab, fact_c)
}

/// Dense product `C = fact_c * C + fact_ab * A * B` with `A` stored in the opposite layout.
///
/// The left-hand counterpart of [`prod_rhs_other_layout`].
///
/// # Errors
///
/// See [`prod`].
pub fn prod_lhs_other_layout<T, L, D, C, A, B>(
    c: &mut C,
    a: &A,
    b: &B,
    fact_ab: T,
    fact_c: T,
) -> Result<(), LinalgError>
where
    T: Gemm,
    L: MemoryLayout,
    D: CpuDevice,
    C: AsTensorViewMut<T, 2, L, D>,
    A: AsTensorView<T, 2, L::Transposed, D>,
    B: AsTensorView<T, 2, L, D>,
{
    let at = a.as_tensor_view().transposed();
    prod(c, &at, b, Transpose::Yes, Transpose::No, fact_ab, fact_c)
}

#[inline]
fn op_get<T: Copy, L: MemoryLayout, D: CpuDevice>(
    view: &TensorView<'_, T, 2, L, D>,
    trans: Transpose,
    row: usize,
    col: usize,
) -> T {
    match trans {
        Transpose::No => *view.get_unchecked([row, col]),
        Transpose::Yes => *view.get_unchecked([col, row]),
    }
}

/// Product of a diagonal sparse matrix with a dense matrix.
///
/// Computes `C = fact_c * C + fact_ab * opA(A) * opB(B)` with the same scaling and transpose
/// contract as [`prod`]. Only the stored diagonals are visited, so the work is proportional to
/// the number of diagonals times the number of rows times the number of columns of `C`.
///
/// # Errors
///
/// - [`LinalgError::DimensionMismatch`] if the shapes are incompatible.
/// - [`LinalgError::TensorError`] wrapping `IndexOutOfBounds` if an operand view addresses
///   elements past the end of its storage.
///
/// `c` is left untouched on error.
///
/// # Example
///
/// ```
/// use lamina_linalg::blas3::{prod_dia, Transpose};
/// use lamina_tensor::{DiaMatrix, Tensor2};
///
/// // 2 * identity
/// let a = DiaMatrix::<f32>::from_diagonals(2, 2, vec![0], vec![2.0, 2.0]).unwrap();
/// let b = Tensor2::<f32>::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let mut c = Tensor2::<f32>::zeros([2, 2]);
/// prod_dia(&mut c, &a, &b, Transpose::No, Transpose::No, 1.0, 0.0).unwrap();
/// assert_eq!(c.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn prod_dia<T, L, D, C, B>(
    c: &mut C,
    a: &DiaMatrix<T, D>,
    b: &B,
    trans_a: Transpose,
    trans_b: Transpose,
    fact_ab: T,
    fact_c: T,
) -> Result<(), LinalgError>
where
    T: Float,
    L: MemoryLayout,
    D: CpuDevice,
    C: AsTensorViewMut<T, 2, L, D>,
    B: AsTensorView<T, 2, L, D>,
{
    let b = b.as_tensor_view();
    let mut c = c.as_tensor_view_mut();

    let [m, _, n] = product_dims(
        "prod_dia",
        c.shape,
        trans_a.apply([a.height(), a.width()]),
        trans_b.apply(b.shape),
    )?;
    b.check_extent()?;
    c.check_extent()?;

    log::trace!(
        "prod_dia: {} diagonals m={m} n={n} trans_a={trans_a:?} trans_b={trans_b:?}",
        a.num_diagonals()
    );

    for i in 0..m {
        for j in 0..n {
            let cij = c.get_unchecked_mut([i, j]);
            *cij = if fact_c.is_zero() {
                T::zero()
            } else {
                fact_c * *cij
            };
        }
    }

    for (offset, lane) in a.diagonals() {
        for i in a.row_range(offset) {
            let col = (i as isize + offset) as usize;
            // entry A[i, col]; the transpose moves it to opA[col, i]
            let (row, inner) = match trans_a {
                Transpose::No => (i, col),
                Transpose::Yes => (col, i),
            };
            let scale = fact_ab * lane[i];
            for j in 0..n {
                let cij = c.get_unchecked_mut([row, j]);
                *cij = *cij + scale * op_get(&b, trans_b, inner, j);
            }
        }
    }

    Ok(())
}

/// Copies the transpose of `src` into `dst`.
///
/// Both matrices share the storage order; `dst` must have shape `[src.width, src.height]`.
///
/// # Errors
///
/// Returns [`LinalgError::DimensionMismatch`] if `dst` has the wrong shape.
///
/// # Example
///
/// ```
/// use lamina_linalg::blas3::transpose;
/// use lamina_tensor::Tensor2;
///
/// let src = Tensor2::<u8>::from_shape_vec([2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
/// let mut dst = Tensor2::<u8>::zeros([3, 2]);
/// transpose(&mut dst, &src).unwrap();
/// assert_eq!(dst.as_slice(), &[1, 4, 2, 5, 3, 6]);
/// ```
pub fn transpose<T, L, D, Dst, Src>(dst: &mut Dst, src: &Src) -> Result<(), LinalgError>
where
    T: Copy,
    L: MemoryLayout,
    D: CpuDevice,
    Dst: AsTensorViewMut<T, 2, L, D>,
    Src: AsTensorView<T, 2, L, D>,
{
    let src = src.as_tensor_view();
    let mut dst = dst.as_tensor_view_mut();

    let expected = Transpose::Yes.apply(src.shape);
    if dst.shape != expected {
        return Err(LinalgError::dimension_mismatch(
            "transpose",
            &expected,
            &dst.shape,
        ));
    }
    src.check_extent()?;
    dst.check_extent()?;

    let [h, w] = src.shape;
    for i in 0..h {
        for j in 0..w {
            *dst.get_unchecked_mut([j, i]) = *src.get_unchecked([i, j]);
        }
    }

    Ok(())
}
