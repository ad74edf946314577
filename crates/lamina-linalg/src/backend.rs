//! Dense matrix-multiply primitive.
//!
//! The product kernels never look at layouts: every operand reaches the backend as a pointer
//! plus a row stride and a column stride, both counted in elements. Transposing an operand is
//! a matter of swapping its two strides.

/// Strided operand of a general matrix multiply.
#[derive(Debug, Clone, Copy)]
pub struct GemmOperand<P> {
    /// Pointer to element `[0, 0]`.
    pub ptr: P,
    /// Distance between consecutive rows.
    pub row_stride: isize,
    /// Distance between consecutive columns.
    pub col_stride: isize,
}

impl<P> GemmOperand<P> {
    /// Swaps the row and column strides, i.e. reads the operand transposed.
    pub fn transposed(self) -> Self {
        Self {
            ptr: self.ptr,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }
}

/// Element types with a general matrix-multiply kernel.
///
/// Computes `C = alpha * A * B + beta * C` with `A` m×k, `B` k×n, `C` m×n.
/// When `beta` is zero, `C` is not read and may hold any value, NaN included.
pub trait Gemm: Copy + 'static {
    /// Runs the kernel.
    ///
    /// # Safety
    ///
    /// Every operand pointer must be valid for all the elements its dimensions and strides
    /// address. `c` must not alias `a` or `b`.
    #[allow(clippy::too_many_arguments)]
    unsafe fn gemm(
        m: usize,
        k: usize,
        n: usize,
        alpha: Self,
        a: GemmOperand<*const Self>,
        b: GemmOperand<*const Self>,
        beta: Self,
        c: GemmOperand<*mut Self>,
    );
}

impl Gemm for f32 {
    unsafe fn gemm(
        m: usize,
        k: usize,
        n: usize,
        alpha: f32,
        a: GemmOperand<*const f32>,
        b: GemmOperand<*const f32>,
        beta: f32,
        c: GemmOperand<*mut f32>,
    ) {
        matrixmultiply::sgemm(
            m,
            k,
            n,
            alpha,
            a.ptr,
            a.row_stride,
            a.col_stride,
            b.ptr,
            b.row_stride,
            b.col_stride,
            beta,
            c.ptr,
            c.row_stride,
            c.col_stride,
        );
    }
}

impl Gemm for f64 {
    unsafe fn gemm(
        m: usize,
        k: usize,
        n: usize,
        alpha: f64,
        a: GemmOperand<*const f64>,
        b: GemmOperand<*const f64>,
        beta: f64,
        c: GemmOperand<*mut f64>,
    ) {
        matrixmultiply::dgemm(
            m,
            k,
            n,
            alpha,
            a.ptr,
            a.row_stride,
            a.col_stride,
            b.ptr,
            b.row_stride,
            b.col_stride,
            beta,
            c.ptr,
            c.row_stride,
            c.col_stride,
        );
    }
}
