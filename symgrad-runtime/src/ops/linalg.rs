use crate::error::RuntimeError;
use crate::ops::reduction::expand;
use crate::tensor::Tensor;

fn matrix_dims(t: &Tensor, transposed: bool, operation: &str) -> Result<(usize, usize), RuntimeError> {
    match t.shape() {
        &[rows, cols] if transposed => Ok((cols, rows)),
        &[rows, cols] => Ok((rows, cols)),
        other => Err(RuntimeError::ShapeMismatch {
            expected: vec![0, 0],
            actual: other.to_vec(),
            operation: operation.to_string(),
        }),
    }
}

/// `alpha * op(a) @ op(b) + beta * c`, with `c` broadcast to `[M, N]`.
///
/// `c` is not read when `beta` is 0 or `c` is absent.
pub fn gemm(
    a: &Tensor,
    b: &Tensor,
    c: Option<&Tensor>,
    alpha: f64,
    beta: f64,
    trans_a: bool,
    trans_b: bool,
) -> Result<Tensor, RuntimeError> {
    let (m, k) = matrix_dims(a, trans_a, "gemm(a)")?;
    let (kb, n) = matrix_dims(b, trans_b, "gemm(b)")?;
    if k != kb {
        return Err(RuntimeError::ShapeMismatch {
            expected: vec![k, n],
            actual: vec![kb, n],
            operation: "gemm".to_string(),
        });
    }
    let (ad, bd) = (a.data(), b.data());
    let a_at = |i: usize, p: usize| if trans_a { ad[p * m + i] } else { ad[i * k + p] };
    let b_at = |p: usize, j: usize| if trans_b { bd[j * k + p] } else { bd[p * n + j] };

    let mut data = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            let dot: f64 = (0..k).map(|p| a_at(i, p) * b_at(p, j)).sum();
            data[i * n + j] = alpha * dot;
        }
    }
    if let Some(c) = c.filter(|_| beta != 0.0) {
        let c = expand(c, &[m, n])?;
        if c.shape() != [m, n] {
            return Err(RuntimeError::ShapeMismatch {
                expected: vec![m, n],
                actual: c.shape().to_vec(),
                operation: "gemm(c)".to_string(),
            });
        }
        for (out, &v) in data.iter_mut().zip(c.data()) {
            *out += beta * v;
        }
    }
    Tensor::new(a.dtype(), vec![m, n], data)
}

#[cfg(test)]
#[path = "linalg_test.rs"]
mod tests;
