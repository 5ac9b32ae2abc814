use super::*;
use crate::utils::testing::{check_tensor_near, f32_tensor};

fn a() -> Tensor {
    f32_tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])
}

fn b() -> Tensor {
    f32_tensor(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], &[3, 2])
}

#[test]
fn test_gemm_plain() -> Result<(), RuntimeError> {
    let c = f32_tensor(vec![10.0, 20.0], &[2]);
    let y = gemm(&a(), &b(), Some(&c), 1.0, 1.0, false, false)?;
    check_tensor_near(&y, &[2, 2], &[14.0, 25.0, 20.0, 31.0], 1e-12);
    Ok(())
}

#[test]
fn test_gemm_transposed_operands() -> Result<(), RuntimeError> {
    // a^T is [3, 2], b^T is [2, 3].
    let at = f32_tensor(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0], &[3, 2]);
    let bt = f32_tensor(vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[2, 3]);
    let y = gemm(&at, &bt, None, 2.0, 0.0, true, true)?;
    check_tensor_near(&y, &[2, 2], &[8.0, 10.0, 20.0, 22.0], 1e-12);
    Ok(())
}

#[test]
fn test_gemm_ignores_c_when_beta_is_zero() -> Result<(), RuntimeError> {
    // c has an incompatible shape but is never read.
    let c = f32_tensor(vec![0.0; 5], &[5]);
    let y = gemm(&a(), &b(), Some(&c), 1.0, 0.0, false, false)?;
    assert_eq!(y.shape(), &[2, 2]);
    Ok(())
}

#[test]
fn test_gemm_inner_dimension_mismatch() {
    assert!(matches!(
        gemm(&a(), &a(), None, 1.0, 0.0, false, false),
        Err(RuntimeError::ShapeMismatch { .. })
    ));
}
