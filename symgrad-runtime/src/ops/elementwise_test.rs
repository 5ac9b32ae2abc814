use super::*;
use crate::utils::testing::{check_tensor_near, f32_tensor};
use approx::assert_relative_eq;

#[test]
fn test_add_broadcasting() -> Result<(), RuntimeError> {
    let matrix = f32_tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let row = f32_tensor(vec![10.0, 20.0, 30.0], &[3]);
    let result = add(&matrix, &row)?;
    check_tensor_near(&result, &[2, 3], &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0], 1e-12);

    let column = f32_tensor(vec![100.0, 200.0], &[2, 1]);
    let result = add(&matrix, &column)?;
    check_tensor_near(&result, &[2, 3], &[101.0, 102.0, 103.0, 204.0, 205.0, 206.0], 1e-12);
    Ok(())
}

#[test]
fn test_incompatible_shapes() {
    let a = f32_tensor(vec![0.0; 6], &[2, 3]);
    let b = f32_tensor(vec![0.0; 2], &[2]);
    assert!(matches!(sub(&a, &b), Err(RuntimeError::BroadcastError { .. })));
}

#[test]
fn test_div_promotes_and_divides() -> Result<(), RuntimeError> {
    let a = f32_tensor(vec![6.0], &[]);
    let b = Tensor::scalar(DType::I64, 4.0);
    let result = div(&a, &b)?;
    assert_eq!(result.dtype(), DType::F32);
    assert_relative_eq!(result.item()?, 1.5);

    let ints = div(&Tensor::scalar(DType::I64, 7.0), &b)?;
    assert_eq!(ints.dtype(), DType::I64);
    assert_eq!(ints.item()?, 1.0);
    Ok(())
}

#[test]
fn test_greater_yields_bool() -> Result<(), RuntimeError> {
    let a = f32_tensor(vec![1.0, 5.0], &[2]);
    let b = f32_tensor(vec![2.0], &[1]);
    let result = greater(&a, &b)?;
    assert_eq!(result.dtype(), DType::Bool);
    assert_eq!(result.data(), &[0.0, 1.0]);
    Ok(())
}

#[test]
fn test_unary_kernels() {
    let x = f32_tensor(vec![-1.0, 0.0, 4.0], &[3]);
    check_tensor_near(&neg(&x), &[3], &[1.0, 0.0, -4.0], 1e-12);
    check_tensor_near(&relu(&x), &[3], &[0.0, 0.0, 4.0], 1e-12);
    check_tensor_near(&sigmoid(&x), &[3], &[0.2689414213699951, 0.5, 0.9820137900379085], 1e-12);
    check_tensor_near(&tanh(&x), &[3], &[-0.7615941559557649, 0.0, 0.999329299739067], 1e-12);
    let pos = f32_tensor(vec![4.0, 9.0], &[2]);
    check_tensor_near(&sqrt(&pos), &[2], &[2.0, 3.0], 1e-12);
    check_tensor_near(&exp(&f32_tensor(vec![0.0], &[1])), &[1], &[1.0], 1e-12);
}

#[test]
fn test_relu_grad_masks_by_input_sign() -> Result<(), RuntimeError> {
    let x = f32_tensor(vec![-2.0, 0.0, 3.0], &[3]);
    let gy = f32_tensor(vec![5.0, 6.0, 7.0], &[3]);
    check_tensor_near(&relu_grad(&x, &gy)?, &[3], &[0.0, 0.0, 7.0], 1e-12);
    Ok(())
}

#[test]
fn test_scalar_helpers_are_generic() {
    assert_relative_eq!(sigmoid_scalar(0.0f32), 0.5f32);
    assert_eq!(relu_scalar(-3.0f32), 0.0f32);
}
