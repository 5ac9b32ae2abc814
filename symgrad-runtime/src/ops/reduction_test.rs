use super::*;
use crate::utils::testing::{check_tensor_near, f32_tensor};

fn matrix() -> Tensor {
    f32_tensor(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])
}

#[test]
fn test_reduce_sum_axes_and_keepdims() -> Result<(), RuntimeError> {
    check_tensor_near(&reduce_sum(&matrix(), &[0], false)?, &[3], &[5.0, 7.0, 9.0], 1e-12);
    check_tensor_near(&reduce_sum(&matrix(), &[1], true)?, &[2, 1], &[6.0, 15.0], 1e-12);
    check_tensor_near(&reduce_sum(&matrix(), &[-1], false)?, &[2], &[6.0, 15.0], 1e-12);
    check_tensor_near(&reduce_sum(&matrix(), &[], true)?, &[1, 1], &[21.0], 1e-12);
    check_tensor_near(&reduce_sum(&matrix(), &[], false)?, &[], &[21.0], 1e-12);
    Ok(())
}

#[test]
fn test_reduce_mean() -> Result<(), RuntimeError> {
    check_tensor_near(&reduce_mean(&matrix(), &[0], false)?, &[3], &[2.5, 3.5, 4.5], 1e-12);
    check_tensor_near(&reduce_mean(&matrix(), &[], false)?, &[], &[3.5], 1e-12);
    Ok(())
}

#[test]
fn test_invalid_axis() {
    assert_eq!(
        reduce_sum(&matrix(), &[2], false),
        Err(RuntimeError::InvalidAxis { axis: 2, rank: 2 })
    );
}

#[test]
fn test_expand() -> Result<(), RuntimeError> {
    let row = f32_tensor(vec![1.0, 2.0, 3.0], &[1, 3]);
    check_tensor_near(&expand(&row, &[2, 3])?, &[2, 3], &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0], 1e-12);
    let scalar = f32_tensor(vec![4.0], &[]);
    check_tensor_near(&expand(&scalar, &[2])?, &[2], &[4.0, 4.0], 1e-12);
    Ok(())
}
