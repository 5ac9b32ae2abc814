use crate::error::RuntimeError;
use crate::tensor::{broadcast_offset, broadcast_shapes, next_index, strides, Tensor};
use num_traits::Float;
use symgrad_core::DType;

/// Result dtype of a binary arithmetic op: floats win over integers, and
/// `F64` over `F32`.
fn promote(a: DType, b: DType) -> DType {
    match (a, b) {
        (DType::F64, _) | (_, DType::F64) => DType::F64,
        (DType::F32, _) | (_, DType::F32) => DType::F32,
        _ => a,
    }
}

/// Applies `f` elementwise with numpy broadcasting.
pub fn binary_op<F>(a: &Tensor, b: &Tensor, dtype: DType, f: F) -> Result<Tensor, RuntimeError>
where
    F: Fn(f64, f64) -> f64,
{
    if a.shape() == b.shape() {
        let data = a.data().iter().zip(b.data()).map(|(&x, &y)| f(x, y)).collect();
        return Tensor::new(dtype, a.shape().to_vec(), data);
    }
    let out_shape = broadcast_shapes(a.shape(), b.shape())?;
    let (a_strides, b_strides) = (strides(a.shape()), strides(b.shape()));
    let numel: usize = out_shape.iter().product();
    let mut data = Vec::with_capacity(numel);
    if numel > 0 {
        let mut index = vec![0; out_shape.len()];
        loop {
            let x = a.data()[broadcast_offset(&index, a.shape(), &a_strides)];
            let y = b.data()[broadcast_offset(&index, b.shape(), &b_strides)];
            data.push(f(x, y));
            if !next_index(&mut index, &out_shape) {
                break;
            }
        }
    }
    Tensor::new(dtype, out_shape, data)
}

pub fn unary_op<F>(a: &Tensor, f: F) -> Tensor
where
    F: Fn(f64) -> f64,
{
    let data = a.data().iter().map(|&x| f(x)).collect();
    Tensor::from_parts(a.dtype(), a.shape().to_vec(), data)
}

pub fn add(a: &Tensor, b: &Tensor) -> Result<Tensor, RuntimeError> {
    binary_op(a, b, promote(a.dtype(), b.dtype()), |x, y| x + y)
}

pub fn sub(a: &Tensor, b: &Tensor) -> Result<Tensor, RuntimeError> {
    binary_op(a, b, promote(a.dtype(), b.dtype()), |x, y| x - y)
}

pub fn mul(a: &Tensor, b: &Tensor) -> Result<Tensor, RuntimeError> {
    binary_op(a, b, promote(a.dtype(), b.dtype()), |x, y| x * y)
}

/// Float division; integer operands divide and truncate toward zero.
pub fn div(a: &Tensor, b: &Tensor) -> Result<Tensor, RuntimeError> {
    let dtype = promote(a.dtype(), b.dtype());
    if dtype.is_float() {
        binary_op(a, b, dtype, |x, y| x / y)
    } else {
        binary_op(a, b, dtype, |x, y| (x / y).trunc())
    }
}

pub fn greater(a: &Tensor, b: &Tensor) -> Result<Tensor, RuntimeError> {
    binary_op(a, b, DType::Bool, |x, y| if x > y { 1.0 } else { 0.0 })
}

pub fn neg(a: &Tensor) -> Tensor {
    unary_op(a, |x| -x)
}

pub fn exp(a: &Tensor) -> Tensor {
    unary_op(a, f64::exp)
}

pub fn sqrt(a: &Tensor) -> Tensor {
    unary_op(a, f64::sqrt)
}

pub fn tanh(a: &Tensor) -> Tensor {
    unary_op(a, f64::tanh)
}

pub fn sigmoid(a: &Tensor) -> Tensor {
    unary_op(a, sigmoid_scalar)
}

pub fn relu(a: &Tensor) -> Tensor {
    unary_op(a, relu_scalar)
}

/// `gy` where `x > 0`, else 0.
pub fn relu_grad(x: &Tensor, gy: &Tensor) -> Result<Tensor, RuntimeError> {
    binary_op(x, gy, gy.dtype(), |x, g| if x > 0.0 { g } else { 0.0 })
}

pub(crate) fn sigmoid_scalar<T: Float>(x: T) -> T {
    T::one() / (T::one() + (-x).exp())
}

pub(crate) fn relu_scalar<T: Float>(x: T) -> T {
    x.max(T::zero())
}

#[cfg(test)]
#[path = "elementwise_test.rs"]
mod tests;
