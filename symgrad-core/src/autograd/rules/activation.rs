use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::OpKind;
use crate::types::{DType, Literal};

fn input_dtype(gc: &GradientContext<'_>) -> Result<Option<DType>, GradientError> {
    let x = gc.input(0)?;
    Ok(gc.graph().value(x).ty().dtype())
}

pub(crate) fn exp_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    gc.grad_op(OpKind::Mul, 0, &[y, gy])?;
    Ok(())
}

/// grad = gy * y * (1 - y). Inputs of a known dtype other than float32 are
/// rejected; untyped intermediates are taken as float32.
pub(crate) fn sigmoid_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    if let Some(actual) = input_dtype(gc)?.filter(|&d| d != DType::F32) {
        return Err(GradientError::UnsupportedDType {
            op: OpKind::Sigmoid,
            expected: DType::F32,
            actual: Some(actual),
        });
    }
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    let (t0, t1) = {
        let mut gb = gc.builder(0)?;
        let one = gb.constant(Literal::scalar(DType::F32, 1.0));
        let t0 = gb.op(OpKind::Mul, &[gy, y]);
        let t1 = gb.op(OpKind::Sub, &[one, y]);
        (t0, t1)
    };
    gc.grad_op(OpKind::Mul, 0, &[t0, t1])?;
    Ok(())
}

pub(crate) fn relu_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let x = gc.x(0)?;
    gc.grad_op(OpKind::ReluGrad, 0, &[x, gy])?;
    Ok(())
}

pub(crate) fn sqrt_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    let t0 = gc.builder(0)?.op(OpKind::Add, &[y, y]);
    gc.grad_op(OpKind::Div, 0, &[gy, t0])?;
    Ok(())
}

pub(crate) fn tanh_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let dtype = input_dtype(gc)?.unwrap_or(DType::F32);
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    let t1 = {
        let mut gb = gc.builder(0)?;
        let one = gb.constant(Literal::scalar(dtype, 1.0));
        let t0 = gb.op(OpKind::Mul, &[y, y]);
        gb.op(OpKind::Sub, &[one, t0])
    };
    gc.grad_op(OpKind::Mul, 0, &[gy, t1])?;
    Ok(())
}

pub(crate) fn identity_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    gc.grad_op(OpKind::Identity, 0, &[gy])?;
    Ok(())
}

/// grad = gy - exp(y) * sum(gy, axis). Only axis 1 is supported.
pub(crate) fn log_softmax_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let axis = gc.node().attrs().axis;
    if axis != 1 {
        return Err(GradientError::UnsupportedAxis {
            op: OpKind::LogSoftmax,
            axis,
        });
    }
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    let mul = {
        let mut gb = gc.builder(0)?;
        let sum = gb.op(OpKind::ReduceSum, &[gy]);
        let attrs = gb.graph().producer_attrs_mut(sum)?;
        attrs.axes = vec![axis];
        attrs.keepdims = true;
        let exp = gb.op(OpKind::Exp, &[y]);
        gb.op(OpKind::Mul, &[exp, sum])
    };
    gc.grad_op(OpKind::Sub, 0, &[gy, mul])?;
    Ok(())
}

/// With gx = y * gy: grad = gx - y * sum(gx, axis).
pub(crate) fn softmax_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let axis = gc.node().attrs().axis;
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    let (gx, mul) = {
        let mut gb = gc.builder(0)?;
        let gx = gb.op(OpKind::Mul, &[y, gy]);
        let sum = gb.op(OpKind::ReduceSum, &[gx]);
        let attrs = gb.graph().producer_attrs_mut(sum)?;
        attrs.axes = vec![axis];
        attrs.keepdims = true;
        let mul = gb.op(OpKind::Mul, &[y, sum]);
        (gx, mul)
    };
    gc.grad_op(OpKind::Sub, 0, &[gx, mul])?;
    Ok(())
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
