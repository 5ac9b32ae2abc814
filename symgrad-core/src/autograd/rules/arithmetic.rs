use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::OpKind;

pub(crate) fn add_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    gc.set_grad(0, gy)?;
    gc.set_grad(1, gy)
}

pub(crate) fn sub_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    gc.set_grad(0, gy)?;
    gc.grad_op(OpKind::Neg, 1, &[gy])?;
    Ok(())
}

pub(crate) fn mul_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let b = gc.x(1)?;
    gc.grad_op(OpKind::Mul, 0, &[b, gy])?;
    let a = gc.x(0)?;
    gc.grad_op(OpKind::Mul, 1, &[a, gy])?;
    Ok(())
}

/// grad(a) = gy / b, grad(b) = -grad(a) * a / b.
///
/// grad(b) is built from this node's own grad(a) contribution, not from the
/// accumulated gradient of `a`.
pub(crate) fn div_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let b = gc.x(1)?;
    let gx0 = gc.grad_op(OpKind::Div, 0, &[gy, b])?;

    let a = gc.x(0)?;
    let t1 = {
        let mut gb = gc.builder(1)?;
        let t0 = gb.op(OpKind::Neg, &[gx0]);
        gb.op(OpKind::Mul, &[t0, a])
    };
    gc.grad_op(OpKind::Div, 1, &[t1, b])?;
    Ok(())
}

pub(crate) fn neg_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    gc.grad_op(OpKind::Neg, 0, &[gy])?;
    Ok(())
}

#[cfg(test)]
#[path = "arithmetic_test.rs"]
mod tests;
