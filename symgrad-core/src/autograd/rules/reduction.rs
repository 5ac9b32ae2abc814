use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::OpKind;
use crate::types::{DType, Literal};

pub(crate) fn reduce_sum_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let x = gc.x(0)?;
    let shape = gc.builder(0)?.op(OpKind::Shape, &[x]);
    gc.grad_op(OpKind::Expand, 0, &[gy, shape])?;
    Ok(())
}

/// grad = expand(gy / shape(x)[0], shape(x)).
///
/// The divisor is the leading dimension only, whatever the reduced axes are,
/// cast to float32 regardless of the input dtype.
pub(crate) fn reduce_mean_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let x = gc.x(0)?;
    let (divided, shape) = {
        let mut gb = gc.builder(0)?;
        let shape = gb.op(OpKind::Shape, &[x]);
        let zero = gb.constant(Literal::scalar(DType::I64, 0));
        let batch_size_int = gb.op(OpKind::Gather, &[shape, zero]);
        gb.graph().producer_attrs_mut(batch_size_int)?.axis = 0;
        let batch_size = gb.op(OpKind::Cast, &[batch_size_int]);
        gb.graph().producer_attrs_mut(batch_size)?.to = Some(DType::F32);
        let divided = gb.op(OpKind::Div, &[gy, batch_size]);
        (divided, shape)
    };
    gc.grad_op(OpKind::Expand, 0, &[divided, shape])?;
    Ok(())
}

#[cfg(test)]
#[path = "reduction_test.rs"]
mod tests;
