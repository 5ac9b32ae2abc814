use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::OpKind;

pub(crate) fn reshape_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let x = gc.x(0)?;
    let shape = gc.builder(0)?.op(OpKind::Shape, &[x]);
    gc.grad_op(OpKind::Reshape, 0, &[gy, shape])?;
    Ok(())
}

/// Scatters `gy` back to the selected positions of a zero tensor shaped like
/// the input.
pub(crate) fn select_item_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gy = gc.gy(0)?;
    let x = gc.x(0)?;
    let indices = gc.x(1)?;
    let shape = gc.builder(0)?.op(OpKind::Shape, &[x]);
    gc.grad_op(OpKind::SelectItemGrad, 0, &[gy, indices, shape])?;
    Ok(())
}
