use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::OpKind;

pub(crate) fn sequence_stack_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let axis = gc.node().attrs().axis;
    let gy = gc.gy(0)?;
    let gx = gc.grad_op(OpKind::SequenceSplit, 0, &[gy])?;
    gc.attrs_mut(gx)?.axis = axis;
    Ok(())
}

/// `SequencePop(gy)` splits the sequence gradient back into the gradient of
/// the shorter sequence and of the appended element.
pub(crate) fn sequence_append_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let gseq = gc.add_grad_value(0)?;
    let gelem = gc.add_grad_value(1)?;
    let gy = gc.gy(0)?;
    gc.builder(0)?
        .multi_op(OpKind::SequencePop, &[gy], &[gseq, gelem]);
    Ok(())
}

#[cfg(test)]
#[path = "sequence_test.rs"]
mod tests;
