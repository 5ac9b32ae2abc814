use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::OpKind;
use log::trace;

/// Gradients of `y = alpha * op(a) @ op(b) + beta * c`.
///
/// Each input gradient is a `Gemm` with `beta = 0`, so its third operand is
/// only a placeholder and is never read. Transpositions are folded into the
/// flags instead of emitting explicit transposes:
///
/// | transA | grad(a)                 |
/// |--------|-------------------------|
/// | false  | alpha * gy @ op(b)^T    |
/// | true   | alpha * op(b) @ gy^T    |
///
/// and symmetrically for `b`. The bias gradient sums `gy` over the batch
/// axis, which assumes `c` was broadcast along it.
pub(crate) fn gemm_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let (alpha, trans_a, trans_b) = {
        let attrs = gc.node().attrs();
        (attrs.alpha, attrs.trans_a, attrs.trans_b)
    };
    let gy = gc.gy(0)?;
    let a = gc.x(0)?;
    let b = gc.x(1)?;

    let ga = if trans_a {
        gc.grad_op(OpKind::Gemm, 0, &[b, gy, a])?
    } else {
        gc.grad_op(OpKind::Gemm, 0, &[gy, b, a])?
    };
    {
        let attrs = gc.attrs_mut(ga)?;
        attrs.alpha = alpha;
        attrs.beta = 0.0;
        if trans_a {
            attrs.trans_a = trans_b;
            attrs.trans_b = true;
        } else {
            attrs.trans_a = false;
            attrs.trans_b = !trans_b;
        }
    }

    let gb = if trans_b {
        gc.grad_op(OpKind::Gemm, 1, &[gy, a, b])?
    } else {
        gc.grad_op(OpKind::Gemm, 1, &[a, gy, b])?
    };
    {
        let attrs = gc.attrs_mut(gb)?;
        attrs.alpha = alpha;
        attrs.beta = 0.0;
        if trans_b {
            attrs.trans_a = true;
            attrs.trans_b = trans_a;
        } else {
            attrs.trans_a = !trans_a;
            attrs.trans_b = false;
        }
    }

    let gc_bias = gc.grad_op(OpKind::ReduceSum, 2, &[gy])?;
    let attrs = gc.attrs_mut(gc_bias)?;
    attrs.axes = vec![0];
    attrs.keepdims = false;
    Ok(())
}

/// Gradients of an N-d convolution `(x, w[, bias])`.
pub(crate) fn conv_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let (strides, pads, kernel_shape) = {
        let attrs = gc.node().attrs();
        (attrs.strides.clone(), attrs.pads.clone(), attrs.kernel_shape.clone())
    };
    let has_bias = gc.num_inputs() == 3;
    if has_bias && kernel_shape.is_empty() {
        return Err(GradientError::MissingKernelShape(OpKind::Conv));
    }

    let gy = gc.gy(0)?;
    let w = gc.x(1)?;
    let x = gc.x(0)?;
    let x_shape = gc.builder(0)?.op(OpKind::Shape, &[x]);

    let gx = gc.grad_op(
        OpKind::ConvTransposeWithDynamicOutputShape,
        0,
        &[gy, w, x_shape],
    )?;
    {
        let attrs = gc.attrs_mut(gx)?;
        attrs.strides = strides.clone();
        attrs.pads = pads.clone();
    }

    let gw = gc.grad_op(OpKind::ConvGradWeight, 1, &[w, x, gy])?;
    {
        let attrs = gc.attrs_mut(gw)?;
        attrs.strides = strides;
        attrs.pads = pads;
    }

    if has_bias {
        // Sum over the batch axis and every spatial axis.
        let axes: Vec<i64> = std::iter::once(0)
            .chain(2..2 + kernel_shape.len() as i64)
            .collect();
        trace!("Conv bias gradient reduces axes {:?}", axes);
        let gbias = gc.grad_op(OpKind::ReduceSum, 2, &[gy])?;
        let attrs = gc.attrs_mut(gbias)?;
        attrs.axes = axes;
        attrs.keepdims = false;
    }
    Ok(())
}

#[cfg(test)]
#[path = "linalg_test.rs"]
mod tests;
