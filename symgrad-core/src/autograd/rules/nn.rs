use crate::autograd::GradientContext;
use crate::error::GradientError;
use crate::ir::{GraphBuilder, OpKind};
use crate::types::{DType, Literal};

fn pool_grad(gc: &mut GradientContext<'_>, grad_kind: OpKind) -> Result<(), GradientError> {
    let (kernel_shape, strides, pads) = {
        let attrs = gc.node().attrs();
        (attrs.kernel_shape.clone(), attrs.strides.clone(), attrs.pads.clone())
    };
    let gy = gc.gy(0)?;
    let y = gc.y(0)?;
    let gx = gc.grad_op(grad_kind, 0, &[y, gy])?;
    let attrs = gc.attrs_mut(gx)?;
    attrs.kernel_shape = kernel_shape;
    attrs.strides = strides;
    attrs.pads = pads;
    Ok(())
}

pub(crate) fn max_pool_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    pool_grad(gc, OpKind::MaxPoolGrad)
}

pub(crate) fn average_pool_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    pool_grad(gc, OpKind::AveragePoolGrad)
}

pub(crate) fn lrn_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let (alpha, beta, bias, size) = {
        let attrs = gc.node().attrs();
        (attrs.alpha, attrs.beta, attrs.bias, attrs.size)
    };
    let gy = gc.gy(0)?;
    let x = gc.x(0)?;
    let y = gc.y(0)?;
    let gx = gc.grad_op(OpKind::LrnGrad, 0, &[x, y, gy])?;
    let attrs = gc.attrs_mut(gx)?;
    attrs.alpha = alpha;
    attrs.beta = beta;
    attrs.bias = bias;
    attrs.size = size;
    Ok(())
}

/// `BatchNormalizationGrad(y, gy)` yields the gradients of `x`, `scale` and
/// `bias` in one node. The running mean and variance get a constant zero.
pub(crate) fn batch_normalization_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let (epsilon, momentum) = {
        let attrs = gc.node().attrs();
        (attrs.epsilon, attrs.momentum)
    };
    let gx0 = gc.add_grad_value(0)?;
    let gx1 = gc.add_grad_value(1)?;
    let gx2 = gc.add_grad_value(2)?;
    let y = gc.y(0)?;
    let gy = gc.gy(0)?;
    let bn = gc
        .builder(0)?
        .multi_op(OpKind::BatchNormalizationGrad, &[y, gy], &[gx0, gx1, gx2]);
    let attrs = gc.graph_mut().node_mut(bn).attrs_mut();
    attrs.epsilon = epsilon;
    attrs.momentum = momentum;

    let x = gc.input(0)?;
    let dtype = gc.graph().value(x).ty().dtype().unwrap_or(DType::F32);
    let zero = GraphBuilder::new(gc.graph_mut(), "grad_tmp_zero", x)
        .constant(Literal::new(dtype, vec![1], vec![0.0]));
    gc.set_grad(3, zero)?;
    gc.set_grad(4, zero)
}
