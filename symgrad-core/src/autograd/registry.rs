use crate::autograd::context::{GradientContext, GradientMap, GradientPass};
use crate::autograd::rules::{
    activation, arithmetic, linalg, loop_grad, nn, reduction, sequence, shape,
};
use crate::error::{GradientError, Port};
use crate::ir::{Graph, NodeId, OpKind};
use log::debug;
use Arity::{Any, Exactly};

/// Declared input or output count of a differentiable operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    /// Variadic operator, not checked.
    Any,
}

/// A gradient rule: emits the gradient nodes of one forward node.
pub type GradFn = fn(&mut GradientContext<'_>) -> Result<(), GradientError>;

/// Entry of the gradient rule table.
#[derive(Clone, Copy)]
pub struct GradientFunc {
    pub num_inputs: Arity,
    pub num_outputs: Arity,
    pub func: GradFn,
}

fn entry(num_inputs: Arity, num_outputs: Arity, func: GradFn) -> GradientFunc {
    GradientFunc {
        num_inputs,
        num_outputs,
        func,
    }
}

/// Looks up the gradient rule of `kind`.
///
/// The table is closed: operators that only appear in emitted gradient code
/// have no rule and yield `None`.
pub fn gradient_func(kind: OpKind) -> Option<GradientFunc> {
    let func = match kind {
        OpKind::Add => entry(Exactly(2), Exactly(1), arithmetic::add_grad),
        OpKind::Sub => entry(Exactly(2), Exactly(1), arithmetic::sub_grad),
        OpKind::Mul => entry(Exactly(2), Exactly(1), arithmetic::mul_grad),
        OpKind::Div => entry(Exactly(2), Exactly(1), arithmetic::div_grad),
        OpKind::Neg => entry(Exactly(1), Exactly(1), arithmetic::neg_grad),
        OpKind::Exp => entry(Exactly(1), Exactly(1), activation::exp_grad),
        OpKind::Sigmoid => entry(Exactly(1), Exactly(1), activation::sigmoid_grad),
        OpKind::Relu => entry(Exactly(1), Exactly(1), activation::relu_grad),
        OpKind::Sqrt => entry(Exactly(1), Exactly(1), activation::sqrt_grad),
        OpKind::Tanh => entry(Exactly(1), Exactly(1), activation::tanh_grad),
        OpKind::Identity => entry(Exactly(1), Exactly(1), activation::identity_grad),
        // The dropout mask is not modeled.
        OpKind::Dropout => entry(Exactly(1), Exactly(1), activation::identity_grad),
        OpKind::Reshape => entry(Exactly(2), Exactly(1), shape::reshape_grad),
        OpKind::SelectItem => entry(Exactly(2), Exactly(1), shape::select_item_grad),
        OpKind::ReduceSum => entry(Exactly(1), Exactly(1), reduction::reduce_sum_grad),
        OpKind::ReduceMean => entry(Exactly(1), Exactly(1), reduction::reduce_mean_grad),
        OpKind::Gemm => entry(Exactly(3), Exactly(1), linalg::gemm_grad),
        OpKind::Conv => entry(Any, Exactly(1), linalg::conv_grad),
        OpKind::MaxPool => entry(Exactly(1), Exactly(1), nn::max_pool_grad),
        OpKind::AveragePool => entry(Exactly(1), Exactly(1), nn::average_pool_grad),
        OpKind::LogSoftmax => entry(Exactly(1), Exactly(1), activation::log_softmax_grad),
        OpKind::Softmax => entry(Exactly(1), Exactly(1), activation::softmax_grad),
        OpKind::BatchNormalization => entry(Exactly(5), Any, nn::batch_normalization_grad),
        OpKind::Lrn => entry(Exactly(1), Exactly(1), nn::lrn_grad),
        OpKind::Greater => entry(Exactly(2), Exactly(1), do_nothing_grad),
        OpKind::Constant => entry(Exactly(0), Exactly(1), do_nothing_grad),
        OpKind::Loop => entry(Any, Any, loop_grad::loop_grad),
        OpKind::SequenceStack => entry(Exactly(1), Exactly(1), sequence::sequence_stack_grad),
        OpKind::SequenceAppend => entry(Exactly(2), Exactly(1), sequence::sequence_append_grad),

        OpKind::Shape
        | OpKind::Expand
        | OpKind::Gather
        | OpKind::Cast
        | OpKind::LoopRef
        | OpKind::SequenceSplit
        | OpKind::SequencePop
        | OpKind::ReluGrad
        | OpKind::SelectItemGrad
        | OpKind::ConvTransposeWithDynamicOutputShape
        | OpKind::ConvGradWeight
        | OpKind::MaxPoolGrad
        | OpKind::AveragePoolGrad
        | OpKind::LrnGrad
        | OpKind::BatchNormalizationGrad
        | OpKind::BackpropStackPush
        | OpKind::BackpropStackPop => return None,
    };
    Some(func)
}

fn do_nothing_grad(_gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    Ok(())
}

fn check_arity(op: OpKind, port: Port, expected: Arity, actual: usize) -> Result<(), GradientError> {
    match expected {
        Exactly(expected) if expected != actual => Err(GradientError::ArityMismatch {
            op,
            port,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Emits the gradient nodes of one forward node of `graph`.
///
/// Must be called once per forward node, in reverse topological order, after
/// every output of `node` that carries a gradient has it bound in `grads`.
/// On return every differentiable input of `node` has a gradient bound.
pub fn add_gradient_for_node(
    graph: &mut Graph,
    grads: &mut GradientMap,
    pass: &mut GradientPass,
    node: NodeId,
    retain_in_stack: bool,
) -> Result<(), GradientError> {
    let (kind, num_inputs, num_outputs) = {
        let n = graph.node(node);
        (n.kind(), n.inputs().len(), n.outputs().len())
    };
    let func = gradient_func(kind).ok_or(GradientError::Unsupported(kind))?;
    check_arity(kind, Port::Input, func.num_inputs, num_inputs)?;
    check_arity(kind, Port::Output, func.num_outputs, num_outputs)?;

    debug!(
        "Adding gradient for {} node '{}' (retain_in_stack={})",
        kind,
        graph.node(node).name(),
        retain_in_stack
    );
    let mut gc = GradientContext::new(graph, grads, pass, node, retain_in_stack);
    (func.func)(&mut gc)
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
