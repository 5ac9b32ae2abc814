//! Gradient of a `Loop` node.
//!
//! Running a loop backward needs, for every reverse iteration, the forward
//! values of the matching forward iteration. The transform therefore:
//!
//! 1. Adds an iteration counter to the forward loop so the backward loop
//!    knows how many iterations to run.
//! 2. Differentiates the body with retention enabled. Every forward value a
//!    body rule reads is pushed to a per-id stack during the forward loop and
//!    popped, in reverse order, by the backward loop.
//! 3. Emits a `LoopRef` node in the outer graph. It reruns the same body
//!    graph, binding the gradient inputs and outputs by name, for as many
//!    iterations as the forward loop ran.
//!
//! Scan outputs and a non-zero `stack_axis` are rejected.

use crate::autograd::driver::add_gradient_nodes_for;
use crate::autograd::{GradientContext, GradientMap};
use crate::error::GradientError;
use crate::ir::{Graph, GraphBuilder, NodeId, OpKind, ValueId, ValueKind};
use crate::types::{DType, Literal, Type};
use log::debug;

pub(crate) fn loop_grad(gc: &mut GradientContext<'_>) -> Result<(), GradientError> {
    let loop_node = gc.node_id();
    let mut body = gc
        .graph_mut()
        .node_mut(loop_node)
        .take_body()
        .ok_or_else(|| GradientError::InvalidGraph("Loop node has no body".to_string()))?;
    let result = loop_grad_with_body(gc, &mut body);
    gc.graph_mut().node_mut(loop_node).set_body(body);
    result
}

/// Number of loop-carried states, after checking that the loop and its body
/// agree on it.
fn check_loop_signature(gc: &GradientContext<'_>, body: &Graph) -> Result<usize, GradientError> {
    let num_loop_inputs = gc.num_inputs();
    let num_loop_outputs = gc.num_outputs();
    if num_loop_inputs < 2 {
        return Err(GradientError::LoopArity(format!(
            "Loop takes a trip count and a condition, got {} inputs",
            num_loop_inputs
        )));
    }
    let num_states = num_loop_inputs - 2;
    let num_body_inputs = body.input_values().len();
    let num_body_outputs = body.output_values().len();
    if num_body_inputs != num_states + 2 {
        return Err(GradientError::LoopArity(format!(
            "body takes {} inputs, expected {}",
            num_body_inputs,
            num_states + 2
        )));
    }
    if num_body_outputs < num_states + 1 {
        return Err(GradientError::LoopArity(format!(
            "body returns {} outputs, expected at least {}",
            num_body_outputs,
            num_states + 1
        )));
    }
    let num_scans = num_body_outputs - 1 - num_states;
    if num_loop_outputs != num_states + num_scans {
        return Err(GradientError::LoopArity(format!(
            "Loop has {} outputs, expected {}",
            num_loop_outputs,
            num_states + num_scans
        )));
    }
    if num_scans != 0 {
        return Err(GradientError::NotImplemented(
            "gradient of a Loop with scan outputs".to_string(),
        ));
    }
    let stack_axis = gc.node().attrs().stack_axis;
    if stack_axis != 0 {
        return Err(GradientError::NotImplemented(format!(
            "gradient of a Loop with stack_axis {}",
            stack_axis
        )));
    }
    if body.name().is_empty() {
        return Err(GradientError::InvalidGraph(
            "Loop body must have a name".to_string(),
        ));
    }
    Ok(num_states)
}

/// Carries an iteration counter through the loop.
///
/// The counter enters as an extra state initialized to 0, the body adds 1 to
/// it, and its final value becomes the loop output at index `num_states`,
/// after the original states.
fn add_iteration_counter(
    graph: &mut Graph,
    loop_node: NodeId,
    body: &mut Graph,
    num_states: usize,
) {
    let anchor = graph.node(loop_node).inputs()[0];
    let mut gb = GraphBuilder::new(graph, "LoopGradIterCnt", anchor);
    let initial = gb.constant(Literal::scalar(DType::I64, 0));
    let name = gb.gen_name();
    let counter = gb
        .graph()
        .add_value(name, Type::tensor(DType::I64, &[]), ValueKind::Temporary);
    graph.add_node_input(loop_node, initial);
    graph.insert_node_output(loop_node, num_states, counter);

    let body_anchor = body.input_values()[0];
    let mut gb = GraphBuilder::new(body, "LoopGradIterCntBody", body_anchor);
    let one = gb.constant(Literal::scalar(DType::I64, 1));
    let in_name = gb.gen_name();
    let out_name = gb.gen_name();
    let cnt_in = gb
        .graph()
        .add_value(in_name, Type::tensor(DType::I64, &[]), ValueKind::Input);
    let cnt_out = gb
        .graph()
        .add_value(out_name, Type::tensor(DType::I64, &[]), ValueKind::Output);
    gb.multi_op(OpKind::Add, &[cnt_in, one], &[cnt_out]);
    body.push_input_value(cnt_in);
    body.push_output_value(cnt_out);
}

fn loop_grad_with_body(gc: &mut GradientContext<'_>, body: &mut Graph) -> Result<(), GradientError> {
    let loop_node = gc.node_id();
    let num_states = check_loop_signature(gc, body)?;

    add_iteration_counter(gc.graph_mut(), loop_node, body, num_states);

    // Backward body. Its inputs are (iteration, condition, gys...) and its
    // outputs (condition, gxs...), all bound by name.
    let body_anchor = body.input_values()[0];
    let mut body_grads = GradientMap::new();
    let mut input_value_names = Vec::with_capacity(num_states + 2);
    let mut output_value_names = Vec::with_capacity(num_states + 1);
    for _ in 0..2 {
        let name = body.gen_name("LoopGradBody_in");
        body.add_temp(name.clone());
        input_value_names.push(name);
    }
    let mut ys: Vec<ValueId> = Vec::with_capacity(num_states);
    for i in 0..num_states {
        let y = body.output_values()[i + 1];
        let prefix = format!("loop_grad_in@{}", body.value(y).name());
        let name = body.gen_name(&prefix);
        let gy_in = body.add_temp(name.clone());
        let mut gb = GraphBuilder::new(body, "LoopGradBody", body_anchor);
        let gy = gb.op(OpKind::Identity, &[gy_in]);
        // A body value returned for several states collects every state's gradient.
        match body_grads.get(y) {
            Some(prev) => {
                let sum = gb.op(OpKind::Add, &[prev, gy]);
                body_grads.bind(y, sum);
            }
            None => {
                body_grads.bind(y, gy);
                ys.push(y);
            }
        }
        input_value_names.push(name);
    }

    add_gradient_nodes_for(body, &mut body_grads, gc.pass_mut(), &ys, true)?;

    let cond = GraphBuilder::new(body, "LoopGradBody", body_anchor)
        .constant(Literal::scalar(DType::Bool, 1));
    output_value_names.push(body.value(cond).name().to_string());
    for i in 0..num_states {
        let x = body.input_values()[i + 2];
        let gx = body_grads
            .get(x)
            .ok_or_else(|| GradientError::MissingGradient(body.value(x).name().to_string()))?;
        let out = GraphBuilder::new(body, "LoopGradBody", body_anchor).op(OpKind::Identity, &[gx]);
        output_value_names.push(body.value(out).name().to_string());
    }

    // Backward loop in the outer graph. The retained counter gives the trip
    // count and the condition is absent.
    let mut gys = Vec::with_capacity(num_states);
    for i in 0..num_states {
        gys.push(gc.gy(i)?);
    }
    let mut gxs = Vec::with_capacity(num_states);
    for i in 0..num_states {
        gxs.push(gc.add_grad_value(i + 2)?);
    }
    let trip_count = gc.y(num_states)?;
    let no_cond = gc.graph_mut().add_null_value();
    let mut inputs = vec![trip_count, no_cond];
    inputs.extend(gys);

    let anchor = gc.input(0)?;
    let backward = GraphBuilder::new(gc.graph_mut(), "LoopGrad", anchor)
        .multi_op(OpKind::LoopRef, &inputs, &gxs);
    let attrs = gc.graph_mut().node_mut(backward).attrs_mut();
    attrs.body_ref = body.name().to_string();
    attrs.input_value_names = input_value_names;
    attrs.output_value_names = output_value_names;

    debug!(
        "Loop body '{}' differentiated: {} states, {} retentions so far",
        body.name(),
        num_states,
        gc.pass_mut().num_retained()
    );
    body_grads.clear();
    Ok(())
}

#[cfg(test)]
#[path = "loop_grad_test.rs"]
mod tests;
