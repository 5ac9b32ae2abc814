use crate::autograd::{add_gradient_for_node, GradientMap, GradientPass};
use crate::error::GradientError;
use crate::ir::{Graph, OpKind};
use crate::types::{DType, Type};
use crate::utils::testing::{nodes_of_kind, op_fixture, producer};

fn f32_type(dims: &[usize]) -> Type {
    Type::tensor(DType::F32, dims)
}

#[test]
fn test_add_binds_gy_to_both_inputs() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::Add, &[f32_type(&[2]), f32_type(&[2])], 1);
    let before = f.graph.num_nodes();
    let grads = f.differentiate(false)?;
    assert_eq!(grads.get(f.inputs[0]), Some(f.seeds[0]));
    assert_eq!(grads.get(f.inputs[1]), Some(f.seeds[0]));
    assert_eq!(f.graph.num_nodes(), before);
    Ok(())
}

#[test]
fn test_add_of_same_value_accumulates() -> Result<(), GradientError> {
    // y = x + x: the second contribution is summed with the first.
    let mut graph = Graph::new("g");
    let x = graph.add_input_value("x", f32_type(&[2]));
    let y = graph.add_output_value("y", f32_type(&[2]));
    let node = graph.add_node(OpKind::Add, &[x, x], &[y], "add");
    let gy = graph.add_input_value("gy", f32_type(&[2]));
    let mut grads = GradientMap::new();
    grads.bind(y, gy);
    add_gradient_for_node(&mut graph, &mut grads, &mut GradientPass::new(), node, false)?;

    let gx = grads.get(x).unwrap();
    let sum = producer(&graph, gx).unwrap();
    assert_eq!(sum.kind(), OpKind::Add);
    assert_eq!(sum.inputs(), &[gy, gy]);
    Ok(())
}

#[test]
fn test_sub_negates_second_gradient() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::Sub, &[f32_type(&[2]), f32_type(&[2])], 1);
    let grads = f.differentiate(false)?;
    assert_eq!(grads.get(f.inputs[0]), Some(f.seeds[0]));
    let neg = producer(&f.graph, grads.get(f.inputs[1]).unwrap()).unwrap();
    assert_eq!(neg.kind(), OpKind::Neg);
    assert_eq!(neg.inputs(), &[f.seeds[0]]);
    Ok(())
}

#[test]
fn test_mul_uses_the_other_operand() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::Mul, &[f32_type(&[2]), f32_type(&[2])], 1);
    let grads = f.differentiate(false)?;
    let ga = producer(&f.graph, grads.get(f.inputs[0]).unwrap()).unwrap();
    let gb = producer(&f.graph, grads.get(f.inputs[1]).unwrap()).unwrap();
    assert_eq!(ga.kind(), OpKind::Mul);
    assert_eq!(ga.inputs(), &[f.inputs[1], f.seeds[0]]);
    assert_eq!(gb.inputs(), &[f.inputs[0], f.seeds[0]]);
    Ok(())
}

#[test]
fn test_mul_with_retention_reads_popped_operands() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::Mul, &[f32_type(&[2]), f32_type(&[2])], 1);
    let grads = f.differentiate(true)?;
    assert_eq!(nodes_of_kind(&f.graph, OpKind::BackpropStackPush).len(), 2);
    assert_eq!(nodes_of_kind(&f.graph, OpKind::BackpropStackPop).len(), 2);

    let ga = producer(&f.graph, grads.get(f.inputs[0]).unwrap()).unwrap();
    let operand = producer(&f.graph, ga.inputs()[0]).unwrap();
    assert_eq!(operand.kind(), OpKind::BackpropStackPop);
    // The seed is a gradient, not a forward value: it is never retained.
    assert_eq!(ga.inputs()[1], f.seeds[0]);
    Ok(())
}

#[test]
fn test_div_builds_second_gradient_from_first() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::Div, &[f32_type(&[]), f32_type(&[])], 1);
    let (a, b, gy) = (f.inputs[0], f.inputs[1], f.seeds[0]);
    let grads = f.differentiate(false)?;
    let g = &f.graph;

    let ga = grads.get(a).unwrap();
    let ga_node = producer(g, ga).unwrap();
    assert_eq!(ga_node.kind(), OpKind::Div);
    assert_eq!(ga_node.inputs(), &[gy, b]);

    // grad(b) = Div(Mul(Neg(grad(a)), a), b)
    let gb_node = producer(g, grads.get(b).unwrap()).unwrap();
    assert_eq!(gb_node.kind(), OpKind::Div);
    assert_eq!(gb_node.inputs()[1], b);
    let mul = producer(g, gb_node.inputs()[0]).unwrap();
    assert_eq!(mul.kind(), OpKind::Mul);
    assert_eq!(mul.inputs()[1], a);
    let neg = producer(g, mul.inputs()[0]).unwrap();
    assert_eq!(neg.kind(), OpKind::Neg);
    assert_eq!(neg.inputs(), &[ga]);
    Ok(())
}

#[test]
fn test_neg() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::Neg, &[f32_type(&[3])], 1);
    let grads = f.differentiate(false)?;
    let neg = producer(&f.graph, grads.get(f.inputs[0]).unwrap()).unwrap();
    assert_eq!(neg.kind(), OpKind::Neg);
    assert_eq!(neg.name(), "NegGrad");
    Ok(())
}
