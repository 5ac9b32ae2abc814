use super::*;
use crate::types::{DType, Type};

// y = x * w, with the output gradient seeded by a graph input.
fn mul_graph() -> (Graph, NodeId, ValueId, ValueId, ValueId, ValueId) {
    let mut graph = Graph::new("g");
    let x = graph.add_input_value("x", Type::tensor(DType::F32, &[3]));
    let w = graph.add_input_value("w", Type::tensor(DType::F32, &[3]));
    let y = graph.add_output_value("y", Type::tensor(DType::F32, &[3]));
    let node = graph.add_node(OpKind::Mul, &[x, w], &[y], "mul");
    let gy = graph.add_input_value("gy", Type::tensor(DType::F32, &[3]));
    (graph, node, x, w, y, gy)
}

#[test]
fn test_x_and_y_without_retention_are_forward_values() {
    let (mut graph, node, x, w, y, _) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, false);

    assert_eq!(gc.x(0).unwrap(), x);
    assert_eq!(gc.x(1).unwrap(), w);
    assert_eq!(gc.y(0).unwrap(), y);
    let before = gc.graph().num_nodes();
    assert_eq!(gc.retain(x), x);
    assert_eq!(gc.graph().num_nodes(), before);
}

#[test]
fn test_index_out_of_range() {
    let (mut graph, node, ..) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, false);

    assert_eq!(
        gc.x(2),
        Err(GradientError::IndexOutOfRange {
            op: OpKind::Mul,
            port: Port::Input,
            index: 2,
            len: 2
        })
    );
    assert!(matches!(
        gc.y(1),
        Err(GradientError::IndexOutOfRange { port: Port::Output, .. })
    ));
}

#[test]
fn test_gy_requires_bound_gradient() {
    let (mut graph, node, _, _, y, gy) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    {
        let gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, false);
        assert_eq!(gc.gy(0), Err(GradientError::MissingGradient("y".to_string())));
    }
    grads.bind(y, gy);
    let gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, false);
    assert_eq!(gc.gy(0), Ok(gy));
}

#[test]
fn test_set_grad_accumulates_with_add() {
    let (mut graph, node, x, w, _, gy) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, false);

    gc.set_grad(0, gy).unwrap();
    gc.set_grad(0, w).unwrap();
    let sum = gc.grads().get(x).expect("gradient bound");
    let producer = gc.graph().value(sum).producer().expect("sum has a producer");
    assert_eq!(gc.graph().node(producer).kind(), OpKind::Add);
    assert_eq!(gc.graph().node(producer).inputs(), &[gy, w]);
}

#[test]
fn test_grad_op_binds_output_and_exposes_attrs() {
    let (mut graph, node, x, _, y, gy) = mul_graph();
    let mut grads = GradientMap::new();
    grads.bind(y, gy);
    let mut pass = GradientPass::new();
    let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, false);

    let g = gc.gy(0).unwrap();
    let gx = gc.grad_op(OpKind::ReduceSum, 0, &[g]).unwrap();
    gc.attrs_mut(gx).unwrap().keepdims = false;

    assert_eq!(gc.grads().get(x), Some(gx));
    let producer = gc.graph().value(gx).producer().unwrap();
    assert_eq!(gc.graph().node(producer).kind(), OpKind::ReduceSum);
    assert!(!gc.graph().node(producer).attrs().keepdims);
    assert!(gc.graph().value(gx).name().starts_with("grad@x"));
}

#[test]
fn test_retain_emits_paired_push_and_pop() {
    let (mut graph, node, x, ..) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, true);

    let r0 = gc.x(0).unwrap();
    let r1 = gc.x(1).unwrap();
    let r2 = gc.y(0).unwrap();
    assert_ne!(r0, x);
    assert_eq!(gc.graph().value(r0).ty(), gc.graph().value(x).ty());

    let graph = gc.graph();
    let pushes: Vec<(i64, ValueId)> = graph
        .nodes()
        .filter(|(_, n)| n.kind() == OpKind::BackpropStackPush)
        .map(|(_, n)| (n.attrs().stack_id, n.inputs()[0]))
        .collect();
    let pops: Vec<(i64, ValueId)> = graph
        .nodes()
        .filter(|(_, n)| n.kind() == OpKind::BackpropStackPop)
        .map(|(_, n)| (n.attrs().stack_id, n.outputs()[0]))
        .collect();

    assert_eq!(pushes.iter().map(|p| p.0).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(pops, vec![(1, r0), (2, r1), (3, r2)]);
    assert!(graph
        .nodes()
        .filter(|(_, n)| n.kind() == OpKind::BackpropStackPush)
        .all(|(_, n)| n.outputs().is_empty()));
}

#[test]
fn test_retention_replay_is_lifo_per_id() {
    let (mut graph, node, ..) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, true);
    gc.x(0).unwrap();
    gc.x(1).unwrap();
    let graph = gc.graph();

    // Simulate three forward iterations pushing (iteration, id) and three
    // backward iterations popping in reverse.
    let ids: Vec<i64> = graph
        .nodes()
        .filter(|(_, n)| n.kind() == OpKind::BackpropStackPush)
        .map(|(_, n)| n.attrs().stack_id)
        .collect();
    let mut stacks: HashMap<i64, Vec<usize>> = HashMap::new();
    for iteration in 0..3 {
        for &id in &ids {
            stacks.entry(id).or_default().push(iteration);
        }
    }
    for expected in (0..3).rev() {
        for (_, pop) in graph
            .nodes()
            .filter(|(_, n)| n.kind() == OpKind::BackpropStackPop)
        {
            let id = pop.attrs().stack_id;
            assert_eq!(stacks.get_mut(&id).and_then(|s| s.pop()), Some(expected));
        }
    }
    assert!(stacks.values().all(|s| s.is_empty()));
}

#[test]
fn test_stack_ids_are_unique_across_contexts_of_one_pass() {
    let (mut graph, node, ..) = mul_graph();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    {
        let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, true);
        gc.x(0).unwrap();
    }
    {
        let mut gc = GradientContext::new(&mut graph, &mut grads, &mut pass, node, true);
        gc.x(0).unwrap();
    }
    assert_eq!(pass.num_retained(), 2);
    let mut ids: Vec<i64> = graph
        .nodes()
        .filter(|(_, n)| n.kind() == OpKind::BackpropStackPop)
        .map(|(_, n)| n.attrs().stack_id)
        .collect();
    ids.dedup();
    assert_eq!(ids, vec![1, 2]);
}
