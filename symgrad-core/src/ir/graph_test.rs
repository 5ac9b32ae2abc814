use super::*;
use crate::types::DType;

fn f32_type(dims: &[usize]) -> Type {
    Type::tensor(DType::F32, dims)
}

#[test]
fn test_add_node_links_producer_and_users() {
    let mut graph = Graph::new("g");
    let a = graph.add_input_value("a", f32_type(&[2]));
    let b = graph.add_input_value("b", f32_type(&[2]));
    let c = graph.add_temp("c");
    let node = graph.add_node(OpKind::Add, &[a, b], &[c], "add");

    assert_eq!(graph.value(c).producer(), Some(node));
    assert_eq!(graph.value(a).users(), &[node]);
    assert_eq!(graph.value(b).users(), &[node]);
    assert_eq!(graph.node(node).inputs(), &[a, b]);
    assert_eq!(graph.input_values(), &[a, b]);
}

#[test]
fn test_add_constant_sets_literal_and_type() {
    let mut graph = Graph::new("g");
    let one = graph.add_constant("one", Literal::scalar(DType::F32, 1.0));
    let producer = graph.value(one).producer().expect("constant has a producer");
    assert_eq!(graph.node(producer).kind(), OpKind::Constant);
    assert_eq!(
        graph.node(producer).attrs().value,
        Some(Literal::scalar(DType::F32, 1.0))
    );
    assert_eq!(graph.value(one).ty(), &Type::tensor(DType::F32, &[]));
}

#[test]
fn test_insert_node_output_and_add_input() {
    let mut graph = Graph::new("g");
    let a = graph.add_input_value("a", f32_type(&[]));
    let y = graph.add_temp("y");
    let node = graph.add_node(OpKind::Loop, &[a], &[y], "loop");

    let extra_in = graph.add_temp("extra_in");
    let extra_out = graph.add_temp("extra_out");
    graph.add_node_input(node, extra_in);
    graph.insert_node_output(node, 0, extra_out);

    assert_eq!(graph.node(node).inputs(), &[a, extra_in]);
    assert_eq!(graph.node(node).outputs(), &[extra_out, y]);
    assert_eq!(graph.value(extra_out).producer(), Some(node));
    assert_eq!(graph.value(extra_in).users(), &[node]);
}

#[test]
fn test_gen_name_is_unique() {
    let mut graph = Graph::new("g");
    let n1 = graph.gen_name("x");
    let n2 = graph.gen_name("x");
    assert_ne!(n1, n2);
}

#[test]
fn test_topological_order_only_visits_ancestors() {
    let mut graph = Graph::new("g");
    let a = graph.add_input_value("a", f32_type(&[]));
    let b = graph.add_temp("b");
    let c = graph.add_temp("c");
    let d = graph.add_temp("d");
    let unrelated = graph.add_temp("unrelated");
    let n_b = graph.add_node(OpKind::Neg, &[a], &[b], "nb");
    let n_c = graph.add_node(OpKind::Exp, &[b], &[c], "nc");
    let n_d = graph.add_node(OpKind::Mul, &[b, c], &[d], "nd");
    graph.add_node(OpKind::Tanh, &[a], &[unrelated], "nu");

    let order = graph.topological_order(&[d]);
    assert_eq!(order, vec![n_b, n_c, n_d]);
}

#[test]
fn test_find_value_and_producer_attrs() {
    let mut graph = Graph::new("g");
    let a = graph.add_input_value("a", f32_type(&[]));
    assert_eq!(graph.find_value("a"), Some(a));
    assert_eq!(graph.find_value("missing"), None);
    assert!(matches!(
        graph.producer_attrs_mut(a),
        Err(GradientError::InvalidGraph(_))
    ));
}
