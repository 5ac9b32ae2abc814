use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Once;
use symgrad_core::{DType, Graph, Literal, OpKind, Type, ValueId};
use symgrad_runtime::grad_check::check_backward;
use symgrad_runtime::{RtValue, Tensor};

static LOGGER_INIT: Once = Once::new();

pub const EPSILON: f64 = 1e-6;
pub const TOLERANCE: f64 = 1e-4;

#[allow(dead_code)]
pub fn setup_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[allow(dead_code)]
pub fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[allow(dead_code)]
pub fn f32_type(dims: &[usize]) -> Type {
    Type::tensor(DType::F32, dims)
}

#[allow(dead_code)]
pub fn scalar_type(dtype: DType) -> Type {
    Type::tensor(dtype, &[])
}

/// Uniform random f32 tensor in `[low, high)`.
#[allow(dead_code)]
pub fn uniform(rng: &mut StdRng, shape: &[usize], low: f64, high: f64) -> Tensor {
    Tensor::rand_uniform(DType::F32, shape, low, high, rng)
}

#[allow(dead_code)]
pub fn f32_scalar(value: f64) -> Tensor {
    Tensor::scalar(DType::F32, value)
}

/// One seed per graph output, filled with ones.
#[allow(dead_code)]
pub fn unit_seeds(outputs: &[(&str, &[usize])]) -> HashMap<String, Tensor> {
    outputs
        .iter()
        .map(|(name, shape)| (name.to_string(), Tensor::full(DType::F32, shape, 1.0)))
        .collect()
}

/// Wraps one operator into a graph with inputs `x0..` and the output `y`.
#[allow(dead_code)]
pub fn single_op_graph(kind: OpKind, input_types: &[Type]) -> (Graph, Vec<ValueId>, ValueId) {
    let mut graph = Graph::new(format!("{}_graph", kind.name()));
    let inputs: Vec<ValueId> = input_types
        .iter()
        .enumerate()
        .map(|(i, ty)| graph.add_input_value(format!("x{}", i), ty.clone()))
        .collect();
    let y = graph.add_output_value("y", Type::Unknown);
    graph.add_node(kind, &inputs, &[y], kind.name());
    (graph, inputs, y)
}

#[allow(dead_code)]
pub fn add_f32_constant(graph: &mut Graph, name: &str, value: f64) -> ValueId {
    graph.add_constant(name, Literal::scalar(DType::F32, value))
}

/// Runs the finite-difference check and panics with the mismatch on failure.
#[allow(dead_code)]
pub fn assert_gradients_match(
    graph: &Graph,
    feeds: &HashMap<String, RtValue>,
    seeds: &HashMap<String, Tensor>,
) {
    if let Err(e) = check_backward(graph, feeds, seeds, EPSILON, TOLERANCE) {
        panic!("gradient check failed for graph '{}': {}", graph.name(), e);
    }
}
