use std::sync::Once;
use symgrad_core::ir::{Graph, ValueId};
use symgrad_core::{DType, Type};

static LOGGER_INIT: Once = Once::new();

#[allow(dead_code)]
pub fn setup_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[allow(dead_code)]
pub fn f32_type(dims: &[usize]) -> Type {
    Type::tensor(DType::F32, dims)
}

/// Resolves a value by name, panicking with a readable message if absent.
#[allow(dead_code)]
pub fn value(graph: &Graph, name: &str) -> ValueId {
    graph
        .find_value(name)
        .unwrap_or_else(|| panic!("value '{}' not found in graph '{}'", name, graph.name()))
}
