use crate::interpreter::RtValue;
use crate::tensor::Tensor;
use std::collections::HashMap;
use symgrad_core::DType;

/// Checks if a tensor matches the expected shape and data within tolerance.
/// Panics if shapes differ or data differs significantly.
pub fn check_tensor_near(actual: &Tensor, expected_shape: &[usize], expected_data: &[f64], tolerance: f64) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");
    assert_eq!(
        actual.numel(),
        expected_data.len(),
        "Data length mismatch"
    );
    for (i, (a, e)) in actual.data().iter().zip(expected_data).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create an f32 tensor for testing purposes.
pub fn f32_tensor(data: Vec<f64>, shape: &[usize]) -> Tensor {
    Tensor::new(DType::F32, shape.to_vec(), data).expect("Test tensor creation failed")
}

/// Builds a feed map from `(name, value)` pairs.
pub fn feeds<I, V>(pairs: I) -> HashMap<String, RtValue>
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<RtValue>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.into()))
        .collect()
}

pub fn output_tensor<'a>(outputs: &'a HashMap<String, RtValue>, name: &str) -> &'a Tensor {
    outputs
        .get(name)
        .and_then(RtValue::as_tensor)
        .unwrap_or_else(|| panic!("output '{}' is missing or not a tensor", name))
}
