use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, RtValue};
use crate::tensor::Tensor;
use approx::relative_eq;
use log::debug;
use std::collections::HashMap;
use symgrad_core::{add_gradient_nodes, Graph, GradientError, GradientOptions};
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input '{input}', element index {element_index}: Analytical grad {analytical_grad:?} != Numerical grad {numerical_grad:?}. Difference: {difference:?}")]
    GradientMismatch {
        input: String,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },

    #[error("Numerical gradient is NaN or infinite for input '{input}', element {element_index}. Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        input: String,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },

    #[error("Analytical gradient is NaN or infinite for input '{input}', element {element_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite {
        input: String,
        element_index: usize,
        value: f64,
    },

    #[error("No feed for input '{0}'")]
    MissingFeed(String),

    #[error("No seed gradient for output '{0}'")]
    MissingSeed(String),

    #[error("Value '{0}' is not a tensor")]
    NotATensor(String),

    #[error("Gradient construction failed: {0}")]
    Gradient(#[from] GradientError),

    #[error("Execution failed during gradient check: {0}")]
    Runtime(#[from] RuntimeError),
}

fn expect_tensor(name: &str, value: Option<&RtValue>) -> Result<Tensor, GradCheckError> {
    value
        .and_then(RtValue::as_tensor)
        .cloned()
        .ok_or_else(|| GradCheckError::NotATensor(name.to_string()))
}

/// Differentiates a copy of `graph`, runs it, and returns `dL/dx` for every
/// float tensor input `x`, where `L = sum over outputs y of sum(seeds[y] * y)`.
///
/// Gradients of sequence inputs are computed but not returned.
pub fn compute_gradients(
    graph: &Graph,
    feeds: &HashMap<String, RtValue>,
    seeds: &HashMap<String, Tensor>,
) -> Result<HashMap<String, Tensor>, GradCheckError> {
    let mut backward = graph.clone();
    let options = GradientOptions::default();
    let result = add_gradient_nodes(&mut backward, &options)?;

    let mut all_feeds = feeds.clone();
    for &(y, seed) in &result.seeds {
        let y_name = backward.value(y).name();
        let dy = seeds
            .get(y_name)
            .ok_or_else(|| GradCheckError::MissingSeed(y_name.to_string()))?;
        all_feeds.insert(backward.value(seed).name().to_string(), dy.clone().into());
    }

    let names: Vec<&str> = result
        .grads
        .iter()
        .map(|&(_, gx)| backward.value(gx).name())
        .collect();
    let outputs = Interpreter::new().run_outputs(&backward, &all_feeds, &names)?;

    let mut grads = HashMap::new();
    for &(x, gx) in &result.grads {
        let gx_name = backward.value(gx).name();
        match outputs.get(gx_name) {
            Some(RtValue::Sequence(_)) => {
                debug!("Skipping sequence-valued gradient '{}'", gx_name);
            }
            value => {
                let tensor = expect_tensor(gx_name, value)?;
                grads.insert(backward.value(x).name().to_string(), tensor);
            }
        }
    }
    Ok(grads)
}

/// `sum over outputs y of sum(seeds[y] * y)` for one forward run.
fn weighted_loss(
    graph: &Graph,
    feeds: &HashMap<String, RtValue>,
    seeds: &HashMap<String, Tensor>,
) -> Result<f64, GradCheckError> {
    let outputs = Interpreter::new().run(graph, feeds)?;
    let mut loss = 0.0;
    for (name, value) in &outputs {
        let y = expect_tensor(name, Some(value))?;
        let seed = seeds
            .get(name)
            .ok_or_else(|| GradCheckError::MissingSeed(name.clone()))?;
        if y.shape() != seed.shape() {
            return Err(RuntimeError::ShapeMismatch {
                expected: y.shape().to_vec(),
                actual: seed.shape().to_vec(),
                operation: "weighted_loss (grad_check)".to_string(),
            }
            .into());
        }
        loss += y.data().iter().zip(seed.data()).map(|(a, b)| a * b).sum::<f64>();
    }
    Ok(loss)
}

/// Checks the gradient graph built for `graph` against central finite
/// differences of its forward outputs.
///
/// Every float input that receives a gradient is perturbed element by
/// element by `±epsilon`. Analytical and numerical gradients must agree
/// within `tolerance`, absolute or relative.
pub fn check_backward(
    graph: &Graph,
    feeds: &HashMap<String, RtValue>,
    seeds: &HashMap<String, Tensor>,
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError> {
    let analytical = compute_gradients(graph, feeds, seeds)?;

    for (input, grad) in &analytical {
        let feed = feeds
            .get(input)
            .ok_or_else(|| GradCheckError::MissingFeed(input.clone()))?;
        let original = expect_tensor(input, Some(feed))?;
        if grad.shape() != original.shape() {
            return Err(RuntimeError::ShapeMismatch {
                expected: original.shape().to_vec(),
                actual: grad.shape().to_vec(),
                operation: format!("gradient of '{}'", input),
            }
            .into());
        }
        debug!(
            "Checking gradient of '{}' ({} elements)",
            input,
            original.numel()
        );
        let perturbed_loss = |delta: f64, element_index: usize| -> Result<f64, GradCheckError> {
            let mut data = original.to_vec();
            data[element_index] += delta;
            let tensor = Tensor::new(original.dtype(), original.shape().to_vec(), data)?;
            let mut perturbed = feeds.clone();
            perturbed.insert(input.clone(), tensor.into());
            weighted_loss(graph, &perturbed, seeds)
        };

        for element_index in 0..original.numel() {
            let loss_plus = perturbed_loss(epsilon, element_index)?;
            let loss_minus = perturbed_loss(-epsilon, element_index)?;
            let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
            let analytical_grad = grad.data()[element_index];

            if !numerical_grad.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input: input.clone(),
                    element_index,
                    loss_plus,
                    loss_minus,
                });
            }
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    input: input.clone(),
                    element_index,
                    value: analytical_grad,
                });
            }
            if !relative_eq!(
                analytical_grad,
                numerical_grad,
                epsilon = tolerance,
                max_relative = tolerance
            ) {
                return Err(GradCheckError::GradientMismatch {
                    input: input.clone(),
                    element_index,
                    analytical_grad,
                    numerical_grad,
                    difference: (analytical_grad - numerical_grad).abs(),
                });
            }
        }
    }
    Ok(())
}
