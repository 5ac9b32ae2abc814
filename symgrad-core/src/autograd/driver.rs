use crate::autograd::context::{GradientMap, GradientPass};
use crate::autograd::registry::add_gradient_for_node;
use crate::error::GradientError;
use crate::ir::{Graph, OpKind, ValueId};
use log::{debug, trace};

/// Configuration of [`add_gradient_nodes`].
#[derive(Debug, Clone)]
pub struct GradientOptions {
    /// Prefix of the graph input created for each output gradient.
    pub seed_prefix: String,
    /// Prefix of the graph output created for each input gradient.
    pub grad_prefix: String,
    /// Do not expose gradients of integer or boolean inputs.
    pub skip_non_float_inputs: bool,
}

impl Default for GradientOptions {
    fn default() -> Self {
        GradientOptions {
            seed_prefix: "grad_in@".to_string(),
            grad_prefix: "grad_out@".to_string(),
            skip_non_float_inputs: true,
        }
    }
}

impl GradientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.seed_prefix = prefix.into();
        self
    }

    pub fn with_grad_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.grad_prefix = prefix.into();
        self
    }

    pub fn with_skip_non_float_inputs(mut self, skip: bool) -> Self {
        self.skip_non_float_inputs = skip;
        self
    }
}

/// What [`add_gradient_nodes`] added to the graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackpropResult {
    /// `(forward output, seed input)` pairs, in output order.
    pub seeds: Vec<(ValueId, ValueId)>,
    /// `(forward input, gradient output)` pairs, in input order.
    pub grads: Vec<(ValueId, ValueId)>,
    /// Number of push/pop pairs emitted by loop transforms.
    pub num_retained: usize,
}

/// Emits gradient nodes for every forward node `roots` depend on.
///
/// The gradients of `roots` must already be bound in `grads`. Nodes are
/// visited in reverse topological order so that all consumers of a value have
/// contributed to its gradient before its producer is differentiated. A node
/// none of whose outputs carries a gradient is skipped.
///
/// The set of nodes is fixed before any gradient node is emitted.
pub fn add_gradient_nodes_for(
    graph: &mut Graph,
    grads: &mut GradientMap,
    pass: &mut GradientPass,
    roots: &[ValueId],
    retain_in_stack: bool,
) -> Result<(), GradientError> {
    let order = graph.topological_order(roots);
    debug!(
        "Differentiating graph '{}': {} forward nodes, retain_in_stack={}",
        graph.name(),
        order.len(),
        retain_in_stack
    );
    for &node in order.iter().rev() {
        let has_grad = graph
            .node(node)
            .outputs()
            .iter()
            .any(|&y| grads.contains(y));
        if !has_grad {
            trace!("Skipping node '{}': no output gradient", graph.node(node).name());
            continue;
        }
        add_gradient_for_node(graph, grads, pass, node, retain_in_stack)?;
    }
    Ok(())
}

/// Turns `graph` into a graph computing both its outputs and the gradients of
/// its inputs.
///
/// Each output `y` gets a seed input named `<seed_prefix><y>` holding
/// `dL/dy`. Each input `x` that receives a gradient gets an output named
/// `<grad_prefix><x>` holding `dL/dx`.
pub fn add_gradient_nodes(
    graph: &mut Graph,
    options: &GradientOptions,
) -> Result<BackpropResult, GradientError> {
    let ys = graph.output_values().to_vec();
    let xs = graph.input_values().to_vec();
    let mut grads = GradientMap::new();
    let mut pass = GradientPass::new();
    let mut result = BackpropResult::default();

    for &y in &ys {
        let value = graph.value(y);
        let name = format!("{}{}", options.seed_prefix, value.name());
        let ty = value.ty().clone();
        let seed = graph.add_input_value(name, ty);
        grads.bind(y, seed);
        result.seeds.push((y, seed));
    }

    add_gradient_nodes_for(graph, &mut grads, &mut pass, &ys, false)?;

    for &x in &xs {
        let Some(gx) = grads.get(x) else {
            continue;
        };
        let value = graph.value(x);
        let is_float = value.ty().dtype().map_or(true, |dtype| dtype.is_float());
        if options.skip_non_float_inputs && !is_float {
            trace!("Not exposing gradient of non-float input '{}'", value.name());
            continue;
        }
        let name = format!("{}{}", options.grad_prefix, value.name());
        let ty = value.ty().clone();
        let out = graph.add_output_value(name.clone(), ty);
        graph.add_node(OpKind::Identity, &[gx], &[out], name);
        result.grads.push((x, out));
    }
    result.num_retained = pass.num_retained();
    debug!(
        "Graph '{}': {} seeds, {} input gradients, {} retentions",
        graph.name(),
        result.seeds.len(),
        result.grads.len(),
        result.num_retained
    );
    Ok(result)
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
