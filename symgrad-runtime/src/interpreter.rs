use crate::error::RuntimeError;
use crate::ops::{activation, elementwise, indexing, linalg, reduction, sequence, shape};
use crate::tensor::Tensor;
use log::{debug, trace};
use std::collections::HashMap;
use symgrad_core::ir::{Graph, Node, ValueId};
use symgrad_core::{DType, OpKind};

/// A runtime value bound to a graph edge.
#[derive(Debug, Clone, PartialEq)]
pub enum RtValue {
    Tensor(Tensor),
    Sequence(Vec<Tensor>),
    Null,
}

impl RtValue {
    fn kind_name(&self) -> &'static str {
        match self {
            RtValue::Tensor(_) => "tensor",
            RtValue::Sequence(_) => "sequence",
            RtValue::Null => "null",
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            RtValue::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Tensor]> {
        match self {
            RtValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RtValue::Null)
    }
}

impl From<Tensor> for RtValue {
    fn from(t: Tensor) -> Self {
        RtValue::Tensor(t)
    }
}

fn tensor_arg(op: OpKind, v: &RtValue) -> Result<&Tensor, RuntimeError> {
    v.as_tensor().ok_or(RuntimeError::TypeMismatch {
        op,
        expected: "tensor",
        actual: v.kind_name(),
    })
}

fn sequence_arg(op: OpKind, v: &RtValue) -> Result<&[Tensor], RuntimeError> {
    v.as_sequence().ok_or(RuntimeError::TypeMismatch {
        op,
        expected: "sequence",
        actual: v.kind_name(),
    })
}

fn optional_tensor(v: Option<&RtValue>) -> Option<&Tensor> {
    v.and_then(RtValue::as_tensor)
}

type Env = HashMap<ValueId, RtValue>;

/// Signature of one loop execution: which body values carry the iteration
/// number, the condition and the states, on the way in and on the way out.
struct LoopPorts {
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
    run_pushes: bool,
}

/// Reference evaluator for [`Graph`]s.
///
/// Evaluation is demand-driven: only the nodes the requested outputs depend
/// on are run. The interpreter owns the retention stacks, one LIFO stack per
/// stack id, which persist across calls to [`Interpreter::run`].
#[derive(Debug, Default)]
pub struct Interpreter {
    stacks: HashMap<i64, Vec<RtValue>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values currently retained under `stack_id`.
    pub fn stack_depth(&self, stack_id: i64) -> usize {
        self.stacks.get(&stack_id).map_or(0, Vec::len)
    }

    /// Drops every retained value.
    ///
    /// Values pushed for gradients that were never requested stay on their
    /// stacks after a run. Call this between independent runs that reuse the
    /// interpreter.
    pub fn clear_stacks(&mut self) {
        let dropped: usize = self.stacks.values().map(Vec::len).sum();
        if dropped > 0 {
            debug!("Dropping {} retained values", dropped);
        }
        self.stacks.clear();
    }

    /// Runs `graph` and returns every graph output by name.
    pub fn run(
        &mut self,
        graph: &Graph,
        feeds: &HashMap<String, RtValue>,
    ) -> Result<HashMap<String, RtValue>, RuntimeError> {
        let names: Vec<&str> = graph
            .output_values()
            .iter()
            .map(|&v| graph.value(v).name())
            .collect();
        self.run_outputs(graph, feeds, &names)
    }

    /// Runs only what the named values need.
    pub fn run_outputs(
        &mut self,
        graph: &Graph,
        feeds: &HashMap<String, RtValue>,
        outputs: &[&str],
    ) -> Result<HashMap<String, RtValue>, RuntimeError> {
        let mut env = Env::new();
        for (name, value) in feeds {
            let id = graph
                .find_value(name)
                .ok_or_else(|| RuntimeError::UnknownValue(name.clone()))?;
            env.insert(id, value.clone());
        }
        let roots = outputs
            .iter()
            .map(|name| {
                graph
                    .find_value(name)
                    .ok_or_else(|| RuntimeError::UnknownValue(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.evaluate(graph, &mut env, &roots)?;
        roots
            .iter()
            .zip(outputs)
            .map(|(&id, name)| Ok((name.to_string(), lookup(graph, &env, id)?)))
            .collect()
    }

    fn evaluate(&mut self, graph: &Graph, env: &mut Env, roots: &[ValueId]) -> Result<(), RuntimeError> {
        for node_id in graph.topological_order(roots) {
            let node = graph.node(node_id);
            if !node.outputs().is_empty() && node.outputs().iter().all(|v| env.contains_key(v)) {
                continue;
            }
            let inputs = node
                .inputs()
                .iter()
                .map(|&v| lookup(graph, env, v))
                .collect::<Result<Vec<_>, _>>()?;
            trace!("Running {} node '{}'", node.kind(), node.name());
            let outputs = self.execute(graph, node, &inputs)?;
            for (&id, value) in node.outputs().iter().zip(outputs) {
                env.insert(id, value);
            }
        }
        Ok(())
    }

    fn execute(&mut self, graph: &Graph, node: &Node, inputs: &[RtValue]) -> Result<Vec<RtValue>, RuntimeError> {
        let op = node.kind();
        let attrs = node.attrs();
        let input = |i: usize| -> Result<&RtValue, RuntimeError> {
            inputs.get(i).ok_or_else(|| RuntimeError::InvalidArgument {
                op,
                message: format!("missing input {}", i),
            })
        };
        let t = |i: usize| -> Result<&Tensor, RuntimeError> { tensor_arg(op, input(i)?) };
        let single = |out: Tensor| -> Result<Vec<RtValue>, RuntimeError> { Ok(vec![RtValue::Tensor(out)]) };

        match op {
            OpKind::Constant => {
                let literal = attrs.value.as_ref().ok_or(RuntimeError::MissingAttribute {
                    op,
                    name: "value",
                })?;
                single(Tensor::from_literal(literal)?)
            }
            OpKind::Add => match (inputs.first(), inputs.get(1)) {
                (Some(RtValue::Sequence(a)), Some(RtValue::Sequence(b))) => {
                    Ok(vec![RtValue::Sequence(add_sequences(a, b)?)])
                }
                _ => single(elementwise::add(t(0)?, t(1)?)?),
            },
            OpKind::Sub => single(elementwise::sub(t(0)?, t(1)?)?),
            OpKind::Mul => single(elementwise::mul(t(0)?, t(1)?)?),
            OpKind::Div => single(elementwise::div(t(0)?, t(1)?)?),
            OpKind::Greater => single(elementwise::greater(t(0)?, t(1)?)?),
            OpKind::Neg => single(elementwise::neg(t(0)?)),
            OpKind::Exp => single(elementwise::exp(t(0)?)),
            OpKind::Sqrt => single(elementwise::sqrt(t(0)?)),
            OpKind::Tanh => single(elementwise::tanh(t(0)?)),
            OpKind::Sigmoid => single(elementwise::sigmoid(t(0)?)),
            OpKind::Relu => single(elementwise::relu(t(0)?)),
            OpKind::ReluGrad => single(elementwise::relu_grad(t(0)?, t(1)?)?),
            // Dropout runs in inference mode.
            OpKind::Identity | OpKind::Dropout => Ok(vec![input(0)?.clone()]),
            OpKind::Shape => single(shape::shape_of(t(0)?)),
            OpKind::Reshape => single(shape::reshape(t(0)?, t(1)?)?),
            OpKind::Expand => {
                let dims: Vec<usize> = t(1)?.to_i64_vec().iter().map(|&d| d as usize).collect();
                single(reduction::expand(t(0)?, &dims)?)
            }
            OpKind::Gather => single(indexing::gather(t(0)?, t(1)?, attrs.axis)?),
            OpKind::Cast => {
                let to = attrs.to.ok_or(RuntimeError::MissingAttribute { op, name: "to" })?;
                single(t(0)?.cast(to))
            }
            OpKind::ReduceSum => single(reduction::reduce_sum(t(0)?, &attrs.axes, attrs.keepdims)?),
            OpKind::ReduceMean => single(reduction::reduce_mean(t(0)?, &attrs.axes, attrs.keepdims)?),
            OpKind::Gemm => single(linalg::gemm(
                t(0)?,
                t(1)?,
                optional_tensor(inputs.get(2)),
                attrs.alpha as f64,
                attrs.beta as f64,
                attrs.trans_a,
                attrs.trans_b,
            )?),
            OpKind::Softmax => single(activation::softmax(t(0)?, attrs.axis)?),
            OpKind::LogSoftmax => single(activation::log_softmax(t(0)?, attrs.axis)?),
            OpKind::SelectItem => single(indexing::select_item(t(0)?, t(1)?)?),
            OpKind::SelectItemGrad => single(indexing::select_item_grad(t(0)?, t(1)?, t(2)?)?),
            OpKind::SequenceStack => {
                let items = sequence_arg(op, input(0)?)?;
                single(sequence::stack(items, attrs.axis)?)
            }
            OpKind::SequenceSplit => Ok(vec![RtValue::Sequence(sequence::split(t(0)?, attrs.axis)?)]),
            OpKind::SequenceAppend => {
                let items = sequence_arg(op, input(0)?)?;
                Ok(vec![RtValue::Sequence(sequence::append(items, t(1)?))])
            }
            OpKind::SequencePop => {
                let (rest, last) = sequence::pop(sequence_arg(op, input(0)?)?)?;
                Ok(vec![RtValue::Sequence(rest), RtValue::Tensor(last)])
            }
            OpKind::BackpropStackPush => {
                let value = input(0)?.clone();
                self.stacks.entry(attrs.stack_id).or_default().push(value);
                Ok(vec![])
            }
            OpKind::BackpropStackPop => {
                let value = self
                    .stacks
                    .get_mut(&attrs.stack_id)
                    .and_then(Vec::pop)
                    .ok_or(RuntimeError::StackUnderflow(attrs.stack_id))?;
                Ok(vec![value])
            }
            OpKind::Loop => {
                let body = node
                    .body()
                    .ok_or_else(|| RuntimeError::BodyNotFound(node.name().to_string()))?;
                let ports = LoopPorts {
                    inputs: body.input_values().to_vec(),
                    outputs: body.output_values().to_vec(),
                    run_pushes: true,
                };
                self.run_loop(node, body, &ports, inputs)
            }
            OpKind::LoopRef => {
                let body = find_body(graph, &attrs.body_ref)?;
                let resolve = |names: &[String]| {
                    names
                        .iter()
                        .map(|n| body.find_value(n).ok_or_else(|| RuntimeError::UnknownValue(n.clone())))
                        .collect::<Result<Vec<_>, _>>()
                };
                let ports = LoopPorts {
                    inputs: resolve(&attrs.input_value_names)?,
                    outputs: resolve(&attrs.output_value_names)?,
                    run_pushes: false,
                };
                self.run_loop(node, body, &ports, inputs)
            }
            OpKind::Conv
            | OpKind::MaxPool
            | OpKind::AveragePool
            | OpKind::Lrn
            | OpKind::BatchNormalization
            | OpKind::ConvTransposeWithDynamicOutputShape
            | OpKind::ConvGradWeight
            | OpKind::MaxPoolGrad
            | OpKind::AveragePoolGrad
            | OpKind::LrnGrad
            | OpKind::BatchNormalizationGrad => Err(RuntimeError::UnsupportedKernel(op)),
        }
    }

    /// Runs `body` until the trip count is reached or the condition turns
    /// false, and returns the final states.
    fn run_loop(
        &mut self,
        node: &Node,
        body: &Graph,
        ports: &LoopPorts,
        inputs: &[RtValue],
    ) -> Result<Vec<RtValue>, RuntimeError> {
        let op = node.kind();
        let invalid = |message: String| RuntimeError::InvalidArgument { op, message };
        if inputs.len() < 2 || ports.inputs.len() != inputs.len() {
            return Err(invalid(format!(
                "{} inputs for a body taking {}",
                inputs.len(),
                ports.inputs.len()
            )));
        }
        let num_states = inputs.len() - 2;
        if ports.outputs.len() != num_states + 1 {
            return Err(invalid(format!(
                "body has {} outputs for {} states; scan outputs are not supported",
                ports.outputs.len(),
                num_states
            )));
        }
        let trip_count = match &inputs[0] {
            RtValue::Null => None,
            v => Some(tensor_arg(op, v)?.item()? as i64),
        };
        let mut cond = match &inputs[1] {
            RtValue::Null => None,
            v => Some(tensor_arg(op, v)?.item()? != 0.0),
        };
        if trip_count.is_none() && cond.is_none() {
            return Err(invalid("neither trip count nor condition given".to_string()));
        }

        let pushes: Vec<&Node> = if ports.run_pushes {
            body.nodes()
                .filter(|(_, n)| n.kind() == OpKind::BackpropStackPush)
                .map(|(_, n)| n)
                .collect()
        } else {
            Vec::new()
        };
        let mut roots = ports.outputs.clone();
        roots.extend(pushes.iter().flat_map(|n| n.inputs().iter().copied()));

        let mut states: Vec<RtValue> = inputs[2..].to_vec();
        let mut iteration: i64 = 0;
        while trip_count.map_or(true, |n| iteration < n) && cond.unwrap_or(true) {
            let mut env = Env::new();
            env.insert(ports.inputs[0], Tensor::scalar(DType::I64, iteration as f64).into());
            env.insert(
                ports.inputs[1],
                Tensor::scalar(DType::Bool, if cond.unwrap_or(true) { 1.0 } else { 0.0 }).into(),
            );
            for (&id, state) in ports.inputs[2..].iter().zip(&states) {
                env.insert(id, state.clone());
            }

            self.evaluate(body, &mut env, &roots)?;
            for push in &pushes {
                for &v in push.inputs() {
                    let value = lookup(body, &env, v)?;
                    self.stacks.entry(push.attrs().stack_id).or_default().push(value);
                }
            }

            let next_cond = tensor_arg(op, &lookup(body, &env, ports.outputs[0])?)?.item()?;
            if cond.is_some() {
                cond = Some(next_cond != 0.0);
            }
            states = ports.outputs[1..]
                .iter()
                .map(|&id| lookup(body, &env, id))
                .collect::<Result<_, _>>()?;
            iteration += 1;
        }
        debug!(
            "{} '{}' over body '{}' ran {} iterations",
            op,
            node.name(),
            body.name(),
            iteration
        );
        Ok(states)
    }
}

fn lookup(graph: &Graph, env: &Env, id: ValueId) -> Result<RtValue, RuntimeError> {
    if let Some(value) = env.get(&id) {
        return Ok(value.clone());
    }
    let value = graph.value(id);
    if value.is_null() {
        Ok(RtValue::Null)
    } else {
        Err(RuntimeError::UnboundValue(value.name().to_string()))
    }
}

/// The body of the `Loop` node of `graph` whose body is named `name`.
fn find_body<'g>(graph: &'g Graph, name: &str) -> Result<&'g Graph, RuntimeError> {
    graph
        .nodes()
        .filter_map(|(_, n)| n.body())
        .find(|body| body.name() == name)
        .ok_or_else(|| RuntimeError::BodyNotFound(name.to_string()))
}

fn add_sequences(a: &[Tensor], b: &[Tensor]) -> Result<Vec<Tensor>, RuntimeError> {
    if a.len() != b.len() {
        return Err(RuntimeError::ShapeMismatch {
            expected: vec![a.len()],
            actual: vec![b.len()],
            operation: "add(sequence)".to_string(),
        });
    }
    a.iter().zip(b).map(|(x, y)| elementwise::add(x, y)).collect()
}

#[cfg(test)]
#[path = "interpreter_test.rs"]
mod tests;
