use crate::types::{DType, Literal};

/// Operator attributes.
///
/// A single struct covers every attribute the gradient rules read or write.
/// Defaults follow ONNX where an ONNX operator exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    /// Gemm scaling of `op(a) * op(b)`; LRN alpha.
    pub alpha: f32,
    /// Gemm scaling of `c`; LRN beta.
    pub beta: f32,
    /// LRN bias.
    pub bias: f32,
    /// LRN window size.
    pub size: i64,
    pub trans_a: bool,
    pub trans_b: bool,
    /// Reduction axes. Empty means all axes.
    pub axes: Vec<i64>,
    pub keepdims: bool,
    /// Softmax / LogSoftmax / Gather / sequence axis.
    pub axis: i64,
    pub strides: Vec<i64>,
    pub pads: Vec<i64>,
    /// Empty means the attribute is absent.
    pub kernel_shape: Vec<i64>,
    pub epsilon: f32,
    pub momentum: f32,
    /// Target dtype of `Cast`.
    pub to: Option<DType>,
    /// Loop scan-output stacking axis. Only 0 is supported.
    pub stack_axis: i64,
    /// Pairs a `BackpropStackPush` with its `BackpropStackPop`.
    pub stack_id: i64,
    /// Payload of `Constant`.
    pub value: Option<Literal>,
    /// Name of the body graph a `LoopRef` runs.
    pub body_ref: String,
    pub input_value_names: Vec<String>,
    pub output_value_names: Vec<String>,
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes {
            alpha: 1.0,
            beta: 1.0,
            bias: 1.0,
            size: 0,
            trans_a: false,
            trans_b: false,
            axes: Vec::new(),
            keepdims: true,
            axis: 1,
            strides: Vec::new(),
            pads: Vec::new(),
            kernel_shape: Vec::new(),
            epsilon: 1e-5,
            momentum: 0.9,
            to: None,
            stack_axis: 0,
            stack_id: 0,
            value: None,
            body_ref: String::new(),
            input_value_names: Vec::new(),
            output_value_names: Vec::new(),
        }
    }
}
