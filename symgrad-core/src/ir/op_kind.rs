use std::fmt;

/// Closed set of operator kinds known to the IR.
///
/// Forward operators come first, followed by the operators that only appear in
/// emitted gradient code (fused backward kernels, shape helpers, sequence
/// decomposition, retention stack and the reverse loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    // Elementwise arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    // Activations and elementwise math
    Exp,
    Sigmoid,
    Relu,
    Sqrt,
    Tanh,
    Identity,
    Dropout,
    // Shape
    Reshape,
    Shape,
    Expand,
    Gather,
    Cast,
    SelectItem,
    // Reductions and linear algebra
    ReduceSum,
    ReduceMean,
    Gemm,
    Conv,
    // Normalization and pooling
    MaxPool,
    AveragePool,
    Lrn,
    BatchNormalization,
    LogSoftmax,
    Softmax,
    // Non-differentiable
    Greater,
    Constant,
    // Control flow
    Loop,
    LoopRef,
    // Sequences
    SequenceStack,
    SequenceAppend,
    SequenceSplit,
    SequencePop,
    // Fused backward operators
    ReluGrad,
    SelectItemGrad,
    ConvTransposeWithDynamicOutputShape,
    ConvGradWeight,
    MaxPoolGrad,
    AveragePoolGrad,
    LrnGrad,
    BatchNormalizationGrad,
    // Retention stack
    BackpropStackPush,
    BackpropStackPop,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Add => "Add",
            OpKind::Sub => "Sub",
            OpKind::Mul => "Mul",
            OpKind::Div => "Div",
            OpKind::Neg => "Neg",
            OpKind::Exp => "Exp",
            OpKind::Sigmoid => "Sigmoid",
            OpKind::Relu => "Relu",
            OpKind::Sqrt => "Sqrt",
            OpKind::Tanh => "Tanh",
            OpKind::Identity => "Identity",
            OpKind::Dropout => "Dropout",
            OpKind::Reshape => "Reshape",
            OpKind::Shape => "Shape",
            OpKind::Expand => "Expand",
            OpKind::Gather => "Gather",
            OpKind::Cast => "Cast",
            OpKind::SelectItem => "SelectItem",
            OpKind::ReduceSum => "ReduceSum",
            OpKind::ReduceMean => "ReduceMean",
            OpKind::Gemm => "Gemm",
            OpKind::Conv => "Conv",
            OpKind::MaxPool => "MaxPool",
            OpKind::AveragePool => "AveragePool",
            OpKind::Lrn => "LRN",
            OpKind::BatchNormalization => "BatchNormalization",
            OpKind::LogSoftmax => "LogSoftmax",
            OpKind::Softmax => "Softmax",
            OpKind::Greater => "Greater",
            OpKind::Constant => "Constant",
            OpKind::Loop => "Loop",
            OpKind::LoopRef => "LoopRef",
            OpKind::SequenceStack => "SequenceStack",
            OpKind::SequenceAppend => "SequenceAppend",
            OpKind::SequenceSplit => "SequenceSplit",
            OpKind::SequencePop => "SequencePop",
            OpKind::ReluGrad => "ReluGrad",
            OpKind::SelectItemGrad => "SelectItemGrad",
            OpKind::ConvTransposeWithDynamicOutputShape => "ConvTransposeWithDynamicOutputShape",
            OpKind::ConvGradWeight => "ConvGradWeight",
            OpKind::MaxPoolGrad => "MaxPoolGrad",
            OpKind::AveragePoolGrad => "AveragePoolGrad",
            OpKind::LrnGrad => "LRNGrad",
            OpKind::BatchNormalizationGrad => "BatchNormalizationGrad",
            OpKind::BackpropStackPush => "BackpropStackPush",
            OpKind::BackpropStackPop => "BackpropStackPop",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
