use num_traits::ToPrimitive;

/// Defines the possible element types of tensor-valued edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating-point type.
    F32,
    /// 64-bit floating-point type.
    F64,
    /// 64-bit integer type (shapes, indices, counters).
    I64,
    /// Boolean type (conditions, comparison results).
    Bool,
}

impl DType {
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

/// Static type of a value in the graph.
///
/// Gradient placeholders are created with `Type::Unknown`; the interpreter does
/// not need static types, only the rules that inspect dtypes do.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Type {
    #[default]
    Unknown,
    Tensor { dtype: DType, dims: Vec<usize> },
    Sequence(DType),
}

impl Type {
    pub fn tensor(dtype: DType, dims: &[usize]) -> Self {
        Type::Tensor {
            dtype,
            dims: dims.to_vec(),
        }
    }

    pub fn dtype(&self) -> Option<DType> {
        match self {
            Type::Unknown => None,
            Type::Tensor { dtype, .. } => Some(*dtype),
            Type::Sequence(dtype) => Some(*dtype),
        }
    }

    pub fn dims(&self) -> Option<&[usize]> {
        match self {
            Type::Tensor { dims, .. } => Some(dims),
            _ => None,
        }
    }
}

/// Payload of a `Constant` node: a small dense tensor stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub dtype: DType,
    pub dims: Vec<usize>,
    pub data: Vec<f64>,
}

impl Literal {
    pub fn new(dtype: DType, dims: Vec<usize>, data: Vec<f64>) -> Self {
        Literal { dtype, dims, data }
    }

    /// Rank-0 literal. Non-representable values become NaN.
    pub fn scalar<V: ToPrimitive>(dtype: DType, value: V) -> Self {
        Literal {
            dtype,
            dims: Vec::new(),
            data: vec![value.to_f64().unwrap_or(f64::NAN)],
        }
    }

    pub fn ty(&self) -> Type {
        Type::tensor(self.dtype, &self.dims)
    }
}
