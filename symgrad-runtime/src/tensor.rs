use crate::error::RuntimeError;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::fmt;
use std::sync::Arc;
use symgrad_core::{DType, Literal};

/// Dense row-major tensor.
///
/// Elements are held as `f64` whatever the `dtype`; integer and boolean
/// tensors hold integral values (booleans as 0/1). Cloning is cheap, the data
/// buffer is shared.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    dtype: DType,
    shape: Vec<usize>,
    data: Arc<Vec<f64>>,
}

impl Tensor {
    pub fn new(dtype: DType, shape: Vec<usize>, data: Vec<f64>) -> Result<Self, RuntimeError> {
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(RuntimeError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Tensor {
            dtype,
            shape,
            data: Arc::new(data),
        })
    }

    /// Builds a tensor whose element count is known to match `shape`.
    pub(crate) fn from_parts(dtype: DType, shape: Vec<usize>, data: Vec<f64>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Tensor {
            dtype,
            shape,
            data: Arc::new(data),
        }
    }

    pub fn scalar(dtype: DType, value: f64) -> Self {
        Tensor {
            dtype,
            shape: Vec::new(),
            data: Arc::new(vec![value]),
        }
    }

    pub fn from_literal(literal: &Literal) -> Result<Self, RuntimeError> {
        Tensor::new(literal.dtype, literal.dims.clone(), literal.data.clone())
    }

    pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
        Tensor::full(dtype, shape, 0.0)
    }

    pub fn full(dtype: DType, shape: &[usize], value: f64) -> Self {
        let numel = shape.iter().product();
        Tensor {
            dtype,
            shape: shape.to_vec(),
            data: Arc::new(vec![value; numel]),
        }
    }

    /// Float tensor with elements drawn uniformly from `[low, high)`.
    pub fn rand_uniform<R: Rng + ?Sized>(
        dtype: DType,
        shape: &[usize],
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Self {
        let dist = Uniform::new(low, high);
        let numel = shape.iter().product();
        let data = (0..numel).map(|_| dist.sample(rng)).collect();
        Tensor {
            dtype,
            shape: shape.to_vec(),
            data: Arc::new(data),
        }
    }

    /// 1-D `I64` tensor, as produced by `Shape`.
    pub fn from_dims(dims: &[usize]) -> Self {
        Tensor {
            dtype: DType::I64,
            shape: vec![dims.len()],
            data: Arc::new(dims.iter().map(|&d| d as f64).collect()),
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    /// The only element of a one-element tensor.
    pub fn item(&self) -> Result<f64, RuntimeError> {
        match self.data.as_slice() {
            [v] => Ok(*v),
            _ => Err(RuntimeError::ShapeMismatch {
                expected: vec![],
                actual: self.shape.clone(),
                operation: "item".to_string(),
            }),
        }
    }

    /// Reads the elements of a 1-D integer tensor (a shape or index list).
    pub fn to_i64_vec(&self) -> Vec<i64> {
        self.data.iter().map(|&v| v as i64).collect()
    }

    /// Same data under a new shape with the same number of elements.
    pub fn reshaped(&self, shape: Vec<usize>) -> Result<Self, RuntimeError> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(RuntimeError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: shape,
                operation: "reshape".to_string(),
            });
        }
        Ok(Tensor {
            dtype: self.dtype,
            shape,
            data: Arc::clone(&self.data),
        })
    }

    /// Converts to `dtype`. Integers truncate toward zero, booleans keep
    /// non-zero as 1.
    pub fn cast(&self, dtype: DType) -> Self {
        let data = match dtype {
            DType::F32 | DType::F64 => self.data.to_vec(),
            DType::I64 => self.data.iter().map(|v| v.trunc()).collect(),
            DType::Bool => self
                .data
                .iter()
                .map(|&v| if v != 0.0 { 1.0 } else { 0.0 })
                .collect(),
        };
        Tensor {
            dtype,
            shape: self.shape.clone(),
            data: Arc::new(data),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("data", &self.data.as_slice())
            .finish()
    }
}

/// Row-major strides of a contiguous tensor.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Numpy-style broadcast of two shapes.
pub fn broadcast_shapes(shape1: &[usize], shape2: &[usize]) -> Result<Vec<usize>, RuntimeError> {
    let rank = shape1.len().max(shape2.len());
    let mut out = vec![0; rank];
    for i in 0..rank {
        let d1 = dim_from_right(shape1, rank - 1 - i);
        let d2 = dim_from_right(shape2, rank - 1 - i);
        out[i] = match (d1, d2) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(RuntimeError::BroadcastError {
                    shape1: shape1.to_vec(),
                    shape2: shape2.to_vec(),
                })
            }
        };
    }
    Ok(out)
}

fn dim_from_right(shape: &[usize], offset: usize) -> usize {
    if offset < shape.len() {
        shape[shape.len() - 1 - offset]
    } else {
        1
    }
}

/// Offset into a tensor of shape `src_shape` for the multi-index `index` of a
/// broadcast result of rank `index.len()`.
pub(crate) fn broadcast_offset(index: &[usize], src_shape: &[usize], src_strides: &[usize]) -> usize {
    let skip = index.len() - src_shape.len();
    src_shape
        .iter()
        .zip(src_strides)
        .zip(&index[skip..])
        .map(|((&dim, &stride), &i)| if dim == 1 { 0 } else { i * stride })
        .sum()
}

/// Advances a row-major multi-index. Returns `false` after the last index.
pub(crate) fn next_index(index: &mut [usize], shape: &[usize]) -> bool {
    for axis in (0..shape.len()).rev() {
        index[axis] += 1;
        if index[axis] < shape[axis] {
            return true;
        }
        index[axis] = 0;
    }
    false
}

#[cfg(test)]
#[path = "tensor_test.rs"]
mod tests;
