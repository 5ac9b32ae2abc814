use crate::error::RuntimeError;
use crate::tensor::{broadcast_offset, broadcast_shapes, next_index, strides, Tensor};

/// Resolves a possibly negative axis against `rank`.
pub fn normalize_axis(axis: i64, rank: usize) -> Result<usize, RuntimeError> {
    let resolved = if axis < 0 { axis + rank as i64 } else { axis };
    if resolved < 0 || resolved >= rank as i64 {
        return Err(RuntimeError::InvalidAxis { axis, rank });
    }
    Ok(resolved as usize)
}

fn reduced_axes(axes: &[i64], rank: usize) -> Result<Vec<bool>, RuntimeError> {
    let mut reduced = vec![axes.is_empty(); rank];
    for &axis in axes {
        reduced[normalize_axis(axis, rank)?] = true;
    }
    Ok(reduced)
}

/// Sums over `axes` (all axes when empty).
pub fn reduce_sum(t: &Tensor, axes: &[i64], keepdims: bool) -> Result<Tensor, RuntimeError> {
    let shape = t.shape();
    let reduced = reduced_axes(axes, shape.len())?;
    let kept_shape: Vec<usize> = shape
        .iter()
        .zip(&reduced)
        .map(|(&d, &r)| if r { 1 } else { d })
        .collect();
    let kept_strides = strides(&kept_shape);
    let mut data = vec![0.0; kept_shape.iter().product()];
    if t.numel() > 0 {
        let mut index = vec![0; shape.len()];
        for &v in t.data() {
            data[broadcast_offset(&index, &kept_shape, &kept_strides)] += v;
            next_index(&mut index, shape);
        }
    }
    let out_shape = if keepdims {
        kept_shape
    } else {
        shape
            .iter()
            .zip(&reduced)
            .filter(|(_, &r)| !r)
            .map(|(&d, _)| d)
            .collect()
    };
    Tensor::new(t.dtype(), out_shape, data)
}

pub fn reduce_mean(t: &Tensor, axes: &[i64], keepdims: bool) -> Result<Tensor, RuntimeError> {
    let reduced = reduced_axes(axes, t.rank())?;
    let count: usize = t
        .shape()
        .iter()
        .zip(&reduced)
        .filter(|(_, &r)| r)
        .map(|(&d, _)| d)
        .product();
    let sum = reduce_sum(t, axes, keepdims)?;
    let data = sum.data().iter().map(|&v| v / count as f64).collect();
    Tensor::new(t.dtype(), sum.shape().to_vec(), data)
}

/// Broadcasts `t` against `shape`, numpy style in both directions.
pub fn expand(t: &Tensor, shape: &[usize]) -> Result<Tensor, RuntimeError> {
    let out_shape = broadcast_shapes(t.shape(), shape)?;
    let src_strides = strides(t.shape());
    let numel: usize = out_shape.iter().product();
    let mut data = Vec::with_capacity(numel);
    if numel > 0 {
        let mut index = vec![0; out_shape.len()];
        loop {
            data.push(t.data()[broadcast_offset(&index, t.shape(), &src_strides)]);
            if !next_index(&mut index, &out_shape) {
                break;
            }
        }
    }
    Tensor::new(t.dtype(), out_shape, data)
}

#[cfg(test)]
#[path = "reduction_test.rs"]
mod tests;
