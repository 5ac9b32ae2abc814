use crate::error::RuntimeError;
use crate::ops::reduction::normalize_axis;
use crate::tensor::Tensor;

fn resolve_index(index: f64, axis: usize, size: usize) -> Result<usize, RuntimeError> {
    let index = index as i64;
    let resolved = if index < 0 { index + size as i64 } else { index };
    if resolved < 0 || resolved >= size as i64 {
        return Err(RuntimeError::IndexOutOfBounds { index, axis, size });
    }
    Ok(resolved as usize)
}

/// ONNX `Gather`: picks entries of `data` along `axis` at `indices`.
///
/// The output shape is `data.shape[..axis] ++ indices.shape ++
/// data.shape[axis + 1..]`.
pub fn gather(data: &Tensor, indices: &Tensor, axis: i64) -> Result<Tensor, RuntimeError> {
    let axis = normalize_axis(axis, data.rank())?;
    let shape = data.shape();
    let size = shape[axis];
    let outer: usize = shape[..axis].iter().product();
    let inner: usize = shape[axis + 1..].iter().product();
    let positions = indices
        .data()
        .iter()
        .map(|&i| resolve_index(i, axis, size))
        .collect::<Result<Vec<_>, _>>()?;

    let src = data.data();
    let mut out = Vec::with_capacity(outer * positions.len() * inner);
    for o in 0..outer {
        for &p in &positions {
            let base = (o * size + p) * inner;
            out.extend_from_slice(&src[base..base + inner]);
        }
    }
    let mut out_shape = shape[..axis].to_vec();
    out_shape.extend_from_slice(indices.shape());
    out_shape.extend_from_slice(&shape[axis + 1..]);
    Tensor::new(data.dtype(), out_shape, out)
}

fn check_select_args(rows: usize, indices: &Tensor) -> Result<(), RuntimeError> {
    if indices.shape() != [rows] {
        return Err(RuntimeError::ShapeMismatch {
            expected: vec![rows],
            actual: indices.shape().to_vec(),
            operation: "select_item".to_string(),
        });
    }
    Ok(())
}

/// `y[i] = x[i, indices[i]]` for a 2-D `x`.
pub fn select_item(x: &Tensor, indices: &Tensor) -> Result<Tensor, RuntimeError> {
    let (rows, cols) = match x.shape() {
        &[rows, cols] => (rows, cols),
        other => {
            return Err(RuntimeError::ShapeMismatch {
                expected: vec![0, 0],
                actual: other.to_vec(),
                operation: "select_item".to_string(),
            })
        }
    };
    check_select_args(rows, indices)?;
    let mut out = Vec::with_capacity(rows);
    for (i, &index) in indices.data().iter().enumerate() {
        out.push(x.data()[i * cols + resolve_index(index, 1, cols)?]);
    }
    Tensor::new(x.dtype(), vec![rows], out)
}

/// Scatters `gy[i]` to position `(i, indices[i])` of a zero tensor of
/// shape `x_shape`.
pub fn select_item_grad(gy: &Tensor, indices: &Tensor, x_shape: &Tensor) -> Result<Tensor, RuntimeError> {
    let dims: Vec<usize> = x_shape.to_i64_vec().iter().map(|&d| d as usize).collect();
    let (rows, cols) = match dims.as_slice() {
        &[rows, cols] => (rows, cols),
        other => {
            return Err(RuntimeError::ShapeMismatch {
                expected: vec![0, 0],
                actual: other.to_vec(),
                operation: "select_item_grad".to_string(),
            })
        }
    };
    check_select_args(rows, indices)?;
    let mut out = vec![0.0; rows * cols];
    for (i, (&index, &g)) in indices.data().iter().zip(gy.data()).enumerate() {
        out[i * cols + resolve_index(index, 1, cols)?] += g;
    }
    Tensor::new(gy.dtype(), dims, out)
}
