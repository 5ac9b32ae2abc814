use crate::error::RuntimeError;
use crate::ops::reduction::normalize_axis;
use crate::tensor::Tensor;
use symgrad_core::OpKind;

/// Stacks equally shaped tensors along a new `axis`.
pub fn stack(items: &[Tensor], axis: i64) -> Result<Tensor, RuntimeError> {
    let first = items.first().ok_or_else(|| RuntimeError::InvalidArgument {
        op: OpKind::SequenceStack,
        message: "cannot stack an empty sequence".to_string(),
    })?;
    let item_shape = first.shape();
    let axis = normalize_axis(axis, item_shape.len() + 1)?;
    for item in items {
        if item.shape() != item_shape {
            return Err(RuntimeError::ShapeMismatch {
                expected: item_shape.to_vec(),
                actual: item.shape().to_vec(),
                operation: "sequence_stack".to_string(),
            });
        }
    }
    let outer: usize = item_shape[..axis].iter().product();
    let inner: usize = item_shape[axis..].iter().product();
    let mut data = Vec::with_capacity(outer * items.len() * inner);
    for o in 0..outer {
        for item in items {
            data.extend_from_slice(&item.data()[o * inner..(o + 1) * inner]);
        }
    }
    let mut shape = item_shape.to_vec();
    shape.insert(axis, items.len());
    Tensor::new(first.dtype(), shape, data)
}

/// Inverse of [`stack`]: slices `t` along `axis` and drops that axis.
pub fn split(t: &Tensor, axis: i64) -> Result<Vec<Tensor>, RuntimeError> {
    let axis = normalize_axis(axis, t.rank())?;
    let shape = t.shape();
    let len = shape[axis];
    let outer: usize = shape[..axis].iter().product();
    let inner: usize = shape[axis + 1..].iter().product();
    let mut item_shape = shape.to_vec();
    item_shape.remove(axis);
    (0..len)
        .map(|k| {
            let mut data = Vec::with_capacity(outer * inner);
            for o in 0..outer {
                let base = (o * len + k) * inner;
                data.extend_from_slice(&t.data()[base..base + inner]);
            }
            Tensor::new(t.dtype(), item_shape.clone(), data)
        })
        .collect()
}

pub fn append(items: &[Tensor], item: &Tensor) -> Vec<Tensor> {
    let mut out = items.to_vec();
    out.push(item.clone());
    out
}

/// Splits off the last element: `(items[..n-1], items[n-1])`.
pub fn pop(items: &[Tensor]) -> Result<(Vec<Tensor>, Tensor), RuntimeError> {
    match items.split_last() {
        Some((last, rest)) => Ok((rest.to_vec(), last.clone())),
        None => Err(RuntimeError::InvalidArgument {
            op: OpKind::SequencePop,
            message: "cannot pop from an empty sequence".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "sequence_test.rs"]
mod tests;
