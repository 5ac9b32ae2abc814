use crate::error::RuntimeError;
use crate::tensor::Tensor;
use symgrad_core::OpKind;

pub fn shape_of(t: &Tensor) -> Tensor {
    Tensor::from_dims(t.shape())
}

/// ONNX `Reshape`: `0` copies the input dimension, one `-1` is inferred.
pub fn reshape(t: &Tensor, target: &Tensor) -> Result<Tensor, RuntimeError> {
    let requested = target.to_i64_vec();
    let invalid = |message: String| RuntimeError::InvalidArgument {
        op: OpKind::Reshape,
        message,
    };
    let mut dims = Vec::with_capacity(requested.len());
    let mut inferred = None;
    for (i, &d) in requested.iter().enumerate() {
        match d {
            -1 if inferred.is_none() => {
                inferred = Some(i);
                dims.push(1);
            }
            -1 => return Err(invalid("more than one -1 in target shape".to_string())),
            0 => dims.push(*t.shape().get(i).ok_or_else(|| {
                invalid(format!("0 at position {} exceeds input rank", i))
            })?),
            d if d > 0 => dims.push(d as usize),
            d => return Err(invalid(format!("invalid dimension {}", d))),
        }
    }
    if let Some(i) = inferred {
        let known: usize = dims.iter().product();
        if known == 0 || t.numel() % known != 0 {
            return Err(invalid(format!(
                "cannot infer dimension of {:?} for {} elements",
                requested,
                t.numel()
            )));
        }
        dims[i] = t.numel() / known;
    }
    t.reshaped(dims)
}
