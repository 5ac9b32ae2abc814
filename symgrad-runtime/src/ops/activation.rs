use crate::error::RuntimeError;
use crate::ops::reduction::normalize_axis;
use crate::tensor::Tensor;

/// Calls `f` on every 1-D lane of `t` along `axis`, with the lane copied
/// into a buffer that `f` rewrites in place.
fn map_lanes<F>(t: &Tensor, axis: i64, f: F) -> Result<Tensor, RuntimeError>
where
    F: Fn(&mut [f64]),
{
    let axis = normalize_axis(axis, t.rank())?;
    let shape = t.shape();
    let len = shape[axis];
    let inner: usize = shape[axis + 1..].iter().product();
    let outer: usize = shape[..axis].iter().product();
    let src = t.data();
    let mut data = src.to_vec();
    let mut lane = vec![0.0; len];
    for o in 0..outer {
        for i in 0..inner {
            let base = o * len * inner + i;
            for (k, v) in lane.iter_mut().enumerate() {
                *v = src[base + k * inner];
            }
            f(&mut lane);
            for (k, &v) in lane.iter().enumerate() {
                data[base + k * inner] = v;
            }
        }
    }
    Tensor::new(t.dtype(), shape.to_vec(), data)
}

pub fn softmax(t: &Tensor, axis: i64) -> Result<Tensor, RuntimeError> {
    map_lanes(t, axis, |lane| {
        let max = lane.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for v in lane.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in lane.iter_mut() {
            *v /= sum;
        }
    })
}

pub fn log_softmax(t: &Tensor, axis: i64) -> Result<Tensor, RuntimeError> {
    map_lanes(t, axis, |lane| {
        let max = lane.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let log_sum = lane.iter().map(|v| (v - max).exp()).sum::<f64>().ln() + max;
        for v in lane.iter_mut() {
            *v -= log_sum;
        }
    })
}
