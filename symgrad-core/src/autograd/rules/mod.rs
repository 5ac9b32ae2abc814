//! Per-operator gradient rules, grouped by operator family.

pub(crate) mod activation;
pub(crate) mod arithmetic;
pub(crate) mod linalg;
pub(crate) mod loop_grad;
pub(crate) mod nn;
pub(crate) mod reduction;
pub(crate) mod sequence;
pub(crate) mod shape;
