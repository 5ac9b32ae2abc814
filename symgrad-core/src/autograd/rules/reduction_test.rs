use crate::error::GradientError;
use crate::ir::OpKind;
use crate::types::{DType, Literal, Type};
use crate::utils::testing::{op_fixture, producer};

#[test]
fn test_reduce_sum_expands_to_input_shape() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::ReduceSum, &[Type::tensor(DType::F32, &[2, 3])], 1);
    let grads = f.differentiate(false)?;
    let expand = producer(&f.graph, grads.get(f.inputs[0]).unwrap()).unwrap();
    assert_eq!(expand.kind(), OpKind::Expand);
    assert_eq!(expand.inputs()[0], f.seeds[0]);
    let shape = producer(&f.graph, expand.inputs()[1]).unwrap();
    assert_eq!(shape.kind(), OpKind::Shape);
    assert_eq!(shape.inputs(), &[f.inputs[0]]);
    Ok(())
}

#[test]
fn test_reduce_mean_divides_by_leading_dimension() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::ReduceMean, &[Type::tensor(DType::F32, &[4, 3])], 1);
    let grads = f.differentiate(false)?;
    let g = &f.graph;

    let expand = producer(g, grads.get(f.inputs[0]).unwrap()).unwrap();
    assert_eq!(expand.kind(), OpKind::Expand);
    let div = producer(g, expand.inputs()[0]).unwrap();
    assert_eq!(div.kind(), OpKind::Div);
    assert_eq!(div.inputs()[0], f.seeds[0]);

    let cast = producer(g, div.inputs()[1]).unwrap();
    assert_eq!(cast.kind(), OpKind::Cast);
    assert_eq!(cast.attrs().to, Some(DType::F32));
    let gather = producer(g, cast.inputs()[0]).unwrap();
    assert_eq!(gather.kind(), OpKind::Gather);
    assert_eq!(gather.attrs().axis, 0);
    assert_eq!(gather.inputs()[0], expand.inputs()[1]);
    let zero = producer(g, gather.inputs()[1]).unwrap();
    assert_eq!(zero.attrs().value, Some(Literal::scalar(DType::I64, 0)));
    Ok(())
}

#[test]
fn test_reduce_mean_divisor_stays_f32_for_f64_inputs() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::ReduceMean, &[Type::tensor(DType::F64, &[4])], 1);
    let grads = f.differentiate(false)?;
    let g = &f.graph;
    let expand = producer(g, grads.get(f.inputs[0]).unwrap()).unwrap();
    let div = producer(g, expand.inputs()[0]).unwrap();
    let cast = producer(g, div.inputs()[1]).unwrap();
    assert_eq!(cast.attrs().to, Some(DType::F32));
    Ok(())
}
