use crate::error::GradientError;
use crate::ir::OpKind;
use crate::types::{DType, Type};
use crate::utils::testing::{op_fixture, producer};

#[test]
fn test_sequence_stack_splits_gradient() -> Result<(), GradientError> {
    let mut f = op_fixture(OpKind::SequenceStack, &[Type::Sequence(DType::F32)], 1);
    f.graph.node_mut(f.node).attrs_mut().axis = 0;
    let grads = f.differentiate(false)?;
    let split = producer(&f.graph, grads.get(f.inputs[0]).unwrap()).unwrap();
    assert_eq!(split.kind(), OpKind::SequenceSplit);
    assert_eq!(split.inputs(), &[f.seeds[0]]);
    assert_eq!(split.attrs().axis, 0);
    Ok(())
}

#[test]
fn test_sequence_append_pops_one_node_for_both_gradients() -> Result<(), GradientError> {
    let mut f = op_fixture(
        OpKind::SequenceAppend,
        &[Type::Sequence(DType::F32), Type::tensor(DType::F32, &[2])],
        1,
    );
    let grads = f.differentiate(false)?;
    let gseq = grads.get(f.inputs[0]).unwrap();
    let gelem = grads.get(f.inputs[1]).unwrap();
    let seq_producer = f.graph.value(gseq).producer().unwrap();
    assert_eq!(f.graph.value(gelem).producer(), Some(seq_producer));
    let pop = f.graph.node(seq_producer);
    assert_eq!(pop.kind(), OpKind::SequencePop);
    assert_eq!(pop.inputs(), &[f.seeds[0]]);
    assert_eq!(pop.outputs(), &[gseq, gelem]);
    Ok(())
}
