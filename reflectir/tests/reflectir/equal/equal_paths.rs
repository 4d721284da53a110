use anyhow::Result;
use reflectir::{first_mismatch, AccessStep, Any};

use crate::common;

#[test]
fn equal_values_report_no_mismatch() -> Result<()> {
    let lhs = Any::array([Any::Int(1), Any::Int(2)]);
    let rhs = Any::array([Any::Int(1), Any::Int(2)]);
    assert!(first_mismatch(&lhs, &rhs, false, false)?.is_none());
    Ok(())
}

#[test]
fn root_mismatch_yields_empty_paths() -> Result<()> {
    let (lhs_path, rhs_path) = first_mismatch(&Any::Int(3), &Any::Float(3.0), false, false)?
        .expect("values differ");
    assert!(lhs_path.is_empty());
    assert!(rhs_path.is_empty());
    Ok(())
}

#[test]
fn array_element_mismatch_is_located() -> Result<()> {
    let lhs = Any::array([Any::Int(1), Any::Int(2), Any::Int(3)]);
    let rhs = Any::array([Any::Int(1), Any::Int(4), Any::Int(3)]);
    let (lhs_path, rhs_path) =
        first_mismatch(&lhs, &rhs, false, false)?.expect("values differ");
    assert_eq!(lhs_path.steps(), &[AccessStep::ArrayIndex(1)]);
    assert_eq!(rhs_path.steps(), &[AccessStep::ArrayIndex(1)]);
    Ok(())
}

#[test]
fn array_length_mismatch_marks_the_missing_side() -> Result<()> {
    let lhs = Any::array([Any::Int(1), Any::Int(2)]);
    let rhs = Any::array([Any::Int(1), Any::Int(2), Any::Int(3)]);
    let (lhs_path, rhs_path) =
        first_mismatch(&lhs, &rhs, false, false)?.expect("values differ");
    assert_eq!(lhs_path.steps(), &[AccessStep::ArrayIndexMissing(2)]);
    assert_eq!(rhs_path.steps(), &[AccessStep::ArrayIndex(2)]);
    Ok(())
}

#[test]
fn map_key_mismatch_names_the_key() -> Result<()> {
    let lhs = Any::map([(Any::str("a"), Any::Int(1)), (Any::str("b"), Any::Int(2))]);
    let rhs = Any::map([(Any::str("a"), Any::Int(1)), (Any::str("c"), Any::Int(2))]);
    let (lhs_path, rhs_path) =
        first_mismatch(&lhs, &rhs, false, false)?.expect("values differ");
    assert_eq!(lhs_path.steps(), &[AccessStep::MapKey(Any::str("b"))]);
    assert_eq!(rhs_path.steps(), &[AccessStep::MapKeyMissing(Any::str("b"))]);
    Ok(())
}

#[test]
fn map_value_mismatch_descends_through_the_key() -> Result<()> {
    let lhs = Any::map([(Any::str("k"), Any::array([Any::Int(1)]))]);
    let rhs = Any::map([(Any::str("k"), Any::array([Any::Int(2)]))]);
    let (lhs_path, rhs_path) =
        first_mismatch(&lhs, &rhs, false, false)?.expect("values differ");
    assert_eq!(
        lhs_path.steps(),
        &[AccessStep::MapKey(Any::str("k")), AccessStep::ArrayIndex(0)]
    );
    assert_eq!(
        rhs_path.steps(),
        &[AccessStep::MapKey(Any::str("k")), AccessStep::ArrayIndex(0)]
    );
    Ok(())
}

#[test]
fn object_field_mismatch_is_root_to_leaf() -> Result<()> {
    common::register_types();
    let lhs = common::pair(Any::array([Any::Int(1), Any::Int(2)]), Any::Int(3));
    let rhs = common::pair(Any::array([Any::Int(1), Any::Int(9)]), Any::Int(3));
    let (lhs_path, rhs_path) =
        first_mismatch(&lhs, &rhs, false, false)?.expect("values differ");
    assert_eq!(
        lhs_path.steps(),
        &[
            AccessStep::ObjectField("first".to_string()),
            AccessStep::ArrayIndex(1),
        ]
    );
    assert_eq!(rhs_path.steps(), lhs_path.steps());
    assert_eq!(lhs_path.to_string(), "<root>.first[1]");
    Ok(())
}

#[test]
fn only_the_first_failing_field_is_reported() -> Result<()> {
    common::register_types();
    // both fields differ; registration order picks `first`
    let lhs = common::pair(Any::Int(1), Any::Int(2));
    let rhs = common::pair(Any::Int(8), Any::Int(9));
    let (lhs_path, _) = first_mismatch(&lhs, &rhs, false, false)?.expect("values differ");
    assert_eq!(
        lhs_path.steps(),
        &[AccessStep::ObjectField("first".to_string())]
    );
    Ok(())
}
