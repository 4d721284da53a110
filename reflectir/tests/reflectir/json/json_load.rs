use anyhow::Result;
use reflectir::{deserialize, Any};

use crate::common;

fn expect_error(json: &str, needle: &str) {
    let err = deserialize(json).expect_err("load should fail");
    let message = format!("{:#}", err);
    assert!(
        message.contains(needle),
        "error `{}` does not mention `{}`",
        message,
        needle
    );
}

#[test]
fn cyclic_references_are_rejected() {
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "Array", "data": [2]},
            {"type_key": "Array", "data": [1]}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "Cyclic reference detected");
}

#[test]
fn self_references_are_rejected() {
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "Array", "data": [1]}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "Cyclic reference detected");
}

#[test]
fn out_of_table_references_are_rejected() {
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "Array", "data": [7]}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "outside the node table");
}

#[test]
fn out_of_table_root_is_rejected() {
    let json = r#"{"root": 9, "nodes": [{"type_key": ""}], "b64ndarrays": []}"#;
    expect_error(json, "outside the node table");
}

#[test]
fn malformed_pod_attrs_are_rejected() {
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "Int", "attrs": {"v_int64": "not a number"}}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "wrong integer format");
}

#[test]
fn unregistered_type_keys_are_rejected() {
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "no.SuchType"}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "unregistered type key");
}

#[test]
fn missing_field_attrs_are_rejected() {
    common::register_types();
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "test.Pair", "attrs": {"first": "null"}}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "cannot find field");
}

#[test]
fn odd_pair_encoded_maps_are_rejected() {
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "Map", "data": [2]},
            {"type_key": "Int", "attrs": {"v_int64": "1"}}
        ],
        "b64ndarrays": []
    }"#;
    expect_error(json, "odd number of data entries");
}

#[test]
fn truncated_json_is_rejected() {
    expect_error(r#"{"root": 1, "nodes"#, "failed to parse serialized graph");
}

#[test]
fn acyclic_graphs_always_load() -> Result<()> {
    common::register_types();
    // a small diamond: the root array references the pair twice
    let json = r#"{
        "root": 1,
        "nodes": [
            {"type_key": ""},
            {"type_key": "Array", "data": [2, 2]},
            {"type_key": "test.Pair", "attrs": {"first": "3", "second": "null", "note": ""}},
            {"type_key": "Int", "attrs": {"v_int64": "11"}}
        ],
        "b64ndarrays": []
    }"#;
    let loaded = deserialize(json)?;
    let Any::Array(array) = &loaded else { panic!("expected an array") };
    assert_eq!(array.len(), 2);
    assert!(array[0].same_as(&array[1]));
    let Any::Object(pair) = &array[0] else { panic!("expected a pair") };
    assert!(matches!(pair.field(0), Any::Int(11)));
    assert!(pair.field(1).is_none());
    Ok(())
}
