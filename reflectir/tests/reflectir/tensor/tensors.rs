use std::rc::Rc;

use anyhow::Result;
use reflectir::{
    deserialize, equal, registry, serialize, Any, DataType, Device, DeviceType, NdArrayObj,
};

use crate::common;

fn tensor_f32(values: &[f32], shape: &[i64]) -> Any {
    let tensor = NdArrayObj::from_vec(values.to_vec(), shape.to_vec(), DataType::float(32))
        .expect("build tensor");
    Any::NdArray(Rc::new(tensor))
}

#[test]
fn tensor_equality_compares_header_then_bytes() -> Result<()> {
    let lhs = tensor_f32(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let rhs = tensor_f32(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    assert!(equal(&lhs, &rhs, false, false)?);
    assert!(equal(&lhs, &lhs.clone(), false, false)?);

    let reshaped = tensor_f32(&[1.0, 2.0, 3.0, 4.0], &[4]);
    assert!(!equal(&lhs, &reshaped, false, false)?);

    let retyped = Any::NdArray(Rc::new(NdArrayObj::from_vec(
        vec![1i32, 2, 3, 4],
        vec![2, 2],
        DataType::int(32),
    )?));
    assert!(!equal(&lhs, &retyped, false, false)?);
    Ok(())
}

#[test]
fn flipping_one_byte_breaks_equality_unless_content_is_skipped() -> Result<()> {
    let lhs = tensor_f32(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let rhs = tensor_f32(&[1.0, 2.0, 3.0, 4.000001], &[2, 2]);
    assert!(!equal(&lhs, &rhs, false, false)?);
    assert!(equal(&lhs, &rhs, false, true)?);
    Ok(())
}

#[test]
fn non_cpu_content_comparison_is_a_contract_violation() -> Result<()> {
    let bytes = vec![0u8; 16];
    let gpu = Any::NdArray(Rc::new(NdArrayObj::new(
        vec![4],
        DataType::float(32),
        Device::new(DeviceType::Cuda, 0),
        bytes.clone(),
    )?));
    let gpu_too = Any::NdArray(Rc::new(NdArrayObj::new(
        vec![4],
        DataType::float(32),
        Device::new(DeviceType::Cuda, 0),
        bytes,
    )?));
    assert!(equal(&gpu, &gpu_too, false, true)?);
    assert!(equal(&gpu, &gpu.clone(), false, false)?);
    let err = equal(&gpu, &gpu_too, false, false).expect_err("content compare must fail");
    assert!(format!("{:#}", err).contains("CPU tensor"));
    Ok(())
}

#[test]
fn non_contiguous_content_comparison_is_a_contract_violation() -> Result<()> {
    let strided = Any::NdArray(Rc::new(
        NdArrayObj::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2], DataType::float(32))?
            .with_strides(vec![1, 2]),
    ));
    let dense = tensor_f32(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    assert!(equal(&strided, &dense, false, true)?);
    assert!(equal(&strided, &dense, false, false).is_err());
    Ok(())
}

#[test]
fn blob_codec_round_trips() -> Result<()> {
    let tensor =
        NdArrayObj::from_vec(vec![5u8, 6, 7, 8, 9, 10], vec![2, 3], DataType::uint(8))?;
    let blob = tensor.save_bytes()?;
    let loaded = NdArrayObj::load_bytes(&blob)?;
    assert_eq!(loaded.shape(), tensor.shape());
    assert_eq!(loaded.dtype(), tensor.dtype());
    assert_eq!(loaded.data(), tensor.data());

    assert!(NdArrayObj::load_bytes(&blob[..blob.len() - 1]).is_err());
    let mut corrupt = blob.clone();
    corrupt[0] ^= 0xff;
    assert!(NdArrayObj::load_bytes(&corrupt).is_err());
    Ok(())
}

#[test]
fn tensors_round_trip_through_the_envelope() -> Result<()> {
    common::register_types();
    let tensor = tensor_f32(&[0.5, -1.5, 2.5], &[3]);
    let holder = Any::Object(registry::make_object(
        "test.TensorHolder",
        vec![Any::str("weights"), tensor.clone()],
    )?);

    let json = serialize(&holder)?;
    let envelope: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(envelope["b64ndarrays"].as_array().expect("blobs").len(), 1);

    let loaded = deserialize(&json)?;
    assert!(equal(&holder, &loaded, false, false)?);

    let Any::Object(obj) = &loaded else { panic!("expected an object") };
    let Any::NdArray(reloaded) = obj.field(1) else { panic!("expected a tensor") };
    assert_eq!(reloaded.to_typed_vec::<f32>(), vec![0.5, -1.5, 2.5]);
    Ok(())
}

#[test]
fn shared_tensors_serialize_one_blob() -> Result<()> {
    let tensor = tensor_f32(&[1.0, 2.0], &[2]);
    let value = Any::array([tensor.clone(), tensor.clone()]);

    let json = serialize(&value)?;
    let envelope: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(envelope["b64ndarrays"].as_array().expect("blobs").len(), 1);

    let loaded = deserialize(&json)?;
    let Any::Array(array) = &loaded else { panic!("expected an array") };
    assert!(array[0].same_as(&array[1]));
    assert!(equal(&value, &loaded, false, false)?);
    Ok(())
}
