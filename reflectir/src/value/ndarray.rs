//! Dense tensor container.
//!
//! `NdArrayObj` owns a flat byte buffer with shape, dtype and device
//! metadata. Content comparison and the blob codec are restricted to
//! CPU-resident, contiguous tensors.

use anyhow::{anyhow, bail, Result};
use bytemuck::Pod;

use super::device::{Device, DeviceType};
use super::dtype::DataType;

const MAGIC: u64 = 0x52_46_4c_54_4e_44_41_31; // "RFLTNDA1"

pub fn numel(shape: &[i64]) -> usize {
    shape.iter().map(|dim| *dim as usize).product()
}

pub fn compute_strides(shape: &[i64]) -> Vec<i64> {
    let mut strides = vec![0i64; shape.len()];
    let mut stride = 1i64;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride = stride.saturating_mul(shape[i]);
    }
    strides
}

/// Dense tensor: header plus owned byte storage.
#[derive(Debug)]
pub struct NdArrayObj {
    shape: Vec<i64>,
    dtype: DataType,
    device: Device,
    strides: Option<Vec<i64>>,
    data: Vec<u8>,
}

impl NdArrayObj {
    pub fn new(shape: Vec<i64>, dtype: DataType, device: Device, data: Vec<u8>) -> Result<Self> {
        let expected = numel(&shape) * dtype.bytes();
        if data.len() != expected {
            bail!(
                "tensor data is {} bytes, shape {:?} with dtype {} needs {}",
                data.len(),
                shape,
                dtype,
                expected
            );
        }
        Ok(Self {
            shape,
            dtype,
            device,
            strides: None,
            data,
        })
    }

    /// Build a CPU tensor from a typed element vector.
    pub fn from_vec<T: Pod>(data: Vec<T>, shape: Vec<i64>, dtype: DataType) -> Result<Self> {
        let bytes = bytemuck::cast_slice(&data).to_vec();
        Self::new(shape, dtype, Device::cpu(), bytes)
    }

    /// Override stride metadata (in elements). Strided views refuse content
    /// comparison and blob encoding.
    pub fn with_strides(mut self, strides: Vec<i64>) -> Self {
        self.strides = Some(strides);
        self
    }

    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn byte_size(&self) -> usize {
        numel(&self.shape) * self.dtype.bytes()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copy the payload out as typed elements. The byte buffer carries no
    /// alignment guarantee, so this copies rather than reinterprets.
    pub fn to_typed_vec<T: Pod>(&self) -> Vec<T> {
        bytemuck::pod_collect_to_vec(&self.data)
    }

    pub fn is_cpu(&self) -> bool {
        self.device.device_type == DeviceType::Cpu
    }

    pub fn is_contiguous(&self) -> bool {
        match &self.strides {
            None => true,
            Some(strides) => *strides == compute_strides(&self.shape),
        }
    }

    /// Encode into the canonical binary blob.
    pub fn save_bytes(&self) -> Result<Vec<u8>> {
        if !self.is_cpu() {
            bail!("can only save CPU tensor");
        }
        if !self.is_contiguous() {
            bail!("can only save contiguous tensor");
        }
        let mut out = Vec::with_capacity(32 + self.shape.len() * 8 + self.data.len());
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&self.device.device_type.as_i32().to_le_bytes());
        out.extend_from_slice(&self.device.device_id.to_le_bytes());
        out.extend_from_slice(&(self.shape.len() as u32).to_le_bytes());
        out.push(self.dtype.code.as_u8());
        out.push(self.dtype.bits);
        out.extend_from_slice(&self.dtype.lanes.to_le_bytes());
        for dim in &self.shape {
            out.extend_from_slice(&dim.to_le_bytes());
        }
        out.extend_from_slice(&(self.data.len() as u64).to_le_bytes());
        out.extend_from_slice(&self.data);
        Ok(out)
    }

    /// Decode a canonical blob back into a tensor.
    pub fn load_bytes(blob: &[u8]) -> Result<Self> {
        let mut cursor = 0usize;
        let magic = read_u64(blob, &mut cursor)?;
        if magic != MAGIC {
            bail!("invalid tensor blob magic");
        }
        let device_type = DeviceType::from_i32(read_i32(blob, &mut cursor)?)?;
        let device_id = read_i32(blob, &mut cursor)?;
        let ndim = read_u32(blob, &mut cursor)? as usize;
        let code = read_u8(blob, &mut cursor)?;
        let bits = read_u8(blob, &mut cursor)?;
        let lanes = read_u16(blob, &mut cursor)?;
        let dtype = DataType::new(super::dtype::DTypeCode::from_u8(code)?, bits, lanes);
        let mut shape = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            shape.push(read_i64(blob, &mut cursor)?);
        }
        let nbytes = read_u64(blob, &mut cursor)? as usize;
        if nbytes != numel(&shape) * dtype.bytes() {
            bail!("tensor blob payload size mismatch");
        }
        let data = read_bytes(blob, &mut cursor, nbytes)?.to_vec();
        if cursor != blob.len() {
            bail!("trailing bytes after tensor blob payload");
        }
        Self::new(shape, dtype, Device::new(device_type, device_id), data)
    }
}

fn read_bytes<'a>(data: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = cursor
        .checked_add(len)
        .ok_or_else(|| anyhow!("tensor blob offset overflow"))?;
    if end > data.len() {
        bail!("tensor blob truncated");
    }
    let slice = &data[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn read_u8(data: &[u8], cursor: &mut usize) -> Result<u8> {
    Ok(read_bytes(data, cursor, 1)?[0])
}

fn read_u16(data: &[u8], cursor: &mut usize) -> Result<u16> {
    Ok(u16::from_le_bytes(
        read_bytes(data, cursor, 2)?.try_into().expect("2 bytes"),
    ))
}

fn read_u32(data: &[u8], cursor: &mut usize) -> Result<u32> {
    Ok(u32::from_le_bytes(
        read_bytes(data, cursor, 4)?.try_into().expect("4 bytes"),
    ))
}

fn read_i32(data: &[u8], cursor: &mut usize) -> Result<i32> {
    Ok(i32::from_le_bytes(
        read_bytes(data, cursor, 4)?.try_into().expect("4 bytes"),
    ))
}

fn read_u64(data: &[u8], cursor: &mut usize) -> Result<u64> {
    Ok(u64::from_le_bytes(
        read_bytes(data, cursor, 8)?.try_into().expect("8 bytes"),
    ))
}

fn read_i64(data: &[u8], cursor: &mut usize) -> Result<i64> {
    Ok(i64::from_le_bytes(
        read_bytes(data, cursor, 8)?.try_into().expect("8 bytes"),
    ))
}
