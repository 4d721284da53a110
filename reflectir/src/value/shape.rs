use anyhow::{bail, Result};

/// Integer shape vector.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShapeObj {
    dims: Vec<i64>,
}

impl ShapeObj {
    pub fn new(dims: Vec<i64>) -> Self {
        Self { dims }
    }

    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Opaque repr encoding: each dimension as a little-endian i64.
    pub fn to_repr_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.dims.len() * 8);
        for dim in &self.dims {
            out.extend_from_slice(&dim.to_le_bytes());
        }
        out
    }

    pub fn from_repr_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            bail!("shape repr length {} is not a multiple of 8", bytes.len());
        }
        let dims = bytes
            .chunks_exact(8)
            .map(|chunk| i64::from_le_bytes(chunk.try_into().expect("chunk is 8 bytes")))
            .collect();
        Ok(Self { dims })
    }
}
