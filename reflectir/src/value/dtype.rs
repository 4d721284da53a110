use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Element type class of a [`DataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DTypeCode {
    Int,
    UInt,
    Float,
    OpaqueHandle,
    BFloat,
}

impl DTypeCode {
    pub fn as_u8(self) -> u8 {
        match self {
            DTypeCode::Int => 0,
            DTypeCode::UInt => 1,
            DTypeCode::Float => 2,
            DTypeCode::OpaqueHandle => 3,
            DTypeCode::BFloat => 4,
        }
    }

    pub fn from_u8(code: u8) -> Result<Self> {
        match code {
            0 => Ok(DTypeCode::Int),
            1 => Ok(DTypeCode::UInt),
            2 => Ok(DTypeCode::Float),
            3 => Ok(DTypeCode::OpaqueHandle),
            4 => Ok(DTypeCode::BFloat),
            _ => Err(anyhow!("unknown dtype code {}", code)),
        }
    }
}

/// Element type descriptor: class, bit width and vector lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub code: DTypeCode,
    pub bits: u8,
    pub lanes: u16,
}

impl DataType {
    pub const fn new(code: DTypeCode, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    pub const fn bool() -> Self {
        Self::new(DTypeCode::UInt, 1, 1)
    }

    pub const fn int(bits: u8) -> Self {
        Self::new(DTypeCode::Int, bits, 1)
    }

    pub const fn uint(bits: u8) -> Self {
        Self::new(DTypeCode::UInt, bits, 1)
    }

    pub const fn float(bits: u8) -> Self {
        Self::new(DTypeCode::Float, bits, 1)
    }

    /// Bytes occupied by a single (possibly vectorized) element.
    pub fn bytes(&self) -> usize {
        (self.bits as usize * self.lanes as usize).div_ceil(8)
    }

    /// Parse a dtype from its canonical string form.
    pub fn parse(text: &str) -> Result<Self> {
        if text == "bool" {
            return Ok(Self::bool());
        }
        let (head, lanes) = match text.split_once('x') {
            Some((head, lanes)) => {
                let lanes: u16 = lanes
                    .parse()
                    .map_err(|_| anyhow!("invalid dtype lanes in `{}`", text))?;
                (head, lanes)
            }
            None => (text, 1),
        };
        let (code, digits) = if let Some(rest) = head.strip_prefix("uint") {
            (DTypeCode::UInt, rest)
        } else if let Some(rest) = head.strip_prefix("int") {
            (DTypeCode::Int, rest)
        } else if let Some(rest) = head.strip_prefix("bfloat") {
            (DTypeCode::BFloat, rest)
        } else if let Some(rest) = head.strip_prefix("float") {
            (DTypeCode::Float, rest)
        } else if head == "handle" {
            (DTypeCode::OpaqueHandle, "64")
        } else {
            return Err(anyhow!("unknown dtype `{}`", text));
        };
        let bits: u8 = digits
            .parse()
            .map_err(|_| anyhow!("invalid dtype bits in `{}`", text))?;
        Ok(Self { code, bits, lanes })
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::bool() {
            return write!(f, "bool");
        }
        let prefix = match self.code {
            DTypeCode::Int => "int",
            DTypeCode::UInt => "uint",
            DTypeCode::Float => "float",
            DTypeCode::BFloat => "bfloat",
            DTypeCode::OpaqueHandle => return write!(f, "handle"),
        };
        if self.lanes == 1 {
            write!(f, "{}{}", prefix, self.bits)
        } else {
            write!(f, "{}{}x{}", prefix, self.bits, self.lanes)
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}
