use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Device class, numbered compatibly with the DLPack device codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Cpu,
    Cuda,
    OpenCl,
    Vulkan,
    Metal,
    Rocm,
}

impl DeviceType {
    pub fn as_i32(self) -> i32 {
        match self {
            DeviceType::Cpu => 1,
            DeviceType::Cuda => 2,
            DeviceType::OpenCl => 4,
            DeviceType::Vulkan => 7,
            DeviceType::Metal => 8,
            DeviceType::Rocm => 10,
        }
    }

    pub fn from_i32(code: i32) -> Result<Self> {
        match code {
            1 => Ok(DeviceType::Cpu),
            2 => Ok(DeviceType::Cuda),
            4 => Ok(DeviceType::OpenCl),
            7 => Ok(DeviceType::Vulkan),
            8 => Ok(DeviceType::Metal),
            10 => Ok(DeviceType::Rocm),
            _ => Err(anyhow!("unknown device type code {}", code)),
        }
    }
}

/// A concrete device: class plus ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub device_type: DeviceType,
    pub device_id: i32,
}

impl Device {
    pub const fn new(device_type: DeviceType, device_id: i32) -> Self {
        Self {
            device_type,
            device_id,
        }
    }

    pub const fn cpu() -> Self {
        Self::new(DeviceType::Cpu, 0)
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self.device_type, self.device_id)
    }
}
