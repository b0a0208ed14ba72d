use std::fmt;
use std::str::FromStr;

use anyhow::{bail, ensure, Result};
use bytes::Bytes;
use smallvec::SmallVec;

/// Execution device for a loaded bundle. Mirrors the runtime's
/// (device_type, device_id) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

impl Device {
    /// Device type code in the runtime's device struct.
    pub fn type_code(&self) -> i32 {
        match self {
            Device::Cpu => 1,
            Device::Cuda { .. } => 2,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Device::Cpu => 0,
            Device::Cuda { device_id } => *device_id as i32,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda { device_id } => write!(f, "cuda:{device_id}"),
        }
    }
}

impl FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        if raw.eq_ignore_ascii_case("cpu") {
            return Ok(Device::Cpu);
        }
        if let Some(rest) = raw.strip_prefix("cuda:") {
            let device_id: u32 = rest.parse()?;
            return Ok(Device::Cuda { device_id });
        }
        bail!("unsupported device: {raw} (expected cpu or cuda:N)");
    }
}

/// Element type as the runtime's (code, bits, lanes) triple.
///
/// Codes follow the runtime's data-type struct: 0 = int, 1 = uint, 2 = float.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DType {
    pub code: u8,
    pub bits: u8,
    pub lanes: u16,
}

impl DType {
    pub const F32: DType = DType { code: 2, bits: 32, lanes: 1 };
    pub const F64: DType = DType { code: 2, bits: 64, lanes: 1 };
    pub const I32: DType = DType { code: 0, bits: 32, lanes: 1 };
    pub const I64: DType = DType { code: 0, bits: 64, lanes: 1 };
    pub const U8: DType = DType { code: 1, bits: 8, lanes: 1 };
    pub const U32: DType = DType { code: 1, bits: 32, lanes: 1 };

    /// Size of one element in bytes.
    pub fn byte_size(&self) -> usize {
        (self.bits as usize * self.lanes as usize).div_ceil(8)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.code {
            0 => "int",
            1 => "uint",
            2 => "float",
            _ => "unknown",
        };
        write!(f, "{}{}", base, self.bits)?;
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl FromStr for DType {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (code, rest) = if let Some(rest) = raw.strip_prefix("float") {
            (2u8, rest)
        } else if let Some(rest) = raw.strip_prefix("uint") {
            (1u8, rest)
        } else if let Some(rest) = raw.strip_prefix("int") {
            (0u8, rest)
        } else {
            bail!("unsupported dtype: {raw}");
        };
        let bits: u8 = if rest.is_empty() { 32 } else { rest.parse()? };
        Ok(DType { code, bits, lanes: 1 })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
    pub fn as_i64(&self) -> Vec<i64> {
        self.0.iter().map(|&d| d as i64).collect()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

#[derive(Clone, Debug)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
    pub device: Device,
}

/// Host-side staging buffer: contiguous little-endian bytes plus a
/// descriptor. Device placement happens when the runtime copies it in.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            desc: TensorDesc {
                dtype,
                shape,
                device: Device::Cpu,
            },
            bytes,
        }
    }

    pub fn from_f32(shape: Shape, data: &[f32]) -> Result<Self> {
        ensure!(
            data.len() == shape.numel(),
            "shape {} expects {} elements, got {}",
            shape,
            shape.numel(),
            data.len()
        );
        let mut bytes = Vec::with_capacity(data.len() * 4);
        for v in data {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Ok(Self::from_cpu_bytes(DType::F32, shape, Bytes::from(bytes)))
    }

    pub fn to_f32(&self) -> Result<Vec<f32>> {
        ensure!(
            self.desc.dtype == DType::F32,
            "expected float32 tensor, got {}",
            self.desc.dtype
        );
        ensure!(
            self.bytes.len() % 4 == 0,
            "f32 tensor has invalid byte length {}",
            self.bytes.len()
        );
        Ok(self
            .bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Byte length the descriptor declares; copies into the runtime are
    /// checked against this.
    pub fn expected_byte_len(&self) -> usize {
        self.desc.shape.numel() * self.desc.dtype.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parse_and_display() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!(
            "cuda:1".parse::<Device>().unwrap(),
            Device::Cuda { device_id: 1 }
        );
        assert!("tpu".parse::<Device>().is_err());
        assert_eq!(Device::Cuda { device_id: 3 }.to_string(), "cuda:3");
        assert_eq!(Device::Cpu.type_code(), 1);
        assert_eq!(Device::Cuda { device_id: 3 }.id(), 3);
    }

    #[test]
    fn dtype_roundtrip() {
        assert_eq!("float32".parse::<DType>().unwrap(), DType::F32);
        assert_eq!("int64".parse::<DType>().unwrap(), DType::I64);
        assert_eq!("uint8".parse::<DType>().unwrap(), DType::U8);
        // Bare "float" defaults to 32 bits, like the runtime's string form.
        assert_eq!("float".parse::<DType>().unwrap(), DType::F32);
        assert_eq!(DType::F32.to_string(), "float32");
        assert_eq!(DType::F32.byte_size(), 4);
        assert_eq!(DType::U8.byte_size(), 1);
    }

    #[test]
    fn shape_numel() {
        let s = Shape::from_slice(&[1, 3, 224, 224]);
        assert_eq!(s.rank(), 4);
        assert_eq!(s.numel(), 3 * 224 * 224);
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
        assert_eq!(s.as_i64(), vec![1, 3, 224, 224]);
    }

    #[test]
    fn f32_roundtrip() {
        let data = vec![0.5f32, -1.0, 3.25, 0.0];
        let t = Tensor::from_f32(Shape::from_slice(&[2, 2]), &data).unwrap();
        assert_eq!(t.byte_len(), 16);
        assert_eq!(t.expected_byte_len(), 16);
        assert_eq!(t.to_f32().unwrap(), data);
    }

    #[test]
    fn f32_shape_mismatch() {
        let err = Tensor::from_f32(Shape::from_slice(&[3]), &[1.0, 2.0]);
        assert!(err.is_err());
    }
}
