//! Runtime-owned tensors, staged to and from host [`Tensor`] buffers.

use std::ffi::{c_int, c_void};
use std::ptr;
use std::slice;

use graphdeploy_core::{DType, Device, Shape, Tensor};

use crate::error::{Result, RuntimeError};
use crate::ffi;

#[derive(Debug)]
pub struct NDArray {
    handle: ffi::ArrayHandle,
    // Views (e.g. executor outputs) stay owned by the runtime.
    is_view: bool,
}

// Safety: runtime array handles are internally synchronized.
unsafe impl Send for NDArray {}

impl NDArray {
    pub(crate) fn from_view(handle: ffi::ArrayHandle) -> Self {
        NDArray {
            handle,
            is_view: true,
        }
    }

    pub fn handle(&self) -> ffi::ArrayHandle {
        self.handle
    }

    pub fn is_view(&self) -> bool {
        self.is_view
    }

    /// Allocates an uninitialized array on the given device.
    pub fn empty(shape: &Shape, dtype: DType, device: Device) -> Result<NDArray> {
        let api = ffi::api()?;
        let dims = shape.as_i64();
        let mut handle = ptr::null_mut() as ffi::ArrayHandle;
        ffi::check(
            api,
            unsafe {
                (api.array_alloc)(
                    dims.as_ptr(),
                    dims.len() as c_int,
                    dtype.code as c_int,
                    dtype.bits as c_int,
                    dtype.lanes as c_int,
                    device.type_code(),
                    device.id(),
                    &mut handle,
                )
            },
            "TVMArrayAlloc",
        )?;
        if handle.is_null() {
            return Err(RuntimeError::NullHandle("array".to_string()));
        }
        Ok(NDArray {
            handle,
            is_view: false,
        })
    }

    /// Allocates on the device and fills from a host tensor.
    pub fn from_tensor(tensor: &Tensor, device: Device) -> Result<NDArray> {
        let mut array = NDArray::empty(&tensor.desc.shape, tensor.desc.dtype, device)?;
        array.copy_from_bytes(&tensor.bytes)?;
        Ok(array)
    }

    fn dl_tensor(&self) -> &ffi::DLTensor {
        unsafe { &*self.handle }
    }

    pub fn ndim(&self) -> usize {
        self.dl_tensor().ndim as usize
    }

    pub fn shape(&self) -> Result<Shape> {
        let dl = self.dl_tensor();
        if dl.shape.is_null() || dl.data.is_null() {
            return Err(RuntimeError::EmptyTensor);
        }
        let dims = unsafe { slice::from_raw_parts(dl.shape, dl.ndim as usize) };
        Ok(Shape(dims.iter().map(|&d| d as usize).collect()))
    }

    pub fn dtype(&self) -> DType {
        let dl = self.dl_tensor().dtype;
        DType {
            code: dl.code,
            bits: dl.bits,
            lanes: dl.lanes,
        }
    }

    pub fn device(&self) -> (i32, i32) {
        let dl = self.dl_tensor().device;
        (dl.device_type, dl.device_id)
    }

    pub fn byte_len(&self) -> Result<usize> {
        Ok(self.shape()?.numel() * self.dtype().byte_size())
    }

    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.byte_len()?;
        if bytes.len() != expected {
            return Err(RuntimeError::SizeMismatch {
                got: bytes.len(),
                expected,
            });
        }
        let api = ffi::api()?;
        ffi::check(
            api,
            unsafe {
                (api.array_copy_from_bytes)(
                    self.handle,
                    bytes.as_ptr() as *mut c_void,
                    bytes.len(),
                )
            },
            "TVMArrayCopyFromBytes",
        )
    }

    /// Copies out to a host tensor, whatever device the array lives on.
    pub fn to_tensor(&self) -> Result<Tensor> {
        let shape = self.shape()?;
        let dtype = self.dtype();
        let mut buf = vec![0u8; shape.numel() * dtype.byte_size()];
        let api = ffi::api()?;
        ffi::check(
            api,
            unsafe {
                (api.array_copy_to_bytes)(self.handle, buf.as_mut_ptr() as *mut c_void, buf.len())
            },
            "TVMArrayCopyToBytes",
        )?;
        Ok(Tensor::from_cpu_bytes(dtype, shape, buf.into()))
    }
}

impl Drop for NDArray {
    fn drop(&mut self) {
        if !self.is_view && !self.handle.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe {
                    (api.array_free)(self.handle);
                }
            }
        }
    }
}
