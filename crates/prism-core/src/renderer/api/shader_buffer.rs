// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Constant and structured buffers: GPU buffers paired with a CPU-side copy laid out
//! by a [`BufferReflection`].
//!
//! Writes land in the CPU copy and mark it dirty. The next `upload` (called by
//! [`ProgramVars::commit`](crate::renderer::ProgramVars::commit)) records a single
//! write of the whole copy and clears the flag.

use crate::renderer::api::{Buffer, BufferDescriptor, BufferUsage, GpuAddress};
use crate::renderer::error::ResourceError;
use crate::renderer::reflection::{BufferReflection, VariableType};
use crate::renderer::traits::{CommandRecorder, GraphicsDevice};
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

/// CPU copy of a buffer's contents with a dirty flag.
#[derive(Debug)]
pub(crate) struct CpuShadow {
    data: Vec<u8>,
    dirty: bool,
}

impl CpuShadow {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            dirty: false,
        }
    }

    /// Copies `bytes` at `offset`. Returns `false` if they don't fit.
    pub(crate) fn write(&mut self, offset: usize, bytes: &[u8]) -> bool {
        let Some(end) = offset.checked_add(bytes.len()) else {
            return false;
        };
        if end > self.data.len() {
            return false;
        }
        self.data[offset..end].copy_from_slice(bytes);
        self.dirty = true;
        true
    }

    pub(crate) fn read(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records the pending write, if any.
    pub(crate) fn flush(&mut self, buffer: &Buffer, recorder: &mut dyn CommandRecorder) {
        if self.dirty {
            recorder.write_buffer(buffer, 0, &self.data);
            self.dirty = false;
        }
    }
}

/// Shared implementation of reflection-checked writes.
#[derive(Debug)]
struct ReflectedBuffer {
    reflection: Arc<BufferReflection>,
    buffer: Arc<Buffer>,
    element_count: u32,
    shadow: Mutex<CpuShadow>,
}

impl ReflectedBuffer {
    fn create(
        device: &dyn GraphicsDevice,
        reflection: Arc<BufferReflection>,
        element_count: u32,
        usage: BufferUsage,
    ) -> Result<Self, ResourceError> {
        let element_size = reflection.required_size();
        let size = element_size
            .checked_mul(element_count as usize)
            .filter(|size| *size > 0)
            .ok_or_else(|| ResourceError::InvalidSize {
                label: reflection.name().to_owned(),
                size: element_size as u64 * element_count as u64,
            })?;
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Owned(reflection.name().to_owned())),
            size: size as u64,
            usage: usage | BufferUsage::COPY_DST,
        })?;
        Ok(Self {
            reflection,
            buffer,
            element_count,
            shadow: Mutex::new(CpuShadow::new(size)),
        })
    }

    fn element_offset(&self, element: u32) -> Option<usize> {
        if element >= self.element_count {
            log::warn!(
                "Element {element} is out of range for buffer '{}' with {} elements",
                self.reflection.name(),
                self.element_count
            );
            return None;
        }
        Some(element as usize * self.reflection.required_size())
    }

    fn set_variable<T: bytemuck::Pod>(&self, element: u32, name: &str, value: &T) -> bool {
        let Some(base) = self.element_offset(element) else {
            return false;
        };
        let Some((variable, offset)) = self.reflection.variable_data(name, true) else {
            return false;
        };
        if !type_matches::<T>(variable.ty) {
            log::error!(
                "Type mismatch when setting '{name}' in buffer '{}': the variable is {} ({} bytes), the value is {} bytes",
                self.reflection.name(),
                variable.ty,
                variable.ty.byte_size().unwrap_or(0),
                std::mem::size_of::<T>()
            );
            return false;
        }
        self.set_blob(base + offset, bytemuck::bytes_of(value))
    }

    fn variable<T: bytemuck::Pod>(&self, element: u32, name: &str) -> Option<T> {
        let base = self.element_offset(element)?;
        let (variable, offset) = self.reflection.variable_data(name, true)?;
        if !type_matches::<T>(variable.ty) {
            log::error!(
                "Type mismatch when reading '{name}' from buffer '{}'",
                self.reflection.name()
            );
            return None;
        }
        let shadow = self.shadow.lock().unwrap();
        let bytes = shadow.read(base + offset, std::mem::size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    fn set_blob(&self, offset: usize, bytes: &[u8]) -> bool {
        let written = self.shadow.lock().unwrap().write(offset, bytes);
        if !written {
            log::warn!(
                "Writing {} bytes at offset {offset} overflows buffer '{}' ({} bytes)",
                bytes.len(),
                self.reflection.name(),
                self.buffer.size()
            );
        }
        written
    }

    fn upload(&self, recorder: &mut dyn CommandRecorder) {
        self.shadow.lock().unwrap().flush(&self.buffer, recorder);
    }
}

/// Values may only be written to variables of the same size.
fn type_matches<T>(ty: VariableType) -> bool {
    match ty.byte_size() {
        Some(size) => size == std::mem::size_of::<T>(),
        None => false,
    }
}

/// A constant (uniform) buffer laid out by reflection.
#[derive(Debug)]
pub struct ConstantBuffer {
    inner: ReflectedBuffer,
}

impl ConstantBuffer {
    /// Allocates a buffer of the reflection's required size.
    pub fn create(
        device: &dyn GraphicsDevice,
        reflection: Arc<BufferReflection>,
    ) -> Result<Arc<Self>, ResourceError> {
        let inner = ReflectedBuffer::create(device, reflection, 1, BufferUsage::CONSTANT)?;
        Ok(Arc::new(Self { inner }))
    }

    /// Writes `value` to the variable called `name` (for example `lights[2].color`).
    ///
    /// Returns `false` and logs if the variable is unknown or its size doesn't match `T`.
    pub fn set_variable<T: bytemuck::Pod>(&self, name: &str, value: &T) -> bool {
        self.inner.set_variable(0, name, value)
    }

    /// Reads back the CPU copy of a variable.
    pub fn variable<T: bytemuck::Pod>(&self, name: &str) -> Option<T> {
        self.inner.variable(0, name)
    }

    /// Copies raw bytes at a byte offset.
    pub fn set_blob(&self, offset: usize, bytes: &[u8]) -> bool {
        self.inner.set_blob(offset, bytes)
    }

    /// Records the write of pending CPU changes.
    pub fn upload(&self, recorder: &mut dyn CommandRecorder) {
        self.inner.upload(recorder);
    }

    /// Returns `true` if the CPU copy has changes not yet uploaded.
    pub fn is_dirty(&self) -> bool {
        self.inner.shadow.lock().unwrap().is_dirty()
    }

    /// The size of the GPU allocation in bytes.
    pub fn size(&self) -> usize {
        self.inner.buffer.size() as usize
    }

    /// The layout this buffer was created for.
    pub fn reflection(&self) -> &Arc<BufferReflection> {
        &self.inner.reflection
    }

    /// The backing GPU buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.inner.buffer
    }

    /// The GPU address bound as a root constant buffer view.
    pub fn gpu_address(&self) -> GpuAddress {
        self.inner.buffer.gpu_address()
    }
}

/// A structured (storage) buffer holding `element_count` elements laid out by reflection.
#[derive(Debug)]
pub struct StructuredBuffer {
    inner: ReflectedBuffer,
}

impl StructuredBuffer {
    /// Allocates `element_count` elements of the reflection's required size.
    pub fn create(
        device: &dyn GraphicsDevice,
        reflection: Arc<BufferReflection>,
        element_count: u32,
    ) -> Result<Arc<Self>, ResourceError> {
        let usage = BufferUsage::SHADER_RESOURCE | BufferUsage::UNORDERED_ACCESS;
        let inner = ReflectedBuffer::create(device, reflection, element_count, usage)?;
        Ok(Arc::new(Self { inner }))
    }

    /// Writes `value` to the variable called `name` of element `element`.
    pub fn set_variable<T: bytemuck::Pod>(&self, element: u32, name: &str, value: &T) -> bool {
        self.inner.set_variable(element, name, value)
    }

    /// Reads back the CPU copy of a variable of element `element`.
    pub fn variable<T: bytemuck::Pod>(&self, element: u32, name: &str) -> Option<T> {
        self.inner.variable(element, name)
    }

    /// Copies raw bytes at a byte offset from the start of the buffer.
    pub fn set_blob(&self, offset: usize, bytes: &[u8]) -> bool {
        self.inner.set_blob(offset, bytes)
    }

    /// Records the write of pending CPU changes.
    pub fn upload(&self, recorder: &mut dyn CommandRecorder) {
        self.inner.upload(recorder);
    }

    /// Returns `true` if the CPU copy has changes not yet uploaded.
    pub fn is_dirty(&self) -> bool {
        self.inner.shadow.lock().unwrap().is_dirty()
    }

    /// The number of elements.
    pub fn element_count(&self) -> u32 {
        self.inner.element_count
    }

    /// The size of the GPU allocation in bytes.
    pub fn size(&self) -> usize {
        self.inner.buffer.size() as usize
    }

    /// The layout of one element.
    pub fn reflection(&self) -> &Arc<BufferReflection> {
        &self.inner.reflection
    }

    /// The backing GPU buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.inner.buffer
    }

    /// The GPU address bound as a root shader-resource or unordered-access view.
    pub fn gpu_address(&self) -> GpuAddress {
        self.inner.buffer.gpu_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::reflection::{BufferType, ShaderAccess, Variable};
    use crate::renderer::testing::{MockDevice, RecordedCommand, TestRecorder};
    use std::collections::BTreeMap;

    fn per_frame() -> Arc<BufferReflection> {
        let mut variables = BTreeMap::new();
        variables.insert("viewProj".to_owned(), Variable::scalar(0, VariableType::Float4x4));
        variables.insert("time".to_owned(), Variable::scalar(64, VariableType::Float));
        variables.insert(
            "weights".to_owned(),
            Variable::array(80, VariableType::Float, 4, 16),
        );
        Arc::new(
            BufferReflection::create(
                "PerFrameCB",
                0,
                0,
                BufferType::Constant,
                ShaderAccess::Read,
                144,
                variables,
                BTreeMap::new(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn writes_follow_reflected_offsets() {
        let device = MockDevice::new();
        let cb = ConstantBuffer::create(&device, per_frame()).unwrap();
        assert_eq!(cb.size(), 144);
        assert!(!cb.is_dirty());

        assert!(cb.set_variable("time", &2.5f32));
        assert!(cb.set_variable("weights[2]", &7.0f32));
        assert!(cb.is_dirty());

        assert_eq!(cb.variable::<f32>("time"), Some(2.5));
        assert_eq!(cb.variable::<f32>("weights[2]"), Some(7.0));
        assert_eq!(cb.variable::<f32>("weights"), Some(0.0));
    }

    #[test]
    fn mismatched_or_unknown_variables_are_rejected() {
        let device = MockDevice::new();
        let cb = ConstantBuffer::create(&device, per_frame()).unwrap();

        assert!(!cb.set_variable("time", &[1.0f32; 4]));
        assert!(!cb.set_variable("nope", &1.0f32));
        assert!(!cb.set_variable("weights[4]", &1.0f32));
        assert!(!cb.is_dirty());
    }

    #[test]
    fn upload_flushes_once() {
        let device = MockDevice::new();
        let cb = ConstantBuffer::create(&device, per_frame()).unwrap();
        let mut recorder = TestRecorder::default();

        cb.upload(&mut recorder);
        assert!(recorder.commands.is_empty());

        assert!(cb.set_blob(64, &1.0f32.to_ne_bytes()));
        cb.upload(&mut recorder);
        cb.upload(&mut recorder);

        assert_eq!(recorder.commands.len(), 1);
        match &recorder.commands[0] {
            RecordedCommand::WriteBuffer { buffer, data, .. } => {
                assert_eq!(*buffer, cb.buffer().id());
                assert_eq!(data.len(), 144);
                assert_eq!(&data[64..68], &1.0f32.to_ne_bytes());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cb.is_dirty());
    }

    #[test]
    fn blob_overflow_is_rejected() {
        let device = MockDevice::new();
        let cb = ConstantBuffer::create(&device, per_frame()).unwrap();
        assert!(!cb.set_blob(140, &[0u8; 8]));
        assert!(!cb.set_blob(usize::MAX, &[0u8; 1]));
    }

    #[test]
    fn structured_elements_are_strided() {
        let device = MockDevice::new();
        let mut variables = BTreeMap::new();
        variables.insert("position".to_owned(), Variable::scalar(0, VariableType::Float3));
        variables.insert("mass".to_owned(), Variable::scalar(12, VariableType::Float));
        let reflection = Arc::new(
            BufferReflection::create(
                "particles",
                1,
                0,
                BufferType::Structured,
                ShaderAccess::ReadWrite,
                16,
                variables,
                BTreeMap::new(),
            )
            .unwrap(),
        );
        let sb = StructuredBuffer::create(&device, reflection, 8).unwrap();
        assert_eq!(sb.size(), 128);

        assert!(sb.set_variable(3, "mass", &4.0f32));
        assert_eq!(sb.variable::<f32>(3, "mass"), Some(4.0));
        assert_eq!(sb.variable::<f32>(2, "mass"), Some(0.0));
        assert!(!sb.set_variable(8, "mass", &4.0f32));
    }
}
