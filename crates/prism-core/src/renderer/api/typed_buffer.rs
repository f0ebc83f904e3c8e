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

//! A buffer viewed by shaders as an array of formatted elements.

use crate::renderer::api::shader_buffer::CpuShadow;
use crate::renderer::api::{Buffer, BufferDescriptor, BufferUsage, TextureFormat};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::{CommandRecorder, GraphicsDevice};
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

/// A typed buffer. Elements are edited on the CPU and uploaded before the buffer
/// is bound.
#[derive(Debug)]
pub struct TypedBuffer {
    buffer: Arc<Buffer>,
    format: TextureFormat,
    element_count: u32,
    shadow: Mutex<CpuShadow>,
}

impl TypedBuffer {
    /// Allocates `element_count` elements of `format`.
    ///
    /// Depth formats cannot be used for buffer elements.
    pub fn create(
        device: &dyn GraphicsDevice,
        format: TextureFormat,
        element_count: u32,
        usage: BufferUsage,
    ) -> Result<Arc<Self>, ResourceError> {
        if format.is_depth() {
            return Err(ResourceError::UnsupportedFormat(format!(
                "{format:?} can't be used as a typed buffer element"
            )));
        }
        let size = format.bytes_per_pixel() as u64 * element_count as u64;
        if size == 0 {
            return Err(ResourceError::InvalidSize {
                label: "TypedBuffer".to_owned(),
                size,
            });
        }
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("TypedBuffer")),
            size,
            usage: usage | BufferUsage::COPY_DST,
        })?;
        Ok(Arc::new(Self {
            buffer,
            format,
            element_count,
            shadow: Mutex::new(CpuShadow::new(size as usize)),
        }))
    }

    /// Writes one element. `T` must have the size of one element of the format.
    pub fn set_element<T: bytemuck::Pod>(&self, index: u32, value: &T) -> bool {
        let Some(offset) = self.element_offset::<T>(index) else {
            return false;
        };
        self.shadow
            .lock()
            .unwrap()
            .write(offset, bytemuck::bytes_of(value))
    }

    /// Reads back the CPU copy of one element.
    pub fn element<T: bytemuck::Pod>(&self, index: u32) -> Option<T> {
        let offset = self.element_offset::<T>(index)?;
        let shadow = self.shadow.lock().unwrap();
        shadow
            .read(offset, std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
    }

    fn element_offset<T>(&self, index: u32) -> Option<usize> {
        let element_size = self.format.bytes_per_pixel() as usize;
        if std::mem::size_of::<T>() != element_size {
            log::error!(
                "Typed buffer element is {element_size} bytes ({:?}), the value is {} bytes",
                self.format,
                std::mem::size_of::<T>()
            );
            return None;
        }
        if index >= self.element_count {
            log::warn!(
                "Element {index} is out of range for a typed buffer with {} elements",
                self.element_count
            );
            return None;
        }
        Some(index as usize * element_size)
    }

    /// Records the write of pending CPU changes.
    pub fn upload(&self, recorder: &mut dyn CommandRecorder) {
        self.shadow.lock().unwrap().flush(&self.buffer, recorder);
    }

    /// Returns `true` if the CPU copy has changes not yet uploaded.
    pub fn is_dirty(&self) -> bool {
        self.shadow.lock().unwrap().is_dirty()
    }

    /// The element format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The number of elements.
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// The backing GPU buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::{MockDevice, TestRecorder};

    #[test]
    fn elements_are_format_sized() {
        let device = MockDevice::new();
        let buffer =
            TypedBuffer::create(&device, TextureFormat::Rgba32Float, 4, BufferUsage::SHADER_RESOURCE)
                .unwrap();
        assert_eq!(buffer.buffer().size(), 64);

        assert!(buffer.set_element(1, &[1.0f32, 2.0, 3.0, 4.0]));
        assert_eq!(buffer.element::<[f32; 4]>(1), Some([1.0, 2.0, 3.0, 4.0]));

        assert!(!buffer.set_element(1, &1.0f32));
        assert!(!buffer.set_element(4, &[0.0f32; 4]));
    }

    #[test]
    fn upload_clears_dirty_flag() {
        let device = MockDevice::new();
        let buffer =
            TypedBuffer::create(&device, TextureFormat::R32Uint, 16, BufferUsage::SHADER_RESOURCE)
                .unwrap();
        let mut recorder = TestRecorder::default();

        assert!(buffer.set_element(0, &7u32));
        assert!(buffer.is_dirty());
        buffer.upload(&mut recorder);
        assert!(!buffer.is_dirty());
        assert_eq!(recorder.commands.len(), 1);
    }

    #[test]
    fn depth_formats_are_rejected() {
        let device = MockDevice::new();
        let result =
            TypedBuffer::create(&device, TextureFormat::Depth32Float, 4, BufferUsage::SHADER_RESOURCE);
        assert!(matches!(result, Err(ResourceError::UnsupportedFormat(_))));
    }
}
