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

use prism_core::renderer::{
    Buffer, BufferDescriptor, BufferId, GpuAddress, GraphicsDevice, ResourceError, RootSignature,
    RootSignatureDesc, RootSignatureError, RootSignatureId, Sampler, SamplerDescriptor,
    SamplerId, Texture, TextureDescriptor, TextureId,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// The alignment of every buffer address, matching constant buffer placement rules.
pub const BUFFER_ADDRESS_ALIGNMENT: u64 = 256;

/// First address handed out. Address zero stays the null address.
const BASE_ADDRESS: u64 = 0x1_0000;

/// A [`GraphicsDevice`] that only allocates handles.
#[derive(Debug)]
pub struct HeadlessDevice {
    next_buffer_id: AtomicUsize,
    next_texture_id: AtomicUsize,
    next_sampler_id: AtomicUsize,
    next_root_signature_id: AtomicUsize,
    next_address: AtomicU64,
    allocated_bytes: AtomicU64,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Creates a device with no allocation.
    pub fn new() -> Self {
        Self {
            next_buffer_id: AtomicUsize::new(0),
            next_texture_id: AtomicUsize::new(0),
            next_sampler_id: AtomicUsize::new(0),
            next_root_signature_id: AtomicUsize::new(0),
            next_address: AtomicU64::new(BASE_ADDRESS),
            allocated_bytes: AtomicU64::new(0),
        }
    }

    /// The total size of the buffers created so far.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<Arc<Buffer>, ResourceError> {
        let label = descriptor.label.as_deref().unwrap_or_default();
        if descriptor.size == 0 {
            return Err(ResourceError::InvalidSize {
                label: label.to_owned(),
                size: 0,
            });
        }
        let span = descriptor
            .size
            .checked_next_multiple_of(BUFFER_ADDRESS_ALIGNMENT)
            .ok_or_else(|| ResourceError::InvalidSize {
                label: label.to_owned(),
                size: descriptor.size,
            })?;

        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        let address = GpuAddress(self.next_address.fetch_add(span, Ordering::Relaxed));
        self.allocated_bytes
            .fetch_add(descriptor.size, Ordering::Relaxed);

        log::debug!(
            "HeadlessDevice: Created buffer '{}' with ID: {:?}, size: {} bytes, address: {:#x}",
            label,
            id,
            descriptor.size,
            address.0
        );
        Ok(Arc::new(Buffer::new(id, descriptor, address)))
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, ResourceError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 || size.depth_or_array_layers == 0 {
            return Err(ResourceError::BackendError(format!(
                "Texture '{}' has an empty extent {}x{}x{}",
                descriptor.label.as_deref().unwrap_or_default(),
                size.width,
                size.height,
                size.depth_or_array_layers
            )));
        }
        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        log::debug!("HeadlessDevice: Created texture {:?} with ID: {:?}", descriptor.label, id);
        Ok(Arc::new(Texture::new(id, descriptor)))
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<Sampler>, ResourceError> {
        let id = SamplerId(self.next_sampler_id.fetch_add(1, Ordering::Relaxed));
        Ok(Arc::new(Sampler::new(id, descriptor)))
    }

    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDesc,
    ) -> Result<Arc<RootSignature>, RootSignatureError> {
        let id = RootSignatureId(self.next_root_signature_id.fetch_add(1, Ordering::Relaxed));
        let root_signature = RootSignature::new(id, descriptor.clone())?;
        log::debug!(
            "HeadlessDevice: Created root signature {:?} with {} parameters",
            id,
            descriptor.parameter_count()
        );
        Ok(Arc::new(root_signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::BufferUsage;
    use std::borrow::Cow;

    fn buffer_desc(size: u64) -> BufferDescriptor<'static> {
        BufferDescriptor {
            label: Some(Cow::Borrowed("test")),
            size,
            usage: BufferUsage::CONSTANT,
        }
    }

    #[test]
    fn addresses_are_aligned_and_distinct() {
        let device = HeadlessDevice::new();
        let a = device.create_buffer(&buffer_desc(4)).unwrap();
        let b = device.create_buffer(&buffer_desc(300)).unwrap();
        let c = device.create_buffer(&buffer_desc(16)).unwrap();

        assert_ne!(a.id(), b.id());
        for buffer in [&a, &b, &c] {
            assert_eq!(buffer.gpu_address().0 % BUFFER_ADDRESS_ALIGNMENT, 0);
            assert_ne!(buffer.gpu_address(), GpuAddress::default());
        }
        assert_eq!(b.gpu_address().0 - a.gpu_address().0, 256);
        assert_eq!(c.gpu_address().0 - b.gpu_address().0, 512);
        assert_eq!(device.allocated_bytes(), 320);
    }

    #[test]
    fn empty_buffers_are_rejected() {
        let device = HeadlessDevice::new();
        assert!(matches!(
            device.create_buffer(&buffer_desc(0)),
            Err(ResourceError::InvalidSize { size: 0, .. })
        ));
    }
}
