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

//! Defines data structures related to GPU buffer resources.

use std::borrow::Cow;

bitflags::bitflags! {
    /// A set of flags describing the allowed usages of a [`Buffer`].
    ///
    /// The backend uses them to place the buffer in the right memory type and to
    /// validate that it is bound the way it was declared.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// The buffer can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The buffer can be used as the destination of a copy operation (CPU uploads).
        const COPY_DST = 1 << 1;
        /// The buffer can be bound as a constant (uniform) buffer.
        const CONSTANT = 1 << 2;
        /// The buffer can be bound through a read-only shader-resource view.
        const SHADER_RESOURCE = 1 << 3;
        /// The buffer can be bound through a read-write (unordered-access) view.
        const UNORDERED_ACCESS = 1 << 4;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 5;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 6;
    }
}

/// A descriptor used to create a [`Buffer`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be used.
    pub usage: BufferUsage,
}

/// An opaque handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// The GPU virtual address of a buffer, as consumed by root descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GpuAddress(pub u64);

impl GpuAddress {
    /// Returns the address `bytes` past this one.
    pub fn offset(self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }
}

/// A GPU buffer allocated by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
///
/// Buffers are shared through `Arc`: the same buffer may be bound by several
/// binding tables at once, and lives as long as its longest-lived holder.
#[derive(Debug)]
pub struct Buffer {
    id: BufferId,
    label: Option<String>,
    size: u64,
    usage: BufferUsage,
    gpu_address: GpuAddress,
}

impl Buffer {
    /// Wraps a backend allocation. Called by device implementations.
    pub fn new(id: BufferId, descriptor: &BufferDescriptor<'_>, gpu_address: GpuAddress) -> Self {
        Self {
            id,
            label: descriptor.label.as_ref().map(|label| label.to_string()),
            size: descriptor.size,
            usage: descriptor.usage,
            gpu_address,
        }
    }

    /// The backend handle of this buffer.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// The debug label given at creation, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The size of the allocation in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The usages the buffer was created with.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The GPU address of the first byte.
    pub fn gpu_address(&self) -> GpuAddress {
        self.gpu_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_keeps_descriptor_fields() {
        let descriptor = BufferDescriptor {
            label: Some(Cow::Borrowed("PerFrameCB")),
            size: 64,
            usage: BufferUsage::CONSTANT | BufferUsage::COPY_DST,
        };
        let buffer = Buffer::new(BufferId(3), &descriptor, GpuAddress(0x1000));

        assert_eq!(buffer.id(), BufferId(3));
        assert_eq!(buffer.label(), Some("PerFrameCB"));
        assert_eq!(buffer.size(), 64);
        assert!(buffer.usage().contains(BufferUsage::CONSTANT));
        assert_eq!(buffer.gpu_address().offset(16), GpuAddress(0x1010));
    }
}
