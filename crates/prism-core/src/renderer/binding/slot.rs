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

//! Binding-slot records held by [`ProgramVars`](super::ProgramVars).

use crate::renderer::api::{
    Buffer, ConstantBuffer, DescriptorView, ResourceRef, Sampler, StructuredBuffer, Texture,
    TextureSubresource, TypedBuffer, ViewTarget,
};
use crate::renderer::binding::DescriptorKind;
use crate::renderer::reflection::{ResourceType, ShaderAccess};
use std::sync::Arc;

/// An object bound to a shader-resource or unordered-access slot.
#[derive(Debug, Clone)]
pub enum BoundResource {
    /// A plain buffer viewed as raw or structured memory.
    Buffer(Arc<Buffer>),
    /// A typed buffer. Its CPU copy is uploaded before binding.
    TypedBuffer(Arc<TypedBuffer>),
    /// A texture.
    Texture(Arc<Texture>),
}

impl BoundResource {
    /// The GPU object barriers apply to.
    pub fn resource_ref(&self) -> ResourceRef {
        match self {
            BoundResource::Buffer(buffer) => ResourceRef::Buffer(buffer.id()),
            BoundResource::TypedBuffer(buffer) => ResourceRef::Buffer(buffer.buffer().id()),
            BoundResource::Texture(texture) => ResourceRef::Texture(texture.id()),
        }
    }

    /// The view written into the descriptor table.
    pub fn view(&self, kind: DescriptorKind, range: TextureSubresource) -> DescriptorView {
        let target = match self {
            BoundResource::Buffer(buffer) => ViewTarget::Buffer {
                id: buffer.id(),
                address: buffer.gpu_address(),
                size: buffer.size(),
            },
            BoundResource::TypedBuffer(buffer) => ViewTarget::TypedBuffer {
                id: buffer.buffer().id(),
                format: buffer.format(),
                element_count: buffer.element_count(),
            },
            BoundResource::Texture(texture) => ViewTarget::Texture {
                id: texture.id(),
                range,
            },
        };
        DescriptorView { kind, target }
    }

    /// The bound texture, if this is one.
    pub fn as_texture(&self) -> Option<&Arc<Texture>> {
        match self {
            BoundResource::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConstantBufferSlot {
    pub name: String,
    pub buffer: Option<Arc<ConstantBuffer>>,
    pub required_size: usize,
    pub root_offset: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct StructuredBufferSlot {
    pub name: String,
    pub buffer: Option<Arc<StructuredBuffer>>,
    pub access: ShaderAccess,
    pub required_size: usize,
    pub root_offset: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ViewSlot {
    pub name: String,
    pub ty: ResourceType,
    pub resource: Option<BoundResource>,
    /// Resolved against the bound texture; `FULL` for buffers and empty slots.
    pub range: TextureSubresource,
    pub root_offset: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct SamplerSlot {
    pub name: String,
    pub sampler: Option<Arc<Sampler>>,
    pub root_offset: u32,
}
