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

//! Reflection of textures, samplers and buffer views.

use crate::renderer::api::ShaderStageFlags;
use crate::renderer::binding::DescriptorKind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The register coordinate of a declaration.
///
/// Locations order by space first, then by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BindLocation {
    /// The register index inside the space.
    pub index: u32,
    /// The register space.
    pub space: u32,
}

impl BindLocation {
    /// Creates a location.
    pub const fn new(index: u32, space: u32) -> Self {
        Self { index, space }
    }

    /// The location `count` registers further in the same space.
    pub const fn offset(self, count: u32) -> Self {
        Self {
            index: self.index + count,
            space: self.space,
        }
    }
}

impl From<u32> for BindLocation {
    /// A register index in space 0.
    fn from(index: u32) -> Self {
        Self { index, space: 0 }
    }
}

impl Ord for BindLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.space, self.index).cmp(&(other.space, other.index))
    }
}

impl PartialOrd for BindLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BindLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "register {} space {}", self.index, self.space)
    }
}

/// The kind of object a resource declaration binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// A texture.
    Texture,
    /// A buffer of 32-bit words.
    RawBuffer,
    /// A buffer of formatted elements.
    TypedBuffer,
    /// A buffer of structures.
    StructuredBuffer,
    /// A sampler.
    Sampler,
}

/// Whether the shader only reads a resource or also writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShaderAccess {
    /// Bound through a shader-resource view.
    #[default]
    Read,
    /// Bound through an unordered-access view.
    ReadWrite,
}

/// The dimensions of a resource.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dimensions {
    #[default]
    Unknown,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Texture1DArray,
    Texture2DArray,
    Texture2DMS,
    Texture2DMSArray,
    TextureCubeArray,
    Buffer,
}

/// The type of the values a shader reads from a resource.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnType {
    #[default]
    Unknown,
    Float,
    Double,
    Int,
    Uint,
}

/// The combination of [`ResourceType`] and [`ShaderAccess`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    TextureRead,
    TextureReadWrite,
    RawBufferRead,
    RawBufferReadWrite,
    TypedBufferRead,
    TypedBufferReadWrite,
    StructuredBufferRead,
    StructuredBufferReadWrite,
    Sampler,
}

/// A standalone resource declaration (texture, buffer view or sampler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// The kind of object bound.
    pub ty: ResourceType,
    /// Whether the shader writes the resource.
    pub access: ShaderAccess,
    /// The dimensions of the resource.
    pub dims: Dimensions,
    /// The type of values read from the resource.
    pub return_type: ReturnType,
    /// The register index.
    pub register_index: u32,
    /// The register space.
    pub register_space: u32,
    /// The number of elements of a resource array, `0` for a single resource.
    pub array_size: u32,
    /// The stages that use the resource.
    pub shader_mask: ShaderStageFlags,
}

impl Resource {
    /// A sampler declaration.
    pub fn sampler(register_index: u32, register_space: u32, shader_mask: ShaderStageFlags) -> Self {
        Self {
            ty: ResourceType::Sampler,
            access: ShaderAccess::Read,
            dims: Dimensions::Unknown,
            return_type: ReturnType::Unknown,
            register_index,
            register_space,
            array_size: 0,
            shader_mask,
        }
    }

    /// The register coordinate.
    pub fn location(&self) -> BindLocation {
        BindLocation::new(self.register_index, self.register_space)
    }

    /// The combined kind.
    pub fn kind(&self) -> ResourceKind {
        use ResourceKind::*;
        match (self.ty, self.access) {
            (ResourceType::Texture, ShaderAccess::Read) => TextureRead,
            (ResourceType::Texture, ShaderAccess::ReadWrite) => TextureReadWrite,
            (ResourceType::RawBuffer, ShaderAccess::Read) => RawBufferRead,
            (ResourceType::RawBuffer, ShaderAccess::ReadWrite) => RawBufferReadWrite,
            (ResourceType::TypedBuffer, ShaderAccess::Read) => TypedBufferRead,
            (ResourceType::TypedBuffer, ShaderAccess::ReadWrite) => TypedBufferReadWrite,
            (ResourceType::StructuredBuffer, ShaderAccess::Read) => StructuredBufferRead,
            (ResourceType::StructuredBuffer, ShaderAccess::ReadWrite) => {
                StructuredBufferReadWrite
            }
            (ResourceType::Sampler, _) => Sampler,
        }
    }

    /// The descriptor category the resource is bound through.
    pub fn category(&self) -> DescriptorKind {
        match (self.ty, self.access) {
            (ResourceType::Sampler, _) => DescriptorKind::Sampler,
            (_, ShaderAccess::Read) => DescriptorKind::Srv,
            (_, ShaderAccess::ReadWrite) => DescriptorKind::Uav,
        }
    }

    /// The number of consecutive registers the declaration occupies.
    pub fn register_count(&self) -> u32 {
        self.array_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_order_by_space_then_index() {
        let mut locations = vec![
            BindLocation::new(0, 1),
            BindLocation::new(3, 0),
            BindLocation::new(1, 0),
        ];
        locations.sort();
        assert_eq!(
            locations,
            vec![
                BindLocation::new(1, 0),
                BindLocation::new(3, 0),
                BindLocation::new(0, 1)
            ]
        );
        assert_eq!(BindLocation::from(5), BindLocation::new(5, 0));
    }

    #[test]
    fn category_follows_access() {
        let mut texture = Resource {
            ty: ResourceType::Texture,
            access: ShaderAccess::Read,
            dims: Dimensions::Texture2D,
            return_type: ReturnType::Float,
            register_index: 0,
            register_space: 0,
            array_size: 0,
            shader_mask: ShaderStageFlags::FRAGMENT,
        };
        assert_eq!(texture.kind(), ResourceKind::TextureRead);
        assert_eq!(texture.category(), DescriptorKind::Srv);

        texture.access = ShaderAccess::ReadWrite;
        assert_eq!(texture.kind(), ResourceKind::TextureReadWrite);
        assert_eq!(texture.category(), DescriptorKind::Uav);

        let sampler = Resource::sampler(0, 0, ShaderStageFlags::FRAGMENT);
        assert_eq!(sampler.kind(), ResourceKind::Sampler);
        assert_eq!(sampler.category(), DescriptorKind::Sampler);
        assert_eq!(sampler.dims, Dimensions::Unknown);
    }
}
