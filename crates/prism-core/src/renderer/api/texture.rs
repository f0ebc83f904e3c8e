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

//! Defines data structures related to GPU texture and sampler resources.

use crate::renderer::TextureFormat;
use bitflags::bitflags;
use std::borrow::Cow;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture.
    D2,
    /// A three-dimensional (volumetric) texture.
    D3,
}

/// The size of a texture. For 1D and 2D textures the third component is the array size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth of a 3D texture, or number of array layers otherwise.
    pub depth_or_array_layers: u32,
}

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
    /// Coordinates outside the range are given a fixed border color.
    ClampToBorder,
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling. Returns the value of the nearest texel.
    Nearest,
    /// Linear interpolation between the nearest texels.
    Linear,
}

/// A comparison function used by comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the existing value.
    Less,
    /// Passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// Passes if the new value is greater than the existing value.
    Greater,
    /// Always passes.
    Always,
}

bitflags! {
    /// A set of flags describing the allowed usages of a [`Texture`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 0;
        /// The texture can be bound through a read-only shader-resource view.
        const SHADER_RESOURCE = 1 << 1;
        /// The texture can be bound through a read-write (unordered-access) view.
        const UNORDERED_ACCESS = 1 << 2;
        /// The texture can be used as a render target.
        const RENDER_TARGET = 1 << 3;
    }
}

/// A descriptor used to create a [`Texture`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions (width, height, depth/layers) of the texture.
    pub size: Extent3D,
    /// The number of mipmap levels for the texture.
    pub mip_level_count: u32,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The format of the texels in the texture.
    pub format: TextureFormat,
    /// A bitmask of [`TextureUsage`] flags describing how the texture will be used.
    pub usage: TextureUsage,
}

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// A GPU texture allocated by a device, shared through `Arc` between binding tables.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    label: Option<String>,
    size: Extent3D,
    mip_level_count: u32,
    dimension: TextureDimension,
    format: TextureFormat,
    usage: TextureUsage,
}

impl Texture {
    /// Wraps a backend allocation. Called by device implementations.
    pub fn new(id: TextureId, descriptor: &TextureDescriptor<'_>) -> Self {
        Self {
            id,
            label: descriptor.label.as_ref().map(|label| label.to_string()),
            size: descriptor.size,
            mip_level_count: descriptor.mip_level_count.max(1),
            dimension: descriptor.dimension,
            format: descriptor.format,
            usage: descriptor.usage,
        }
    }

    /// The backend handle of this texture.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// The debug label given at creation, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The full extent of mip level 0.
    pub fn size(&self) -> Extent3D {
        self.size
    }

    /// The dimensionality of the texture.
    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    /// The texel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The usages the texture was created with.
    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    /// The number of array slices. Volume textures have a single slice.
    pub fn array_size(&self) -> u32 {
        match self.dimension {
            TextureDimension::D3 => 1,
            TextureDimension::D1 | TextureDimension::D2 => self.size.depth_or_array_layers.max(1),
        }
    }

    /// The number of mip levels.
    pub fn mip_count(&self) -> u32 {
        self.mip_level_count
    }
}

/// A descriptor used to create a [`Sampler`].
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The address mode for the U texture coordinate.
    pub address_mode_u: AddressMode,
    /// The address mode for the V texture coordinate.
    pub address_mode_v: AddressMode,
    /// The address mode for the W texture coordinate.
    pub address_mode_w: AddressMode,
    /// The filter mode for magnification.
    pub mag_filter: FilterMode,
    /// The filter mode for minification.
    pub min_filter: FilterMode,
    /// The filter mode between mipmap levels.
    pub mipmap_filter: FilterMode,
    /// If `Some`, creates a comparison sampler for tasks like shadow mapping.
    pub compare: Option<CompareFunction>,
    /// The maximum anisotropy level to use.
    pub anisotropy_clamp: u16,
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter: FilterMode::Nearest,
            compare: None,
            anisotropy_clamp: 1,
        }
    }
}

/// An opaque handle to a GPU sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

/// Sampler state created by a device.
#[derive(Debug)]
pub struct Sampler {
    id: SamplerId,
    label: Option<String>,
    mag_filter: FilterMode,
    min_filter: FilterMode,
    mipmap_filter: FilterMode,
    compare: Option<CompareFunction>,
}

impl Sampler {
    /// Wraps a backend allocation. Called by device implementations.
    pub fn new(id: SamplerId, descriptor: &SamplerDescriptor<'_>) -> Self {
        Self {
            id,
            label: descriptor.label.as_ref().map(|label| label.to_string()),
            mag_filter: descriptor.mag_filter,
            min_filter: descriptor.min_filter,
            mipmap_filter: descriptor.mipmap_filter,
            compare: descriptor.compare,
        }
    }

    /// The backend handle of this sampler.
    pub fn id(&self) -> SamplerId {
        self.id
    }

    /// The debug label given at creation, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns `true` if every filter is linear (trilinear filtering).
    pub fn is_trilinear(&self) -> bool {
        self.mag_filter == FilterMode::Linear
            && self.min_filter == FilterMode::Linear
            && self.mipmap_filter == FilterMode::Linear
    }

    /// The comparison function of a comparison sampler.
    pub fn compare(&self) -> Option<CompareFunction> {
        self.compare
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(dimension: TextureDimension, layers: u32, mips: u32) -> TextureDescriptor<'static> {
        TextureDescriptor {
            label: None,
            size: Extent3D {
                width: 64,
                height: 64,
                depth_or_array_layers: layers,
            },
            mip_level_count: mips,
            dimension,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::SHADER_RESOURCE,
        }
    }

    #[test]
    fn array_size_follows_dimension() {
        let array = Texture::new(TextureId(1), &descriptor(TextureDimension::D2, 4, 5));
        assert_eq!(array.array_size(), 4);
        assert_eq!(array.mip_count(), 5);

        let volume = Texture::new(TextureId(2), &descriptor(TextureDimension::D3, 16, 1));
        assert_eq!(volume.array_size(), 1);
    }

    #[test]
    fn zero_mip_count_is_clamped_to_one() {
        let texture = Texture::new(TextureId(1), &descriptor(TextureDimension::D2, 1, 0));
        assert_eq!(texture.mip_count(), 1);
    }

    #[test]
    fn trilinear_sampler() {
        let sampler = Sampler::new(
            SamplerId(0),
            &SamplerDescriptor {
                mag_filter: FilterMode::Linear,
                min_filter: FilterMode::Linear,
                mipmap_filter: FilterMode::Linear,
                ..Default::default()
            },
        );
        assert!(sampler.is_trilinear());
        assert!(sampler.compare().is_none());
    }
}
