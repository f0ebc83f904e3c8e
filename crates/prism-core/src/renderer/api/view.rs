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

//! Descriptor views, texture subresource ranges and resource states.
//!
//! A [`DescriptorView`] is what a command recorder writes into a descriptor table.
//! Unbound slots are filled with the process-wide placeholders returned by [`null_view`].

use crate::renderer::api::{BufferId, GpuAddress, SamplerId, Texture, TextureFormat, TextureId};
use crate::renderer::binding::DescriptorKind;
use once_cell::sync::Lazy;

/// A range of mips and array slices of a texture, as seen by a shader.
///
/// `mip_count` and `array_size` accept [`TextureSubresource::MAX_POSSIBLE`], meaning
/// "every remaining level/slice from the first one". The sentinel is resolved against
/// the bound texture with [`TextureSubresource::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSubresource {
    /// The first (most detailed) mip level visible to the shader.
    pub most_detailed_mip: u32,
    /// The number of mip levels visible to the shader.
    pub mip_count: u32,
    /// The first array slice visible to the shader.
    pub first_array_slice: u32,
    /// The number of array slices visible to the shader.
    pub array_size: u32,
}

impl TextureSubresource {
    /// Sentinel for "up to the end of the resource".
    pub const MAX_POSSIBLE: u32 = u32::MAX;

    /// The whole texture.
    pub const FULL: Self = Self {
        most_detailed_mip: 0,
        mip_count: Self::MAX_POSSIBLE,
        first_array_slice: 0,
        array_size: Self::MAX_POSSIBLE,
    };

    /// Creates a range from its four components.
    pub const fn new(
        most_detailed_mip: u32,
        mip_count: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> Self {
        Self {
            most_detailed_mip,
            mip_count,
            first_array_slice,
            array_size,
        }
    }

    /// A single mip level across a slice range, as used by read-write views.
    pub const fn single_mip(mip_level: u32, first_array_slice: u32, array_size: u32) -> Self {
        Self::new(mip_level, 1, first_array_slice, array_size)
    }

    /// Replaces the `MAX_POSSIBLE` sentinels with the extent of `texture`.
    ///
    /// # Panics
    ///
    /// Panics if the resolved range does not fit inside the texture. An inconsistent
    /// range is a bug in the caller, not a recoverable binding mistake.
    pub fn resolve(&self, texture: &Texture) -> Self {
        let total_slices = texture.array_size();
        let total_mips = texture.mip_count();

        assert!(
            self.first_array_slice < total_slices,
            "first array slice {} is out of range for a texture with {} slices",
            self.first_array_slice,
            total_slices
        );
        assert!(
            self.most_detailed_mip < total_mips,
            "mip level {} is out of range for a texture with {} mips",
            self.most_detailed_mip,
            total_mips
        );

        let array_size = if self.array_size == Self::MAX_POSSIBLE {
            total_slices - self.first_array_slice
        } else {
            self.array_size
        };
        let mip_count = if self.mip_count == Self::MAX_POSSIBLE {
            total_mips - self.most_detailed_mip
        } else {
            self.mip_count
        };

        assert!(
            self.first_array_slice as u64 + array_size as u64 <= total_slices as u64,
            "slices {}..{} exceed the {} slices of the texture",
            self.first_array_slice,
            self.first_array_slice as u64 + array_size as u64,
            total_slices
        );
        assert!(
            self.most_detailed_mip as u64 + mip_count as u64 <= total_mips as u64,
            "mips {}..{} exceed the {} mips of the texture",
            self.most_detailed_mip,
            self.most_detailed_mip as u64 + mip_count as u64,
            total_mips
        );

        Self {
            most_detailed_mip: self.most_detailed_mip,
            mip_count,
            first_array_slice: self.first_array_slice,
            array_size,
        }
    }
}

impl Default for TextureSubresource {
    fn default() -> Self {
        Self::FULL
    }
}

/// What a descriptor view points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    /// The null placeholder. Reads return zero, writes are discarded.
    Null,
    /// A range of a texture.
    Texture {
        /// The viewed texture.
        id: TextureId,
        /// The resolved subresource range.
        range: TextureSubresource,
    },
    /// A whole buffer viewed as raw or structured memory.
    Buffer {
        /// The viewed buffer.
        id: BufferId,
        /// The GPU address of the first byte.
        address: GpuAddress,
        /// The size of the view in bytes.
        size: u64,
    },
    /// A buffer viewed as an array of formatted elements.
    TypedBuffer {
        /// The backing buffer.
        id: BufferId,
        /// The element format.
        format: TextureFormat,
        /// The number of elements.
        element_count: u32,
    },
    /// A sampler.
    Sampler(SamplerId),
}

/// A descriptor written into a descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorView {
    /// The descriptor category the view is created for.
    pub kind: DescriptorKind,
    /// The viewed object.
    pub target: ViewTarget,
}

impl DescriptorView {
    /// A view of the given category pointing at nothing.
    pub const fn null(kind: DescriptorKind) -> Self {
        Self {
            kind,
            target: ViewTarget::Null,
        }
    }

    /// A sampler descriptor.
    pub const fn sampler(id: SamplerId) -> Self {
        Self {
            kind: DescriptorKind::Sampler,
            target: ViewTarget::Sampler(id),
        }
    }

    /// Returns `true` for null placeholders.
    pub fn is_null(&self) -> bool {
        matches!(self.target, ViewTarget::Null)
    }
}

static NULL_CBV: Lazy<DescriptorView> = Lazy::new(|| create_null_view(DescriptorKind::Cbv));
static NULL_SRV: Lazy<DescriptorView> = Lazy::new(|| create_null_view(DescriptorKind::Srv));
static NULL_UAV: Lazy<DescriptorView> = Lazy::new(|| create_null_view(DescriptorKind::Uav));
static NULL_SAMPLER: Lazy<DescriptorView> =
    Lazy::new(|| create_null_view(DescriptorKind::Sampler));

fn create_null_view(kind: DescriptorKind) -> DescriptorView {
    log::debug!("Creating the null {kind:?} placeholder view");
    DescriptorView::null(kind)
}

/// Returns the shared placeholder bound to empty slots of the given category.
///
/// Placeholders are created on first use and live for the rest of the process.
pub fn null_view(kind: DescriptorKind) -> &'static DescriptorView {
    match kind {
        DescriptorKind::Cbv => &NULL_CBV,
        DescriptorKind::Srv => &NULL_SRV,
        DescriptorKind::Uav => &NULL_UAV,
        DescriptorKind::Sampler => &NULL_SAMPLER,
    }
}

/// A GPU object a barrier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// A buffer.
    Buffer(BufferId),
    /// A texture.
    Texture(TextureId),
}

/// The usage state a resource must be in before the GPU accesses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// The state resources are created in.
    Common,
    /// Destination of a CPU upload.
    CopyDest,
    /// Bound as a constant buffer.
    ConstantBuffer,
    /// Read through a shader-resource view.
    ShaderResource,
    /// Read and written through an unordered-access view.
    UnorderedAccess,
}
