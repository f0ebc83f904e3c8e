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

//! Root signature (pipeline layout) descriptions.

use crate::renderer::api::ShaderStageFlags;
use crate::renderer::error::RootSignatureError;
use crate::renderer::reflection::{BindLocation, BufferType, ProgramReflection, ShaderAccess};
use serde::{Deserialize, Serialize};

/// The category of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DescriptorKind {
    /// Constant buffer view.
    Cbv,
    /// Shader-resource (read-only) view.
    Srv,
    /// Unordered-access (read-write) view.
    Uav,
    /// Sampler.
    Sampler,
}

/// A descriptor set directly in the root signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDescriptor {
    /// The descriptor category. Samplers can't be root descriptors.
    pub kind: DescriptorKind,
    /// The shader register.
    pub register_index: u32,
    /// The shader register space.
    pub register_space: u32,
    /// The stages that see the descriptor.
    pub visibility: ShaderStageFlags,
}

/// A range of consecutive registers of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorRange {
    /// The descriptor category.
    pub kind: DescriptorKind,
    /// The first register of the range.
    pub base_register: u32,
    /// The register space.
    pub register_space: u32,
    /// The number of registers.
    pub count: u32,
}

/// A descriptor table parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorTable {
    /// The ranges of the table. Binding tables require exactly one.
    pub ranges: Vec<DescriptorRange>,
    /// The stages that see the table.
    pub visibility: ShaderStageFlags,
}

/// A root signature description.
///
/// Root parameter offsets number the root descriptors first, in order, then the
/// descriptor tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSignatureDesc {
    /// The root descriptors.
    pub root_descriptors: Vec<RootDescriptor>,
    /// The descriptor tables.
    pub descriptor_tables: Vec<DescriptorTable>,
}

impl RootSignatureDesc {
    /// An empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a root descriptor.
    pub fn add_root_descriptor(
        &mut self,
        kind: DescriptorKind,
        location: BindLocation,
        visibility: ShaderStageFlags,
    ) -> &mut Self {
        self.root_descriptors.push(RootDescriptor {
            kind,
            register_index: location.index,
            register_space: location.space,
            visibility,
        });
        self
    }

    /// Appends a descriptor table with a single range.
    pub fn add_descriptor_table(
        &mut self,
        kind: DescriptorKind,
        location: BindLocation,
        count: u32,
        visibility: ShaderStageFlags,
    ) -> &mut Self {
        self.descriptor_tables.push(DescriptorTable {
            ranges: vec![DescriptorRange {
                kind,
                base_register: location.index,
                register_space: location.space,
                count,
            }],
            visibility,
        });
        self
    }

    /// The default layout of a program.
    ///
    /// Constant buffers become root CBVs and structured buffers root SRVs or UAVs.
    /// Standalone resources each get a single-range table: SRVs, then UAVs, then
    /// samplers. Each group is ordered by (space, register).
    pub fn from_reflection(reflection: &ProgramReflection) -> Self {
        let mut desc = Self::new();

        for (location, buffer) in reflection.buffer_map(BufferType::Constant) {
            desc.add_root_descriptor(DescriptorKind::Cbv, *location, buffer.shader_mask());
        }
        for (location, buffer) in reflection.buffer_map(BufferType::Structured) {
            let kind = match buffer.access() {
                ShaderAccess::Read => DescriptorKind::Srv,
                ShaderAccess::ReadWrite => DescriptorKind::Uav,
            };
            desc.add_root_descriptor(kind, *location, buffer.shader_mask());
        }

        let mut resources: Vec<_> = reflection.resources().values().collect();
        resources.sort_by_key(|resource| (resource.category(), resource.location()));
        for resource in resources {
            desc.add_descriptor_table(
                resource.category(),
                resource.location(),
                resource.register_count(),
                resource.shader_mask,
            );
        }
        desc
    }

    /// The total number of root parameters.
    pub fn parameter_count(&self) -> usize {
        self.root_descriptors.len() + self.descriptor_tables.len()
    }
}

/// An opaque handle to a root signature created by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootSignatureId(pub usize);

/// A validated root signature.
#[derive(Debug)]
pub struct RootSignature {
    id: RootSignatureId,
    desc: RootSignatureDesc,
}

impl RootSignature {
    /// Validates `desc`: every table must have exactly one non-empty range.
    pub fn new(id: RootSignatureId, desc: RootSignatureDesc) -> Result<Self, RootSignatureError> {
        for (table, entry) in desc.descriptor_tables.iter().enumerate() {
            match entry.ranges.as_slice() {
                [range] if range.count == 0 => {
                    return Err(RootSignatureError::EmptyRange { table });
                }
                [_] => {}
                ranges => {
                    return Err(RootSignatureError::InvalidTable {
                        table,
                        ranges: ranges.len(),
                    });
                }
            }
        }
        Ok(Self { id, desc })
    }

    /// The backend handle.
    pub fn id(&self) -> RootSignatureId {
        self.id
    }

    /// The description the signature was created from.
    pub fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }
}
