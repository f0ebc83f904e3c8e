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

//! In-memory device, recorder and shader metadata shared by the unit tests.

use crate::renderer::api::*;
use crate::renderer::binding::{DescriptorKind, RootSignature, RootSignatureDesc, RootSignatureId};
use crate::renderer::error::{ResourceError, RootSignatureError};
use crate::renderer::reflection::{
    InterfaceDecl, ResourceDecl, ResourceDeclKind, ScalarKind, ShaderAccess, ShaderMetadata,
    ShaderType, StructMember, TextureShape, TextureShapeDim,
};
use crate::renderer::traits::{CommandRecorder, GraphicsDevice};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct MockDevice {
    next_id: AtomicUsize,
    next_address: AtomicU64,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            next_address: AtomicU64::new(0x1000),
        }
    }

    fn id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// A 2D texture readable and writable by shaders.
    pub fn texture(&self, layers: u32, mips: u32) -> Arc<Texture> {
        self.texture_with_usage(
            layers,
            mips,
            TextureUsage::SHADER_RESOURCE | TextureUsage::UNORDERED_ACCESS,
        )
    }

    pub fn texture_with_usage(&self, layers: u32, mips: u32, usage: TextureUsage) -> Arc<Texture> {
        self.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed("test texture")),
            size: Extent3D {
                width: 32,
                height: 32,
                depth_or_array_layers: layers,
            },
            mip_level_count: mips,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            usage,
        })
        .unwrap()
    }

    pub fn buffer(&self, size: u64, usage: BufferUsage) -> Arc<Buffer> {
        self.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("test buffer")),
            size,
            usage,
        })
        .unwrap()
    }

    pub fn sampler(&self) -> Arc<Sampler> {
        self.create_sampler(&SamplerDescriptor::default()).unwrap()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<Arc<Buffer>, ResourceError> {
        let address = self.next_address.fetch_add(
            descriptor.size.next_multiple_of(256).max(256),
            Ordering::Relaxed,
        );
        Ok(Arc::new(Buffer::new(
            BufferId(self.id()),
            descriptor,
            GpuAddress(address),
        )))
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<Arc<Texture>, ResourceError> {
        Ok(Arc::new(Texture::new(TextureId(self.id()), descriptor)))
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<Arc<Sampler>, ResourceError> {
        Ok(Arc::new(Sampler::new(SamplerId(self.id()), descriptor)))
    }

    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDesc,
    ) -> Result<Arc<RootSignature>, RootSignatureError> {
        RootSignature::new(RootSignatureId(self.id()), descriptor.clone()).map(Arc::new)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordedCommand {
    SetRootSignature(RootSignatureId),
    WriteBuffer {
        buffer: BufferId,
        offset: u64,
        data: Vec<u8>,
    },
    Barrier {
        resource: ResourceRef,
        state: ResourceState,
    },
    RootDescriptor {
        root_offset: u32,
        kind: DescriptorKind,
        address: GpuAddress,
    },
    DescriptorTable {
        root_offset: u32,
        view: DescriptorView,
    },
}

#[derive(Debug, Default)]
pub(crate) struct TestRecorder {
    pub commands: Vec<RecordedCommand>,
}

impl CommandRecorder for TestRecorder {
    fn set_root_signature(&mut self, root_signature: &RootSignature) {
        self.commands
            .push(RecordedCommand::SetRootSignature(root_signature.id()));
    }

    fn write_buffer(&mut self, buffer: &Buffer, offset: u64, data: &[u8]) {
        self.commands.push(RecordedCommand::WriteBuffer {
            buffer: buffer.id(),
            offset,
            data: data.to_vec(),
        });
    }

    fn resource_barrier(&mut self, resource: ResourceRef, state: ResourceState) {
        self.commands
            .push(RecordedCommand::Barrier { resource, state });
    }

    fn set_root_descriptor(&mut self, root_offset: u32, kind: DescriptorKind, address: GpuAddress) {
        self.commands.push(RecordedCommand::RootDescriptor {
            root_offset,
            kind,
            address,
        });
    }

    fn set_descriptor_table(&mut self, root_offset: u32, view: &DescriptorView) {
        self.commands.push(RecordedCommand::DescriptorTable {
            root_offset,
            view: *view,
        });
    }
}

/// Hand-built shader metadata.
#[derive(Debug, Default)]
pub(crate) struct FakeMetadata {
    pub label: String,
    pub vertex_inputs: Vec<InterfaceDecl>,
    pub fragment_outputs: Vec<InterfaceDecl>,
    pub resources: Vec<ResourceDecl>,
}

impl FakeMetadata {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            ..Default::default()
        }
    }

    pub fn vertex_input(&mut self, name: &str, location: u32, ty: ShaderType) -> &mut Self {
        self.vertex_inputs.push(InterfaceDecl {
            name: name.to_owned(),
            location,
            ty,
        });
        self
    }

    pub fn fragment_output(&mut self, name: &str, location: u32, ty: ShaderType) -> &mut Self {
        self.fragment_outputs.push(InterfaceDecl {
            name: name.to_owned(),
            location,
            ty,
        });
        self
    }

    pub fn resource(
        &mut self,
        name: &str,
        register_index: u32,
        register_space: u32,
        kind: ResourceDeclKind,
    ) -> &mut Self {
        self.resources.push(ResourceDecl {
            name: name.to_owned(),
            register_index,
            register_space,
            array_size: 0,
            stages: ShaderStageFlags::VERTEX_FRAGMENT,
            kind,
        });
        self
    }

    pub fn uniform_buffer(&mut self, name: &str, index: u32, ty: ShaderType, size: u32) -> &mut Self {
        self.resource(name, index, 0, ResourceDeclKind::UniformBuffer { ty, size })
    }

    pub fn storage_buffer(
        &mut self,
        name: &str,
        index: u32,
        ty: ShaderType,
        access: ShaderAccess,
    ) -> &mut Self {
        self.resource(
            name,
            index,
            0,
            ResourceDeclKind::StorageBuffer {
                ty,
                size: 256,
                access,
            },
        )
    }

    pub fn texture(
        &mut self,
        name: &str,
        index: u32,
        shape: TextureShape,
        access: ShaderAccess,
    ) -> &mut Self {
        self.resource(
            name,
            index,
            0,
            ResourceDeclKind::Texture {
                shape,
                sample: ScalarKind::Float,
                access,
            },
        )
    }

    pub fn sampler(&mut self, name: &str, index: u32) -> &mut Self {
        self.resource(name, index, 0, ResourceDeclKind::Sampler { comparison: false })
    }
}

impl ShaderMetadata for FakeMetadata {
    fn label(&self) -> &str {
        &self.label
    }

    fn vertex_inputs(&self) -> Vec<InterfaceDecl> {
        self.vertex_inputs.clone()
    }

    fn fragment_outputs(&self) -> Vec<InterfaceDecl> {
        self.fragment_outputs.clone()
    }

    fn resources(&self) -> Vec<ResourceDecl> {
        self.resources.clone()
    }
}

pub(crate) fn f32_type() -> ShaderType {
    ShaderType::Scalar {
        kind: ScalarKind::Float,
        width: 4,
    }
}

pub(crate) fn vec_type(size: u8) -> ShaderType {
    ShaderType::Vector {
        size,
        kind: ScalarKind::Float,
        width: 4,
    }
}

pub(crate) fn texture_2d(arrayed: bool) -> TextureShape {
    TextureShape {
        dim: TextureShapeDim::D2,
        arrayed,
        multisampled: false,
    }
}

/// One 64-byte constant buffer, one 2D texture and one sampler, all at register 0.
pub(crate) fn scenario_metadata() -> FakeMetadata {
    let mut metadata = FakeMetadata::new("scenario");
    metadata
        .uniform_buffer(
            "PerFrameCB",
            0,
            ShaderType::Struct {
                members: vec![StructMember {
                    name: "viewProj".to_owned(),
                    offset: 0,
                    ty: ShaderType::Matrix {
                        columns: 4,
                        rows: 4,
                        width: 4,
                    },
                }],
            },
            64,
        )
        .texture("gAlbedo", 0, texture_2d(false), ShaderAccess::Read)
        .sampler("gSampler", 0);
    metadata
}
