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

//! The per-program resource binding table.

use super::resolver::find_root_offset;
use super::slot::{
    BoundResource, ConstantBufferSlot, SamplerSlot, StructuredBufferSlot, ViewSlot,
};
use super::{DescriptorKind, RootSignature, RootSignatureDesc};
use crate::renderer::api::{
    null_view, Buffer, BufferUsage, ConstantBuffer, DescriptorView, GpuAddress, ResourceRef,
    ResourceState, Sampler, StructuredBuffer, Texture, TextureSubresource, TextureUsage,
    TypedBuffer, ViewTarget,
};
use crate::renderer::error::BindingError;
use crate::renderer::reflection::{
    BindLocation, BufferType, ProgramReflection, Resource, ResourceType, ShaderAccess,
};
use crate::renderer::settings::BindingSettings;
use crate::renderer::traits::{CommandRecorder, GraphicsDevice};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The objects bound to every slot a program declares.
///
/// The set of slots is fixed at creation and matches the reflection exactly: setters only
/// replace what is bound to an existing slot. A rejected setter logs the reason, returns
/// `false` and leaves every binding untouched.
///
/// A `ProgramVars` is meant to be mutated from one thread. Several instances can share
/// the same [`ProgramReflection`] across threads.
#[derive(Debug)]
pub struct ProgramVars {
    reflection: Arc<ProgramReflection>,
    root_signature: Arc<RootSignature>,
    settings: BindingSettings,
    constant_buffers: BTreeMap<BindLocation, ConstantBufferSlot>,
    structured_buffers: BTreeMap<BindLocation, StructuredBufferSlot>,
    srvs: BTreeMap<BindLocation, ViewSlot>,
    uavs: BTreeMap<BindLocation, ViewSlot>,
    samplers: BTreeMap<BindLocation, SamplerSlot>,
}

impl ProgramVars {
    /// Creates a binding table with the default [`BindingSettings`].
    ///
    /// When `root_signature` is `None`, the default layout of the reflection is created on
    /// `device`. When `allocate_buffers` is set, every constant and structured buffer
    /// gets a backing buffer sized by its reflection.
    pub fn create(
        device: &dyn GraphicsDevice,
        reflection: Arc<ProgramReflection>,
        allocate_buffers: bool,
        root_signature: Option<Arc<RootSignature>>,
    ) -> Result<Self, BindingError> {
        Self::create_with_settings(
            device,
            reflection,
            allocate_buffers,
            root_signature,
            BindingSettings::default(),
        )
    }

    /// Creates a binding table.
    ///
    /// Fails with [`BindingError::UnresolvedLayout`] if a declaration has no slot in the
    /// root signature.
    pub fn create_with_settings(
        device: &dyn GraphicsDevice,
        reflection: Arc<ProgramReflection>,
        allocate_buffers: bool,
        root_signature: Option<Arc<RootSignature>>,
        settings: BindingSettings,
    ) -> Result<Self, BindingError> {
        let root_signature = match root_signature {
            Some(root_signature) => root_signature,
            None => device.create_root_signature(&RootSignatureDesc::from_reflection(&reflection))?,
        };
        let resolve = |name: &str, kind: DescriptorKind, location: BindLocation| {
            find_root_offset(&root_signature, kind, location.index, location.space).ok_or_else(
                || BindingError::UnresolvedLayout {
                    name: name.to_owned(),
                    kind,
                    location,
                },
            )
        };

        let mut constant_buffers = BTreeMap::new();
        for (location, desc) in reflection.buffer_map(BufferType::Constant) {
            let root_offset = resolve(desc.name(), DescriptorKind::Cbv, *location)?;
            let buffer = if allocate_buffers {
                Some(ConstantBuffer::create(device, desc.clone())?)
            } else {
                None
            };
            constant_buffers.insert(
                *location,
                ConstantBufferSlot {
                    name: desc.name().to_owned(),
                    buffer,
                    required_size: desc.required_size(),
                    root_offset,
                },
            );
        }

        let mut structured_buffers = BTreeMap::new();
        for (location, desc) in reflection.buffer_map(BufferType::Structured) {
            let kind = match desc.access() {
                ShaderAccess::Read => DescriptorKind::Srv,
                ShaderAccess::ReadWrite => DescriptorKind::Uav,
            };
            let root_offset = resolve(desc.name(), kind, *location)?;
            let buffer = if allocate_buffers {
                Some(StructuredBuffer::create(device, desc.clone(), 1)?)
            } else {
                None
            };
            structured_buffers.insert(
                *location,
                StructuredBufferSlot {
                    name: desc.name().to_owned(),
                    buffer,
                    access: desc.access(),
                    required_size: desc.required_size(),
                    root_offset,
                },
            );
        }

        let mut srvs = BTreeMap::new();
        let mut uavs = BTreeMap::new();
        let mut samplers = BTreeMap::new();
        for (name, resource) in reflection.resources() {
            let kind = resource.category();
            let location = resource.location();
            let root_offset = resolve(name, kind, location)?;
            match kind {
                DescriptorKind::Sampler => {
                    samplers.insert(
                        location,
                        SamplerSlot {
                            name: name.clone(),
                            sampler: None,
                            root_offset,
                        },
                    );
                }
                DescriptorKind::Srv | DescriptorKind::Uav => {
                    let slot = ViewSlot {
                        name: name.clone(),
                        ty: resource.ty,
                        resource: None,
                        range: TextureSubresource::FULL,
                        root_offset,
                    };
                    if kind == DescriptorKind::Srv {
                        srvs.insert(location, slot);
                    } else {
                        uavs.insert(location, slot);
                    }
                }
                DescriptorKind::Cbv => unreachable!("resources are never constant buffer views"),
            }
        }

        log::debug!(
            "Created vars for '{}': {} constant buffers, {} structured buffers, {} SRVs, {} UAVs, {} samplers",
            reflection.label(),
            constant_buffers.len(),
            structured_buffers.len(),
            srvs.len(),
            uavs.len(),
            samplers.len()
        );

        Ok(Self {
            reflection,
            root_signature,
            settings,
            constant_buffers,
            structured_buffers,
            srvs,
            uavs,
            samplers,
        })
    }

    /// The reflection this table was built from.
    pub fn reflection(&self) -> &Arc<ProgramReflection> {
        &self.reflection
    }

    /// The root signature the slots were resolved against.
    pub fn root_signature(&self) -> &Arc<RootSignature> {
        &self.root_signature
    }

    /// The settings in effect.
    pub fn settings(&self) -> &BindingSettings {
        &self.settings
    }

    /// Every resolved root parameter offset, keyed by category and register.
    pub fn root_offsets(&self) -> BTreeMap<(DescriptorKind, BindLocation), u32> {
        let mut offsets = BTreeMap::new();
        for (location, slot) in &self.constant_buffers {
            offsets.insert((DescriptorKind::Cbv, *location), slot.root_offset);
        }
        for (location, slot) in &self.structured_buffers {
            offsets.insert((view_kind(slot.access), *location), slot.root_offset);
        }
        for (location, slot) in &self.srvs {
            offsets.insert((DescriptorKind::Srv, *location), slot.root_offset);
        }
        for (location, slot) in &self.uavs {
            offsets.insert((DescriptorKind::Uav, *location), slot.root_offset);
        }
        for (location, slot) in &self.samplers {
            offsets.insert((DescriptorKind::Sampler, *location), slot.root_offset);
        }
        offsets
    }

    fn buffer_location(&self, name: &str, expected: BufferType) -> Option<BindLocation> {
        let (ty, location) = self.reflection.buffer_binding(name)?;
        if ty != expected {
            log::warn!("Buffer '{name}' is declared as a {ty:?} buffer, not a {expected:?} buffer");
            return None;
        }
        Some(location)
    }

    /// Looks up a standalone resource and checks its declaration.
    fn verify_resource(
        &self,
        name: &str,
        accepted: &[ResourceType],
        access: Option<ShaderAccess>,
        setter: &str,
    ) -> Option<Resource> {
        let resource = *self.reflection.resource_desc(name)?;
        if !accepted.contains(&resource.ty) {
            log::warn!(
                "{setter}: '{name}' is declared as {:?}, which this setter doesn't bind",
                resource.kind()
            );
            return None;
        }
        if let Some(access) = access {
            if resource.access != access {
                log::warn!(
                    "{setter}: '{name}' is declared with {:?} access, expected {access:?}",
                    resource.access
                );
                return None;
            }
        }
        Some(resource)
    }

    // ---- Constant buffers ----

    /// The constant buffer bound to the buffer called `name`.
    pub fn constant_buffer(&self, name: &str) -> Option<Arc<ConstantBuffer>> {
        let location = self.buffer_location(name, BufferType::Constant)?;
        self.constant_buffer_at(location)
    }

    /// The constant buffer bound at a register.
    pub fn constant_buffer_at(
        &self,
        location: impl Into<BindLocation>,
    ) -> Option<Arc<ConstantBuffer>> {
        let location = location.into();
        match self.constant_buffers.get(&location) {
            Some(slot) => slot.buffer.clone(),
            None => {
                log::warn!("No constant buffer is declared at {location}");
                None
            }
        }
    }

    /// Binds a constant buffer by name.
    pub fn set_constant_buffer(&mut self, name: &str, buffer: Arc<ConstantBuffer>) -> bool {
        match self.buffer_location(name, BufferType::Constant) {
            Some(location) => self.set_constant_buffer_at(location, buffer),
            None => false,
        }
    }

    /// Binds a constant buffer at a register. The buffer must be at least as large as
    /// the declaration.
    pub fn set_constant_buffer_at(
        &mut self,
        location: impl Into<BindLocation>,
        buffer: Arc<ConstantBuffer>,
    ) -> bool {
        let location = location.into();
        let Some(slot) = self.constant_buffers.get_mut(&location) else {
            log::warn!("No constant buffer is declared at {location}");
            return false;
        };
        if buffer.size() < slot.required_size {
            log::warn!(
                "Can't bind a {}-byte buffer to constant buffer '{}', which requires {} bytes",
                buffer.size(),
                slot.name,
                slot.required_size
            );
            return false;
        }
        slot.buffer = Some(buffer);
        true
    }

    // ---- Structured buffers ----

    /// The structured buffer bound to the buffer called `name`.
    pub fn structured_buffer(&self, name: &str) -> Option<Arc<StructuredBuffer>> {
        let location = self.buffer_location(name, BufferType::Structured)?;
        self.structured_buffer_at(location)
    }

    /// The structured buffer bound at a register.
    pub fn structured_buffer_at(
        &self,
        location: impl Into<BindLocation>,
    ) -> Option<Arc<StructuredBuffer>> {
        let location = location.into();
        match self.structured_buffers.get(&location) {
            Some(slot) => slot.buffer.clone(),
            None => {
                log::warn!("No structured buffer is declared at {location}");
                None
            }
        }
    }

    /// Binds a structured buffer by name.
    pub fn set_structured_buffer(&mut self, name: &str, buffer: Arc<StructuredBuffer>) -> bool {
        match self.buffer_location(name, BufferType::Structured) {
            Some(location) => self.set_structured_buffer_at(location, buffer),
            None => false,
        }
    }

    /// Binds a structured buffer at a register.
    pub fn set_structured_buffer_at(
        &mut self,
        location: impl Into<BindLocation>,
        buffer: Arc<StructuredBuffer>,
    ) -> bool {
        let location = location.into();
        let Some(slot) = self.structured_buffers.get_mut(&location) else {
            log::warn!("No structured buffer is declared at {location}");
            return false;
        };
        if buffer.size() < slot.required_size {
            log::warn!(
                "Can't bind a {}-byte buffer to structured buffer '{}', which requires {} bytes",
                buffer.size(),
                slot.name,
                slot.required_size
            );
            return false;
        }
        slot.buffer = Some(buffer);
        true
    }

    // ---- Buffer views ----

    /// Binds a plain buffer to a raw or structured buffer view declared as `name`.
    ///
    /// The view is read-only or read-write as declared; the buffer must have the
    /// matching usage. `None` unbinds.
    pub fn set_raw_buffer(&mut self, name: &str, buffer: Option<Arc<Buffer>>) -> bool {
        let Some(resource) = self.verify_resource(
            name,
            &[ResourceType::RawBuffer, ResourceType::StructuredBuffer],
            None,
            "set_raw_buffer",
        ) else {
            return false;
        };
        if let Some(buffer) = &buffer {
            if !check_buffer_usage(name, buffer, resource.access) {
                return false;
            }
        }
        self.bind_view(
            resource.category(),
            resource.location(),
            buffer.map(BoundResource::Buffer),
            TextureSubresource::FULL,
        )
    }

    /// Binds a typed buffer to the typed buffer view declared as `name`. `None` unbinds.
    pub fn set_typed_buffer(&mut self, name: &str, buffer: Option<Arc<TypedBuffer>>) -> bool {
        let Some(resource) =
            self.verify_resource(name, &[ResourceType::TypedBuffer], None, "set_typed_buffer")
        else {
            return false;
        };
        if let Some(buffer) = &buffer {
            if !check_buffer_usage(name, buffer.buffer(), resource.access) {
                return false;
            }
        }
        self.bind_view(
            resource.category(),
            resource.location(),
            buffer.map(BoundResource::TypedBuffer),
            TextureSubresource::FULL,
        )
    }

    fn bind_view(
        &mut self,
        kind: DescriptorKind,
        location: BindLocation,
        resource: Option<BoundResource>,
        range: TextureSubresource,
    ) -> bool {
        let slots = match kind {
            DescriptorKind::Srv => &mut self.srvs,
            DescriptorKind::Uav => &mut self.uavs,
            DescriptorKind::Cbv | DescriptorKind::Sampler => return false,
        };
        let Some(slot) = slots.get_mut(&location) else {
            log::warn!("No {kind:?} is declared at {location}");
            return false;
        };
        slot.resource = resource;
        slot.range = range;
        true
    }

    /// The object bound to the shader-resource view at a register.
    pub fn srv_at(&self, location: impl Into<BindLocation>) -> Option<BoundResource> {
        self.srvs.get(&location.into())?.resource.clone()
    }

    /// The object bound to the unordered-access view at a register.
    pub fn uav_at(&self, location: impl Into<BindLocation>) -> Option<BoundResource> {
        self.uavs.get(&location.into())?.resource.clone()
    }

    /// The resolved subresource range of a texture view.
    pub fn view_range_at(
        &self,
        kind: DescriptorKind,
        location: impl Into<BindLocation>,
    ) -> Option<TextureSubresource> {
        let slots = match kind {
            DescriptorKind::Srv => &self.srvs,
            DescriptorKind::Uav => &self.uavs,
            DescriptorKind::Cbv | DescriptorKind::Sampler => return None,
        };
        let slot = slots.get(&location.into())?;
        slot.resource.as_ref()?.as_texture()?;
        Some(slot.range)
    }

    // ---- Textures ----

    /// The texture bound to the texture declared as `name`, read-only or read-write.
    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        let resource =
            self.verify_resource(name, &[ResourceType::Texture], None, "texture")?;
        let bound = match resource.access {
            ShaderAccess::Read => self.srv_at(resource.location()),
            ShaderAccess::ReadWrite => self.uav_at(resource.location()),
        }?;
        bound.as_texture().cloned()
    }

    /// The texture bound to the shader-resource view at a register.
    pub fn texture_at(&self, location: impl Into<BindLocation>) -> Option<Arc<Texture>> {
        self.srv_at(location)?.as_texture().cloned()
    }

    /// Binds a range of a texture to the read-only texture declared as `name`.
    /// `None` unbinds.
    ///
    /// # Panics
    ///
    /// Panics if `view` doesn't fit inside `texture`.
    pub fn set_texture(
        &mut self,
        name: &str,
        texture: Option<Arc<Texture>>,
        view: TextureSubresource,
    ) -> bool {
        match self.verify_resource(
            name,
            &[ResourceType::Texture],
            Some(ShaderAccess::Read),
            "set_texture",
        ) {
            Some(resource) => self.set_texture_at(resource.location(), texture, view),
            None => false,
        }
    }

    /// Binds a range of a texture to the read-only texture at a register.
    ///
    /// # Panics
    ///
    /// Panics if `view` doesn't fit inside `texture`.
    pub fn set_texture_at(
        &mut self,
        location: impl Into<BindLocation>,
        texture: Option<Arc<Texture>>,
        view: TextureSubresource,
    ) -> bool {
        let location = location.into();
        match self.check_texture_srv(location, texture.as_ref(), view) {
            Some(range) => self.bind_view(
                DescriptorKind::Srv,
                location,
                texture.map(BoundResource::Texture),
                range,
            ),
            None => false,
        }
    }

    /// The resolved range `texture` would be bound with at a read-only texture register,
    /// or `None` when the binding is rejected.
    fn check_texture_srv(
        &self,
        location: BindLocation,
        texture: Option<&Arc<Texture>>,
        view: TextureSubresource,
    ) -> Option<TextureSubresource> {
        if !self.is_texture_slot(DescriptorKind::Srv, location) {
            return None;
        }
        match texture {
            Some(texture) => {
                if !texture.usage().contains(TextureUsage::SHADER_RESOURCE) {
                    log::warn!(
                        "Texture '{}' wasn't created for shader-resource views",
                        texture.label().unwrap_or("unnamed")
                    );
                    return None;
                }
                Some(view.resolve(texture))
            }
            None => Some(TextureSubresource::FULL),
        }
    }

    /// Binds one mip level of a texture to the read-write texture declared as `name`.
    ///
    /// # Panics
    ///
    /// Panics if the range doesn't fit inside `texture`.
    pub fn set_uav(
        &mut self,
        name: &str,
        texture: Option<Arc<Texture>>,
        mip_level: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> bool {
        match self.verify_resource(
            name,
            &[ResourceType::Texture],
            Some(ShaderAccess::ReadWrite),
            "set_uav",
        ) {
            Some(resource) => self.set_uav_at(
                resource.location(),
                texture,
                mip_level,
                first_array_slice,
                array_size,
            ),
            None => false,
        }
    }

    /// Binds one mip level of a texture to the read-write texture at a register.
    /// `array_size` accepts [`TextureSubresource::MAX_POSSIBLE`].
    ///
    /// # Panics
    ///
    /// Panics if the range doesn't fit inside `texture`.
    pub fn set_uav_at(
        &mut self,
        location: impl Into<BindLocation>,
        texture: Option<Arc<Texture>>,
        mip_level: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> bool {
        let location = location.into();
        if !self.is_texture_slot(DescriptorKind::Uav, location) {
            return false;
        }
        let range = match &texture {
            Some(texture) => {
                if !texture.usage().contains(TextureUsage::UNORDERED_ACCESS) {
                    log::warn!(
                        "Texture '{}' wasn't created for unordered-access views",
                        texture.label().unwrap_or("unnamed")
                    );
                    return false;
                }
                TextureSubresource::single_mip(mip_level, first_array_slice, array_size)
                    .resolve(texture)
            }
            None => TextureSubresource::FULL,
        };
        self.bind_view(
            DescriptorKind::Uav,
            location,
            texture.map(BoundResource::Texture),
            range,
        )
    }

    fn is_texture_slot(&self, kind: DescriptorKind, location: BindLocation) -> bool {
        let slots = match kind {
            DescriptorKind::Srv => &self.srvs,
            DescriptorKind::Uav => &self.uavs,
            DescriptorKind::Cbv | DescriptorKind::Sampler => {
                log::warn!("{kind:?} slots never hold textures");
                return false;
            }
        };
        match slots.get(&location) {
            Some(slot) if slot.ty == ResourceType::Texture => true,
            Some(slot) => {
                log::warn!(
                    "'{}' at {location} is a {:?}, not a texture",
                    slot.name,
                    slot.ty
                );
                false
            }
            None => {
                log::warn!("No {kind:?} texture is declared at {location}");
                false
            }
        }
    }

    /// Binds `textures[k]` to the read-only texture at register `start + k`.
    ///
    /// Every target register and texture is checked before anything is bound, so a
    /// rejected range leaves all registers untouched.
    pub fn set_texture_range(
        &mut self,
        start: impl Into<BindLocation>,
        textures: &[Option<Arc<Texture>>],
    ) -> bool {
        let start = start.into();
        let mut ranges = Vec::with_capacity(textures.len());
        for (k, texture) in textures.iter().enumerate() {
            let location = start.offset(k as u32);
            match self.check_texture_srv(location, texture.as_ref(), TextureSubresource::FULL) {
                Some(range) => ranges.push((location, range)),
                None => return false,
            }
        }
        ranges
            .into_iter()
            .zip(textures)
            .all(|((location, range), texture)| {
                self.bind_view(
                    DescriptorKind::Srv,
                    location,
                    texture.clone().map(BoundResource::Texture),
                    range,
                )
            })
    }

    /// Binds `textures` to consecutive registers starting at the read-only texture
    /// declared as `name`.
    pub fn set_texture_range_by_name(
        &mut self,
        name: &str,
        textures: &[Option<Arc<Texture>>],
    ) -> bool {
        match self.verify_resource(
            name,
            &[ResourceType::Texture],
            Some(ShaderAccess::Read),
            "set_texture_range_by_name",
        ) {
            Some(resource) => self.set_texture_range(resource.location(), textures),
            None => false,
        }
    }

    // ---- Samplers ----

    /// The sampler bound to the sampler declared as `name`.
    pub fn sampler(&self, name: &str) -> Option<Arc<Sampler>> {
        let resource = self.verify_resource(name, &[ResourceType::Sampler], None, "sampler")?;
        self.sampler_at(resource.location())
    }

    /// The sampler bound at a register.
    pub fn sampler_at(&self, location: impl Into<BindLocation>) -> Option<Arc<Sampler>> {
        self.samplers.get(&location.into())?.sampler.clone()
    }

    /// Binds a sampler by name. `None` unbinds.
    pub fn set_sampler(&mut self, name: &str, sampler: Option<Arc<Sampler>>) -> bool {
        match self.verify_resource(name, &[ResourceType::Sampler], None, "set_sampler") {
            Some(resource) => self.set_sampler_at(resource.location(), sampler),
            None => false,
        }
    }

    /// Binds a sampler at a register. `None` unbinds.
    pub fn set_sampler_at(
        &mut self,
        location: impl Into<BindLocation>,
        sampler: Option<Arc<Sampler>>,
    ) -> bool {
        let location = location.into();
        let Some(slot) = self.samplers.get_mut(&location) else {
            log::warn!("No sampler is declared at {location}");
            return false;
        };
        slot.sampler = sampler;
        true
    }

    // ---- Commit ----

    /// Records the commands binding every slot.
    ///
    /// The order is fixed: root signature, constant buffers, shader-resource views,
    /// unordered-access views, samplers. Pending CPU writes of constant, structured and
    /// typed buffers are uploaded right before their bind. Empty view slots get the null
    /// placeholder. Empty sampler slots are left unbound unless
    /// [`BindingSettings::null_sampler_fallback`] is set.
    pub fn commit(&self, recorder: &mut dyn CommandRecorder) {
        recorder.set_root_signature(&self.root_signature);

        for (location, slot) in &self.constant_buffers {
            match &slot.buffer {
                Some(buffer) => {
                    buffer.upload(recorder);
                    self.bind_buffer(recorder, slot.root_offset, DescriptorKind::Cbv, buffer.buffer());
                }
                None if self.settings.warn_on_unbound_constant_buffers => {
                    log::warn!(
                        "Constant buffer '{}' at {location} is not bound and is skipped",
                        slot.name
                    );
                }
                None => {}
            }
        }

        self.commit_views(recorder, ShaderAccess::Read);
        self.commit_views(recorder, ShaderAccess::ReadWrite);

        for slot in self.samplers.values() {
            match &slot.sampler {
                Some(sampler) => {
                    recorder.set_descriptor_table(slot.root_offset, &DescriptorView::sampler(sampler.id()));
                }
                None if self.settings.null_sampler_fallback => {
                    log::debug!("Sampler '{}' is not bound, using the null sampler", slot.name);
                    recorder.set_descriptor_table(slot.root_offset, null_view(DescriptorKind::Sampler));
                }
                None => {}
            }
        }
    }

    fn commit_views(&self, recorder: &mut dyn CommandRecorder, access: ShaderAccess) {
        let kind = view_kind(access);
        let (state, views) = match access {
            ShaderAccess::Read => (ResourceState::ShaderResource, &self.srvs),
            ShaderAccess::ReadWrite => (ResourceState::UnorderedAccess, &self.uavs),
        };

        for slot in self.structured_buffers.values().filter(|slot| slot.access == access) {
            match &slot.buffer {
                Some(buffer) => {
                    buffer.upload(recorder);
                    recorder.resource_barrier(ResourceRef::Buffer(buffer.buffer().id()), state);
                    self.bind_buffer(recorder, slot.root_offset, kind, buffer.buffer());
                }
                None => self.bind_null_buffer(recorder, slot.root_offset, kind),
            }
        }

        for slot in views.values() {
            match &slot.resource {
                Some(resource) => {
                    if let BoundResource::TypedBuffer(buffer) = resource {
                        buffer.upload(recorder);
                    }
                    recorder.resource_barrier(resource.resource_ref(), state);
                    recorder.set_descriptor_table(slot.root_offset, &resource.view(kind, slot.range));
                }
                None => recorder.set_descriptor_table(slot.root_offset, null_view(kind)),
            }
        }
    }

    fn is_root_descriptor(&self, root_offset: u32) -> bool {
        (root_offset as usize) < self.root_signature.desc().root_descriptors.len()
    }

    /// Binds a whole buffer as a root descriptor or, if the layout puts it in a table,
    /// as a buffer view.
    fn bind_buffer(
        &self,
        recorder: &mut dyn CommandRecorder,
        root_offset: u32,
        kind: DescriptorKind,
        buffer: &Buffer,
    ) {
        if self.is_root_descriptor(root_offset) {
            recorder.set_root_descriptor(root_offset, kind, buffer.gpu_address());
        } else {
            let view = DescriptorView {
                kind,
                target: ViewTarget::Buffer {
                    id: buffer.id(),
                    address: buffer.gpu_address(),
                    size: buffer.size(),
                },
            };
            recorder.set_descriptor_table(root_offset, &view);
        }
    }

    fn bind_null_buffer(&self, recorder: &mut dyn CommandRecorder, root_offset: u32, kind: DescriptorKind) {
        if self.is_root_descriptor(root_offset) {
            recorder.set_root_descriptor(root_offset, kind, GpuAddress::default());
        } else {
            recorder.set_descriptor_table(root_offset, null_view(kind));
        }
    }
}

fn view_kind(access: ShaderAccess) -> DescriptorKind {
    match access {
        ShaderAccess::Read => DescriptorKind::Srv,
        ShaderAccess::ReadWrite => DescriptorKind::Uav,
    }
}

fn check_buffer_usage(name: &str, buffer: &Buffer, access: ShaderAccess) -> bool {
    let required = match access {
        ShaderAccess::Read => BufferUsage::SHADER_RESOURCE,
        ShaderAccess::ReadWrite => BufferUsage::UNORDERED_ACCESS,
    };
    if buffer.usage().contains(required) {
        true
    } else {
        log::warn!(
            "Buffer '{}' bound to '{name}' lacks the {required:?} usage",
            buffer.label().unwrap_or("unnamed")
        );
        false
    }
}
