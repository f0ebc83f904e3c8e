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

//! Reflection of a whole program: buffers, standalone resources and stage interfaces.

use super::metadata::{
    InterfaceDecl, ResourceDecl, ResourceDeclKind, ScalarKind, ShaderMetadata, ShaderType,
    StructMember, TextureShape, TextureShapeDim,
};
use super::{
    BindLocation, BufferReflection, BufferType, Dimensions, Resource, ResourceType, ReturnType,
    ShaderAccess, Variable, VariableType,
};
use crate::renderer::binding::DescriptorKind;
use crate::renderer::error::ReflectionError;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct BufferTable {
    by_location: BTreeMap<BindLocation, Arc<BufferReflection>>,
    by_name: HashMap<String, BindLocation>,
}

/// The reflection of a compiled program.
///
/// Built once by [`ProgramReflection::create`] and immutable afterwards. Every binding
/// table of the program shares it through an `Arc`.
#[derive(Debug)]
pub struct ProgramReflection {
    label: String,
    constant_buffers: BufferTable,
    structured_buffers: BufferTable,
    vertex_inputs: BTreeMap<String, Variable>,
    fragment_outputs: BTreeMap<String, Variable>,
    resources: BTreeMap<String, Resource>,
}

impl ProgramReflection {
    /// Reflects a compiled program.
    ///
    /// Every declaration that can't be represented is reported. If there was at least
    /// one, the whole reflection fails with the complete log.
    pub fn create(metadata: &dyn ShaderMetadata) -> Result<Self, ReflectionError> {
        let mut builder = ReflectionBuilder::new(metadata.label());
        builder.reflect_interface("vertex input", metadata.vertex_inputs());
        builder.reflect_interface("fragment output", metadata.fragment_outputs());
        for decl in metadata.resources() {
            builder.reflect_resource(decl);
        }
        builder.finish()
    }

    /// The label of the reflected program.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn table(&self, ty: BufferType) -> &BufferTable {
        match ty {
            BufferType::Constant => &self.constant_buffers,
            BufferType::Structured => &self.structured_buffers,
        }
    }

    /// Finds the kind and register of the buffer called `name`.
    pub fn buffer_binding(&self, name: &str) -> Option<(BufferType, BindLocation)> {
        for ty in [BufferType::Constant, BufferType::Structured] {
            if let Some(location) = self.table(ty).by_name.get(name) {
                return Some((ty, *location));
            }
        }
        log::warn!("Can't find a buffer named '{name}' in program '{}'", self.label);
        None
    }

    /// Finds a buffer of kind `ty` by name.
    pub fn buffer_desc(&self, name: &str, ty: BufferType) -> Option<&Arc<BufferReflection>> {
        let table = self.table(ty);
        let buffer = table
            .by_name
            .get(name)
            .and_then(|location| table.by_location.get(location));
        if buffer.is_none() {
            log::warn!(
                "Can't find a {ty:?} buffer named '{name}' in program '{}'",
                self.label
            );
        }
        buffer
    }

    /// Finds a buffer of kind `ty` by register.
    pub fn buffer_desc_at(
        &self,
        location: impl Into<BindLocation>,
        ty: BufferType,
    ) -> Option<&Arc<BufferReflection>> {
        let location = location.into();
        let buffer = self.table(ty).by_location.get(&location);
        if buffer.is_none() {
            log::warn!(
                "Can't find a {ty:?} buffer at {location} in program '{}'",
                self.label
            );
        }
        buffer
    }

    /// Every buffer of kind `ty`, ordered by register.
    pub fn buffer_map(&self, ty: BufferType) -> &BTreeMap<BindLocation, Arc<BufferReflection>> {
        &self.table(ty).by_location
    }

    /// Finds a vertex input by name. Its location is the attribute slot.
    pub fn vertex_attribute(&self, name: &str) -> Option<&Variable> {
        let variable = self.vertex_inputs.get(name);
        if variable.is_none() {
            log::warn!("Can't find vertex attribute '{name}' in program '{}'", self.label);
        }
        variable
    }

    /// Every vertex input.
    pub fn vertex_inputs(&self) -> &BTreeMap<String, Variable> {
        &self.vertex_inputs
    }

    /// Finds a fragment output by name. Its location is the render target slot.
    pub fn fragment_output(&self, name: &str) -> Option<&Variable> {
        let variable = self.fragment_outputs.get(name);
        if variable.is_none() {
            log::warn!("Can't find fragment output '{name}' in program '{}'", self.label);
        }
        variable
    }

    /// Every fragment output.
    pub fn fragment_outputs(&self) -> &BTreeMap<String, Variable> {
        &self.fragment_outputs
    }

    /// Finds a standalone resource by name.
    pub fn resource_desc(&self, name: &str) -> Option<&Resource> {
        let resource = self.resources.get(name);
        if resource.is_none() {
            log::warn!("Can't find resource '{name}' in program '{}'", self.label);
        }
        resource
    }

    /// Every standalone resource.
    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    /// Finds a variable in any buffer of the program: constant buffers first, then
    /// structured buffers, each in register order.
    pub fn variable_data(
        &self,
        name: &str,
        allow_non_indexed_array: bool,
    ) -> Option<(Arc<BufferReflection>, usize)> {
        let buffers = self
            .constant_buffers
            .by_location
            .values()
            .chain(self.structured_buffers.by_location.values());
        for buffer in buffers {
            if let Ok((_, offset)) = buffer.lookup(name, allow_non_indexed_array) {
                return Some((buffer.clone(), offset));
            }
        }
        log::warn!(
            "Can't find variable '{name}' in any buffer of program '{}'",
            self.label
        );
        None
    }
}

/// Accumulates reflection results and every problem found on the way.
struct ReflectionBuilder {
    label: String,
    errors: Vec<String>,
    registers: HashMap<(DescriptorKind, BindLocation), String>,
    names: HashSet<String>,
    constant_buffers: BufferTable,
    structured_buffers: BufferTable,
    vertex_inputs: BTreeMap<String, Variable>,
    fragment_outputs: BTreeMap<String, Variable>,
    resources: BTreeMap<String, Resource>,
}

impl ReflectionBuilder {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            errors: Vec::new(),
            registers: HashMap::new(),
            names: HashSet::new(),
            constant_buffers: BufferTable::default(),
            structured_buffers: BufferTable::default(),
            vertex_inputs: BTreeMap::new(),
            fragment_outputs: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    fn error(&mut self, message: String) {
        log::error!("{}: {message}", self.label);
        self.errors.push(message);
    }

    fn reflect_interface(&mut self, what: &str, decls: Vec<InterfaceDecl>) {
        for decl in decls {
            let ty = match variable_type(&decl.ty) {
                Some(ty) if ty.is_scalar_or_vector() => ty,
                _ => {
                    self.error(format!(
                        "Unsupported type {} for {what} '{}'",
                        describe(&decl.ty),
                        decl.name
                    ));
                    continue;
                }
            };
            let variable = Variable::scalar(decl.location as usize, ty);
            let map = if what == "vertex input" {
                &mut self.vertex_inputs
            } else {
                &mut self.fragment_outputs
            };
            match map.get(&decl.name) {
                Some(existing) if existing.location != variable.location => {
                    let message = format!(
                        "{what} '{}' is declared at both location {} and {}",
                        decl.name, existing.location, variable.location
                    );
                    self.error(message);
                }
                Some(existing) if existing.ty != variable.ty => {
                    let message = format!(
                        "{what} '{}' is declared as both {} and {}",
                        decl.name, existing.ty, variable.ty
                    );
                    self.error(message);
                }
                _ => {
                    map.insert(decl.name, variable);
                }
            }
        }
    }

    fn reflect_resource(&mut self, decl: ResourceDecl) {
        match &decl.kind {
            ResourceDeclKind::UniformBuffer { ty, size } => {
                self.add_buffer(&decl, BufferType::Constant, ShaderAccess::Read, ty, *size);
            }
            ResourceDeclKind::StorageBuffer { ty, size, access } => match ty {
                ShaderType::Struct { .. } => {
                    self.add_buffer(&decl, BufferType::Structured, *access, ty, *size);
                }
                ShaderType::Array { element, .. } => match buffer_view_type(element) {
                    Some((ty, return_type)) => self.add_resource(
                        &decl,
                        Resource {
                            ty,
                            access: *access,
                            dims: Dimensions::Buffer,
                            return_type,
                            register_index: decl.register_index,
                            register_space: decl.register_space,
                            array_size: decl.array_size,
                            shader_mask: decl.stages,
                        },
                    ),
                    None => self.error(format!(
                        "Unsupported element type {} for storage buffer '{}'",
                        describe(element),
                        decl.name
                    )),
                },
                other => self.error(format!(
                    "Unsupported content {} for storage buffer '{}'",
                    describe(other),
                    decl.name
                )),
            },
            ResourceDeclKind::Texture {
                shape,
                sample,
                access,
            } => match texture_dimensions(*shape) {
                Some(dims) => self.add_resource(
                    &decl,
                    Resource {
                        ty: ResourceType::Texture,
                        access: *access,
                        dims,
                        return_type: scalar_return_type(*sample, 4),
                        register_index: decl.register_index,
                        register_space: decl.register_space,
                        array_size: decl.array_size,
                        shader_mask: decl.stages,
                    },
                ),
                None => self.error(format!(
                    "Unsupported texture dimensions {shape:?} for '{}'",
                    decl.name
                )),
            },
            ResourceDeclKind::Sampler { .. } => {
                let mut sampler =
                    Resource::sampler(decl.register_index, decl.register_space, decl.stages);
                sampler.array_size = decl.array_size;
                self.add_resource(&decl, sampler);
            }
            ResourceDeclKind::Unsupported(what) => {
                let message = format!("Unsupported resource '{}': {what}", decl.name);
                self.error(message);
            }
        }
    }

    fn add_buffer(
        &mut self,
        decl: &ResourceDecl,
        ty: BufferType,
        access: ShaderAccess,
        content: &ShaderType,
        size: u32,
    ) {
        if decl.array_size > 0 {
            self.error(format!("Buffer arrays are not supported ('{}')", decl.name));
            return;
        }

        let mut variables = BTreeMap::new();
        let errors_before = self.errors.len();
        match content {
            ShaderType::Struct { members } => {
                self.flatten_members(&decl.name, "", members, 0, &mut variables);
            }
            other => self.flatten_value(&decl.name, &decl.name, other, 0, &mut variables),
        }
        if self.errors.len() > errors_before {
            return;
        }

        let buffer = match BufferReflection::create(
            decl.name.clone(),
            decl.register_index,
            decl.register_space,
            ty,
            access,
            size as usize,
            variables,
            BTreeMap::new(),
        ) {
            Ok(buffer) => buffer.with_shader_mask(decl.stages),
            Err(err) => {
                self.error(err.to_string());
                return;
            }
        };

        let category = match (ty, buffer.access()) {
            (BufferType::Constant, _) => DescriptorKind::Cbv,
            (BufferType::Structured, ShaderAccess::Read) => DescriptorKind::Srv,
            (BufferType::Structured, ShaderAccess::ReadWrite) => DescriptorKind::Uav,
        };
        let location = buffer.location();
        if !self.claim_name(&decl.name) || !self.claim_registers(category, location, 1, &decl.name)
        {
            return;
        }

        let table = match ty {
            BufferType::Constant => &mut self.constant_buffers,
            BufferType::Structured => &mut self.structured_buffers,
        };
        table.by_name.insert(decl.name.clone(), location);
        table.by_location.insert(location, Arc::new(buffer));
    }

    fn add_resource(&mut self, decl: &ResourceDecl, resource: Resource) {
        if !self.claim_name(&decl.name) {
            return;
        }
        if !self.claim_registers(
            resource.category(),
            resource.location(),
            resource.register_count(),
            &decl.name,
        ) {
            return;
        }
        self.resources.insert(decl.name.clone(), resource);
    }

    fn claim_name(&mut self, name: &str) -> bool {
        if self.names.insert(name.to_owned()) {
            true
        } else {
            self.error(format!("'{name}' is declared more than once"));
            false
        }
    }

    fn claim_registers(
        &mut self,
        category: DescriptorKind,
        first: BindLocation,
        count: u32,
        name: &str,
    ) -> bool {
        for k in 0..count {
            let location = first.offset(k);
            if let Some(previous) = self.registers.get(&(category, location)) {
                let message = format!(
                    "'{name}' and '{previous}' are both bound to {category:?} {location}"
                );
                self.error(message);
                return false;
            }
        }
        for k in 0..count {
            self.registers
                .insert((category, first.offset(k)), name.to_owned());
        }
        true
    }

    fn flatten_members(
        &mut self,
        buffer: &str,
        prefix: &str,
        members: &[StructMember],
        base: usize,
        out: &mut BTreeMap<String, Variable>,
    ) {
        for member in members {
            let name = if prefix.is_empty() {
                member.name.clone()
            } else {
                format!("{prefix}.{}", member.name)
            };
            self.flatten_value(buffer, &name, &member.ty, base + member.offset as usize, out);
        }
    }

    fn flatten_value(
        &mut self,
        buffer: &str,
        name: &str,
        ty: &ShaderType,
        offset: usize,
        out: &mut BTreeMap<String, Variable>,
    ) {
        match ty {
            ShaderType::Struct { members } => {
                out.insert(name.to_owned(), Variable::scalar(offset, VariableType::Struct));
                self.flatten_members(buffer, name, members, offset, out);
            }
            ShaderType::Array {
                element,
                count,
                stride,
            } => {
                let array_size = count.unwrap_or(Variable::UNBOUNDED_ARRAY);
                if array_size == 0 || *stride == 0 {
                    self.error(format!("Empty array '{name}' in buffer '{buffer}'"));
                    return;
                }
                match element.as_ref() {
                    ShaderType::Array { .. } => self.error(format!(
                        "Multi-dimensional array '{name}' in buffer '{buffer}' is not supported"
                    )),
                    ShaderType::Struct { members } => {
                        out.insert(
                            name.to_owned(),
                            Variable::array(offset, VariableType::Struct, array_size, *stride),
                        );
                        self.flatten_members(buffer, name, members, offset, out);
                    }
                    element => match variable_type(element) {
                        Some(ty) => {
                            out.insert(
                                name.to_owned(),
                                Variable::array(offset, ty, array_size, *stride),
                            );
                        }
                        None => self.error(format!(
                            "Unsupported type {} for '{name}' in buffer '{buffer}'",
                            describe(element)
                        )),
                    },
                }
            }
            other => match variable_type(other) {
                Some(ty) => {
                    out.insert(name.to_owned(), Variable::scalar(offset, ty));
                }
                None => self.error(format!(
                    "Unsupported type {} for '{name}' in buffer '{buffer}'",
                    describe(other)
                )),
            },
        }
    }

    fn finish(self) -> Result<ProgramReflection, ReflectionError> {
        if !self.errors.is_empty() {
            return Err(ReflectionError::Failed {
                program: self.label,
                log: self.errors.join("\n"),
            });
        }
        log::debug!(
            "Reflected '{}': {} constant buffers, {} structured buffers, {} resources, {} vertex inputs, {} fragment outputs",
            self.label,
            self.constant_buffers.by_location.len(),
            self.structured_buffers.by_location.len(),
            self.resources.len(),
            self.vertex_inputs.len(),
            self.fragment_outputs.len()
        );
        Ok(ProgramReflection {
            label: self.label,
            constant_buffers: self.constant_buffers,
            structured_buffers: self.structured_buffers,
            vertex_inputs: self.vertex_inputs,
            fragment_outputs: self.fragment_outputs,
            resources: self.resources,
        })
    }
}

fn describe(ty: &ShaderType) -> String {
    match ty {
        ShaderType::Unsupported(what) => what.clone(),
        ShaderType::Struct { .. } => "struct".to_owned(),
        ShaderType::Array { count: None, .. } => "runtime-sized array".to_owned(),
        ShaderType::Array { count: Some(n), .. } => format!("array of {n}"),
        other => format!("{other:?}"),
    }
}

/// Maps a scalar, vector, matrix or pointer type. Arrays and structures have no single
/// variable type.
fn variable_type(ty: &ShaderType) -> Option<VariableType> {
    use ScalarKind::*;
    use VariableType as V;
    let ty = match *ty {
        ShaderType::Scalar { kind, width } => match (kind, width) {
            (Bool, _) => V::Bool,
            (Sint, 4) => V::Int,
            (Sint, 8) => V::Int64,
            (Uint, 4) => V::Uint,
            (Uint, 8) => V::Uint64,
            (Float, 4) => V::Float,
            _ => return None,
        },
        ShaderType::Vector { size, kind, width } => match (kind, width, size) {
            (Bool, _, 2) => V::Bool2,
            (Bool, _, 3) => V::Bool3,
            (Bool, _, 4) => V::Bool4,
            (Sint, 4, 2) => V::Int2,
            (Sint, 4, 3) => V::Int3,
            (Sint, 4, 4) => V::Int4,
            (Sint, 8, 2) => V::Int64_2,
            (Sint, 8, 3) => V::Int64_3,
            (Sint, 8, 4) => V::Int64_4,
            (Uint, 4, 2) => V::Uint2,
            (Uint, 4, 3) => V::Uint3,
            (Uint, 4, 4) => V::Uint4,
            (Uint, 8, 2) => V::Uint64_2,
            (Uint, 8, 3) => V::Uint64_3,
            (Uint, 8, 4) => V::Uint64_4,
            (Float, 4, 2) => V::Float2,
            (Float, 4, 3) => V::Float3,
            (Float, 4, 4) => V::Float4,
            _ => return None,
        },
        ShaderType::Matrix {
            columns,
            rows,
            width: 4,
        } => match (rows, columns) {
            (2, 2) => V::Float2x2,
            (2, 3) => V::Float2x3,
            (2, 4) => V::Float2x4,
            (3, 2) => V::Float3x2,
            (3, 3) => V::Float3x3,
            (3, 4) => V::Float3x4,
            (4, 2) => V::Float4x2,
            (4, 3) => V::Float4x3,
            (4, 4) => V::Float4x4,
            _ => return None,
        },
        ShaderType::Pointer => V::GpuPtr,
        _ => return None,
    };
    Some(ty)
}

fn scalar_return_type(kind: ScalarKind, width: u8) -> ReturnType {
    match (kind, width) {
        (ScalarKind::Float, 8) => ReturnType::Double,
        (ScalarKind::Float, _) => ReturnType::Float,
        (ScalarKind::Sint, _) => ReturnType::Int,
        (ScalarKind::Uint, _) => ReturnType::Uint,
        (ScalarKind::Bool, _) => ReturnType::Unknown,
    }
}

/// Classifies the element type of an array stored in a storage buffer.
fn buffer_view_type(element: &ShaderType) -> Option<(ResourceType, ReturnType)> {
    match *element {
        ShaderType::Scalar {
            kind: ScalarKind::Uint,
            width: 4,
        } => Some((ResourceType::RawBuffer, ReturnType::Uint)),
        ShaderType::Scalar { kind, width } | ShaderType::Vector { kind, width, .. }
            if kind != ScalarKind::Bool =>
        {
            Some((ResourceType::TypedBuffer, scalar_return_type(kind, width)))
        }
        ShaderType::Struct { .. } => Some((ResourceType::StructuredBuffer, ReturnType::Unknown)),
        _ => None,
    }
}

fn texture_dimensions(shape: TextureShape) -> Option<Dimensions> {
    use TextureShapeDim::*;
    let dims = match (shape.dim, shape.arrayed, shape.multisampled) {
        (D1, false, false) => Dimensions::Texture1D,
        (D1, true, false) => Dimensions::Texture1DArray,
        (D2, false, false) => Dimensions::Texture2D,
        (D2, true, false) => Dimensions::Texture2DArray,
        (D2, false, true) => Dimensions::Texture2DMS,
        (D2, true, true) => Dimensions::Texture2DMSArray,
        (D3, false, false) => Dimensions::Texture3D,
        (Cube, false, false) => Dimensions::TextureCube,
        (Cube, true, false) => Dimensions::TextureCubeArray,
        _ => return None,
    };
    Some(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::ShaderStageFlags;
    use crate::renderer::testing::{f32_type, scenario_metadata, vec_type, FakeMetadata};

    #[test]
    fn scenario_reflects_buffer_texture_and_sampler() {
        let reflection = ProgramReflection::create(&scenario_metadata()).unwrap();

        let cb = reflection
            .buffer_desc("PerFrameCB", BufferType::Constant)
            .unwrap();
        assert_eq!(cb.required_size(), 64);
        assert_eq!(cb.location(), BindLocation::new(0, 0));
        assert_eq!(
            reflection.buffer_binding("PerFrameCB"),
            Some((BufferType::Constant, BindLocation::new(0, 0)))
        );

        let albedo = reflection.resource_desc("gAlbedo").unwrap();
        assert_eq!(albedo.ty, ResourceType::Texture);
        assert_eq!(albedo.dims, Dimensions::Texture2D);
        assert_eq!(albedo.return_type, ReturnType::Float);

        let sampler = reflection.resource_desc("gSampler").unwrap();
        assert_eq!(sampler.ty, ResourceType::Sampler);
        assert_eq!(sampler.dims, Dimensions::Unknown);

        assert!(reflection.buffer_desc("PerFrameCB", BufferType::Structured).is_none());
        assert!(reflection.resource_desc("missing").is_none());
    }

    #[test]
    fn stage_interfaces_keep_slots() {
        let mut metadata = FakeMetadata::new("interfaces");
        metadata.vertex_input("position", 0, vec_type(3));
        metadata.vertex_input("uv", 1, vec_type(2));
        metadata.fragment_output("color", 0, vec_type(4));

        let reflection = ProgramReflection::create(&metadata).unwrap();
        let uv = reflection.vertex_attribute("uv").unwrap();
        assert_eq!(uv.location, 1);
        assert_eq!(uv.ty, VariableType::Float2);
        assert_eq!(reflection.fragment_output("color").unwrap().ty, VariableType::Float4);
        assert!(reflection.vertex_attribute("normal").is_none());
    }

    #[test]
    fn conflicting_interface_slots_fail() {
        let mut metadata = FakeMetadata::new("conflict");
        metadata.vertex_input("position", 0, vec_type(3));
        metadata.vertex_input("position", 2, vec_type(3));
        let err = ProgramReflection::create(&metadata).unwrap_err();
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn matrix_vertex_input_is_unsupported() {
        let mut metadata = FakeMetadata::new("matrix");
        metadata.vertex_input(
            "world",
            0,
            ShaderType::Matrix {
                columns: 4,
                rows: 4,
                width: 4,
            },
        );
        assert!(ProgramReflection::create(&metadata).is_err());
    }

    #[test]
    fn storage_arrays_become_buffer_views() {
        let mut metadata = FakeMetadata::new("views");
        metadata.storage_buffer(
            "gIndices",
            0,
            ShaderType::Array {
                element: Box::new(ShaderType::Scalar {
                    kind: ScalarKind::Uint,
                    width: 4,
                }),
                count: None,
                stride: 4,
            },
            ShaderAccess::Read,
        );
        metadata.storage_buffer(
            "gColors",
            1,
            ShaderType::Array {
                element: Box::new(vec_type(4)),
                count: Some(16),
                stride: 16,
            },
            ShaderAccess::ReadWrite,
        );

        let reflection = ProgramReflection::create(&metadata).unwrap();
        let indices = reflection.resource_desc("gIndices").unwrap();
        assert_eq!(indices.ty, ResourceType::RawBuffer);
        assert_eq!(indices.dims, Dimensions::Buffer);
        let colors = reflection.resource_desc("gColors").unwrap();
        assert_eq!(colors.ty, ResourceType::TypedBuffer);
        assert_eq!(colors.access, ShaderAccess::ReadWrite);
        assert_eq!(colors.return_type, ReturnType::Float);
    }

    #[test]
    fn storage_structs_become_structured_buffers() {
        let mut metadata = FakeMetadata::new("particles");
        metadata.storage_buffer(
            "particles",
            2,
            ShaderType::Struct {
                members: vec![
                    StructMember {
                        name: "count".to_owned(),
                        offset: 0,
                        ty: ShaderType::Scalar {
                            kind: ScalarKind::Uint,
                            width: 4,
                        },
                    },
                    StructMember {
                        name: "positions".to_owned(),
                        offset: 16,
                        ty: ShaderType::Array {
                            element: Box::new(vec_type(4)),
                            count: None,
                            stride: 16,
                        },
                    },
                ],
            },
            ShaderAccess::ReadWrite,
        );

        let reflection = ProgramReflection::create(&metadata).unwrap();
        let buffer = reflection
            .buffer_desc("particles", BufferType::Structured)
            .unwrap();
        assert_eq!(buffer.access(), ShaderAccess::ReadWrite);
        let positions = buffer.variables()["positions"];
        assert!(positions.is_unbounded());

        let (found, offset) = reflection.variable_data("positions[2]", false).unwrap();
        assert!(Arc::ptr_eq(&found, buffer));
        assert_eq!(offset, 48);
    }

    #[test]
    fn nested_structs_are_flattened() {
        let light = ShaderType::Struct {
            members: vec![
                StructMember {
                    name: "color".to_owned(),
                    offset: 0,
                    ty: vec_type(3),
                },
                StructMember {
                    name: "intensity".to_owned(),
                    offset: 12,
                    ty: f32_type(),
                },
            ],
        };
        let mut metadata = FakeMetadata::new("lights");
        metadata.uniform_buffer(
            "LightsCB",
            0,
            ShaderType::Struct {
                members: vec![
                    StructMember {
                        name: "sun".to_owned(),
                        offset: 0,
                        ty: light.clone(),
                    },
                    StructMember {
                        name: "lights".to_owned(),
                        offset: 16,
                        ty: ShaderType::Array {
                            element: Box::new(light),
                            count: Some(4),
                            stride: 16,
                        },
                    },
                ],
            },
            80,
        );

        let reflection = ProgramReflection::create(&metadata).unwrap();
        let buffer = reflection.buffer_desc("LightsCB", BufferType::Constant).unwrap();
        assert!(buffer.variables().contains_key("sun.intensity"));
        assert!(buffer.variables().contains_key("lights.color"));
        assert_eq!(buffer.variables()["lights"].array_size, 4);

        let (_, offset) = reflection.variable_data("lights[3].intensity", false).unwrap();
        assert_eq!(offset, 16 + 48 + 12);
        let (_, offset) = reflection.variable_data("sun.intensity", false).unwrap();
        assert_eq!(offset, 12);
        assert!(reflection.variable_data("moon.intensity", true).is_none());
    }

    #[test]
    fn non_struct_uniform_is_a_single_variable() {
        let mut metadata = FakeMetadata::new("single");
        metadata.uniform_buffer("gTime", 0, f32_type(), 4);
        let reflection = ProgramReflection::create(&metadata).unwrap();
        let buffer = reflection.buffer_desc("gTime", BufferType::Constant).unwrap();
        assert_eq!(buffer.variable_count(), 1);
        assert_eq!(buffer.variables()["gTime"].ty, VariableType::Float);
    }

    #[test]
    fn multi_dimensional_arrays_fail() {
        let mut metadata = FakeMetadata::new("grid");
        metadata.uniform_buffer(
            "GridCB",
            0,
            ShaderType::Struct {
                members: vec![StructMember {
                    name: "cells".to_owned(),
                    offset: 0,
                    ty: ShaderType::Array {
                        element: Box::new(ShaderType::Array {
                            element: Box::new(vec_type(4)),
                            count: Some(2),
                            stride: 16,
                        }),
                        count: Some(2),
                        stride: 32,
                    },
                }],
            },
            64,
        );
        let err = ProgramReflection::create(&metadata).unwrap_err();
        assert!(err.to_string().contains("Multi-dimensional"));
    }

    #[test]
    fn unrepresentable_textures_fail() {
        let mut metadata = FakeMetadata::new("volumes");
        metadata.texture(
            "gVolumes",
            0,
            TextureShape {
                dim: TextureShapeDim::D3,
                arrayed: true,
                multisampled: false,
            },
            ShaderAccess::Read,
        );
        assert!(ProgramReflection::create(&metadata).is_err());
    }

    #[test]
    fn duplicate_registers_fail() {
        let mut metadata = FakeMetadata::new("clash");
        let shape = TextureShape {
            dim: TextureShapeDim::D2,
            arrayed: false,
            multisampled: false,
        };
        metadata.texture("gA", 3, shape, ShaderAccess::Read);
        metadata.texture("gB", 3, shape, ShaderAccess::Read);
        let err = ProgramReflection::create(&metadata).unwrap_err();
        let ReflectionError::Failed { log, .. } = err else {
            panic!("unexpected error");
        };
        assert!(log.contains("gA") && log.contains("gB"));
    }

    #[test]
    fn read_and_write_views_use_separate_registers() {
        let mut metadata = FakeMetadata::new("split");
        let shape = TextureShape {
            dim: TextureShapeDim::D2,
            arrayed: false,
            multisampled: false,
        };
        metadata.texture("gInput", 0, shape, ShaderAccess::Read);
        metadata.texture("gOutput", 0, shape, ShaderAccess::ReadWrite);
        let reflection = ProgramReflection::create(&metadata).unwrap();
        assert_eq!(reflection.resources().len(), 2);
    }

    #[test]
    fn every_problem_is_reported() {
        let mut metadata = FakeMetadata::new("many");
        metadata.resource("a", 0, 0, ResourceDeclKind::Unsupported("first".to_owned()));
        metadata.resource("b", 1, 0, ResourceDeclKind::Unsupported("second".to_owned()));
        let ReflectionError::Failed { log, .. } = ProgramReflection::create(&metadata).unwrap_err()
        else {
            panic!("unexpected error");
        };
        assert_eq!(log.lines().count(), 2);
    }

    #[test]
    fn stage_masks_are_kept() {
        let mut metadata = FakeMetadata::new("stages");
        metadata.uniform_buffer("CB", 0, f32_type(), 16);
        metadata.resources[0].stages = ShaderStageFlags::VERTEX;
        let reflection = ProgramReflection::create(&metadata).unwrap();
        let buffer = reflection.buffer_desc_at(0u32, BufferType::Constant).unwrap();
        assert_eq!(buffer.shader_mask(), ShaderStageFlags::VERTEX);
    }
}
