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

//! A WGSL frontend built on `naga`.
//!
//! WGSL bind groups map to register spaces and bindings to register indices, so every
//! `@group(g) @binding(b)` declaration lands at register `b` space `g`.

use super::ShaderError;
use prism_core::renderer::reflection::{
    InterfaceDecl, ResourceDecl, ResourceDeclKind, ScalarKind, ShaderMetadata, ShaderType,
    StructMember, TextureShape, TextureShapeDim,
};
use prism_core::renderer::{ShaderAccess, ShaderStage, ShaderStageFlags};

/// The metadata of a parsed and validated WGSL module.
#[derive(Debug, Clone)]
pub struct WgslModule {
    label: String,
    entry_points: Vec<(String, ShaderStage)>,
    vertex_inputs: Vec<InterfaceDecl>,
    fragment_outputs: Vec<InterfaceDecl>,
    resources: Vec<ResourceDecl>,
}

impl WgslModule {
    /// Parses and validates `source`, then extracts its declarations.
    pub fn parse(label: &str, source: &str) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Parse {
            label: label.to_owned(),
            message: err.emit_to_string(source),
        })?;

        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|err| ShaderError::Validation {
            label: label.to_owned(),
            message: err.to_string(),
        })?;

        let mut entry_points = Vec::new();
        let mut vertex_inputs = Vec::new();
        let mut fragment_outputs = Vec::new();
        for entry in &module.entry_points {
            let stage = convert_stage(entry.stage);
            entry_points.push((entry.name.clone(), stage));
            match stage {
                ShaderStage::Vertex => {
                    for argument in &entry.function.arguments {
                        collect_interface(
                            &module,
                            argument.name.as_deref(),
                            argument.ty,
                            argument.binding.as_ref(),
                            &mut vertex_inputs,
                        );
                    }
                }
                ShaderStage::Fragment => {
                    if let Some(result) = &entry.function.result {
                        collect_interface(
                            &module,
                            None,
                            result.ty,
                            result.binding.as_ref(),
                            &mut fragment_outputs,
                        );
                    }
                }
                ShaderStage::Compute => {}
            }
        }

        let mut resources = Vec::new();
        for (handle, variable) in module.global_variables.iter() {
            let Some(binding) = &variable.binding else {
                continue;
            };
            let name = variable
                .name
                .clone()
                .unwrap_or_else(|| format!("binding{}_{}", binding.group, binding.binding));

            let mut stages = ShaderStageFlags::NONE;
            for (index, entry) in module.entry_points.iter().enumerate() {
                if !info.get_entry_point(index)[handle].is_empty() {
                    stages |= convert_stage(entry.stage).into();
                }
            }

            resources.push(ResourceDecl {
                name,
                register_index: binding.binding,
                register_space: binding.group,
                array_size: 0,
                stages,
                kind: resource_kind(&module, variable),
            });
        }

        log::debug!(
            "Parsed WGSL module '{label}': {} entry points, {} resources",
            entry_points.len(),
            resources.len()
        );

        Ok(Self {
            label: label.to_owned(),
            entry_points,
            vertex_inputs,
            fragment_outputs,
            resources,
        })
    }

    /// The entry points of the module with their stages.
    pub fn entry_points(&self) -> &[(String, ShaderStage)] {
        &self.entry_points
    }
}

impl ShaderMetadata for WgslModule {
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

fn convert_stage(stage: naga::ShaderStage) -> ShaderStage {
    match stage {
        naga::ShaderStage::Vertex => ShaderStage::Vertex,
        naga::ShaderStage::Fragment => ShaderStage::Fragment,
        naga::ShaderStage::Compute => ShaderStage::Compute,
    }
}

/// Collects `@location` bindings of an entry point argument or result, descending into
/// structures. Built-ins are skipped.
fn collect_interface(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<InterfaceDecl>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            let decl = InterfaceDecl {
                name: name
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("target{location}")),
                location: *location,
                ty: shader_type(module, ty),
            };
            // Several entry points may share an interface struct.
            if !out.contains(&decl) {
                out.push(decl);
            }
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_interface(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn resource_kind(module: &naga::Module, variable: &naga::GlobalVariable) -> ResourceDeclKind {
    let inner = &module.types[variable.ty].inner;
    match (variable.space, inner) {
        (_, naga::TypeInner::BindingArray { .. }) => {
            ResourceDeclKind::Unsupported("binding arrays".to_owned())
        }
        (naga::AddressSpace::Uniform, _) => ResourceDeclKind::UniformBuffer {
            ty: shader_type(module, variable.ty),
            size: inner.size(module.to_ctx()),
        },
        (naga::AddressSpace::Storage { access }, _) => ResourceDeclKind::StorageBuffer {
            ty: shader_type(module, variable.ty),
            size: inner.size(module.to_ctx()),
            access: storage_access(access),
        },
        (
            naga::AddressSpace::Handle,
            naga::TypeInner::Image {
                dim,
                arrayed,
                class,
            },
        ) => {
            let (sample, access, multisampled) = match *class {
                naga::ImageClass::Sampled { kind, multi } => {
                    (scalar_kind(kind), ShaderAccess::Read, multi)
                }
                naga::ImageClass::Depth { multi } => (Some(ScalarKind::Float), ShaderAccess::Read, multi),
                naga::ImageClass::Storage { format, access } => {
                    (Some(storage_format_kind(format)), storage_access(access), false)
                }
            };
            let Some(sample) = sample else {
                return ResourceDeclKind::Unsupported("abstract texel type".to_owned());
            };
            ResourceDeclKind::Texture {
                shape: TextureShape {
                    dim: match dim {
                        naga::ImageDimension::D1 => TextureShapeDim::D1,
                        naga::ImageDimension::D2 => TextureShapeDim::D2,
                        naga::ImageDimension::D3 => TextureShapeDim::D3,
                        naga::ImageDimension::Cube => TextureShapeDim::Cube,
                    },
                    arrayed: *arrayed,
                    multisampled,
                },
                sample,
                access,
            }
        }
        (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison }) => {
            ResourceDeclKind::Sampler {
                comparison: *comparison,
            }
        }
        (space, inner) => ResourceDeclKind::Unsupported(format!("{inner:?} in {space:?}")),
    }
}

fn storage_access(access: naga::StorageAccess) -> ShaderAccess {
    if access.contains(naga::StorageAccess::STORE) {
        ShaderAccess::ReadWrite
    } else {
        ShaderAccess::Read
    }
}

fn scalar_kind(kind: naga::ScalarKind) -> Option<ScalarKind> {
    match kind {
        naga::ScalarKind::Bool => Some(ScalarKind::Bool),
        naga::ScalarKind::Sint => Some(ScalarKind::Sint),
        naga::ScalarKind::Uint => Some(ScalarKind::Uint),
        naga::ScalarKind::Float => Some(ScalarKind::Float),
        naga::ScalarKind::AbstractInt | naga::ScalarKind::AbstractFloat => None,
    }
}

fn storage_format_kind(format: naga::StorageFormat) -> ScalarKind {
    use naga::StorageFormat as F;
    match format {
        F::R8Uint
        | F::R16Uint
        | F::R32Uint
        | F::Rg8Uint
        | F::Rg16Uint
        | F::Rg32Uint
        | F::Rgba8Uint
        | F::Rgba16Uint
        | F::Rgba32Uint
        | F::Rgb10a2Uint => ScalarKind::Uint,
        F::R8Sint
        | F::R16Sint
        | F::R32Sint
        | F::Rg8Sint
        | F::Rg16Sint
        | F::Rg32Sint
        | F::Rgba8Sint
        | F::Rgba16Sint
        | F::Rgba32Sint => ScalarKind::Sint,
        _ => ScalarKind::Float,
    }
}

fn shader_type(module: &naga::Module, ty: naga::Handle<naga::Type>) -> ShaderType {
    let scalar = |scalar: naga::Scalar| {
        scalar_kind(scalar.kind).map(|kind| (kind, scalar.width))
    };
    let inner = &module.types[ty].inner;
    match *inner {
        naga::TypeInner::Scalar(s) | naga::TypeInner::Atomic(s) => match scalar(s) {
            Some((kind, width)) => ShaderType::Scalar { kind, width },
            None => ShaderType::Unsupported("abstract scalar".to_owned()),
        },
        naga::TypeInner::Vector { size, scalar: s } => match scalar(s) {
            Some((kind, width)) => ShaderType::Vector {
                size: size as u8,
                kind,
                width,
            },
            None => ShaderType::Unsupported("abstract vector".to_owned()),
        },
        naga::TypeInner::Matrix {
            columns,
            rows,
            scalar: s,
        } => match s.kind {
            naga::ScalarKind::Float => ShaderType::Matrix {
                columns: columns as u8,
                rows: rows as u8,
                width: s.width,
            },
            _ => ShaderType::Unsupported(format!("{:?} matrix", s.kind)),
        },
        naga::TypeInner::Pointer { .. } | naga::TypeInner::ValuePointer { .. } => {
            ShaderType::Pointer
        }
        naga::TypeInner::Array { base, size, stride } => {
            let count = match size {
                naga::ArraySize::Constant(count) => Some(count.get()),
                naga::ArraySize::Dynamic => None,
                #[allow(unreachable_patterns)]
                _ => return ShaderType::Unsupported("override-sized array".to_owned()),
            };
            ShaderType::Array {
                element: Box::new(shader_type(module, base)),
                count,
                stride,
            }
        }
        naga::TypeInner::Struct { ref members, .. } => ShaderType::Struct {
            members: members
                .iter()
                .map(|member| StructMember {
                    name: member.name.clone().unwrap_or_default(),
                    offset: member.offset,
                    ty: shader_type(module, member.ty),
                })
                .collect(),
        },
        ref other => ShaderType::Unsupported(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
struct PerFrame {
    viewProj: mat4x4<f32>,
    time: f32,
}

@group(0) @binding(0) var<uniform> PerFrameCB: PerFrame;
@group(0) @binding(1) var gAlbedo: texture_2d<f32>;
@group(0) @binding(2) var gSampler: sampler;

struct VsIn {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VsIn) -> VsOut {
    var out: VsOut;
    out.clip = PerFrameCB.viewProj * vec4<f32>(input.position, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VsOut) -> @location(0) vec4<f32> {
    return textureSample(gAlbedo, gSampler, input.uv) * PerFrameCB.time;
}
"#;

    fn resource<'a>(module: &'a WgslModule, name: &str) -> &'a ResourceDecl {
        module
            .resources
            .iter()
            .find(|decl| decl.name == name)
            .unwrap()
    }

    #[test]
    fn bindings_map_to_registers() {
        let module = WgslModule::parse("scene", SCENE).unwrap();
        assert_eq!(module.resources.len(), 3);

        let cb = resource(&module, "PerFrameCB");
        assert_eq!((cb.register_index, cb.register_space), (0, 0));
        assert!(matches!(
            cb.kind,
            ResourceDeclKind::UniformBuffer { size: 80, .. }
        ));
        assert_eq!(cb.stages, ShaderStageFlags::VERTEX_FRAGMENT);

        let albedo = resource(&module, "gAlbedo");
        assert_eq!(albedo.register_index, 1);
        assert_eq!(albedo.stages, ShaderStageFlags::FRAGMENT);
        assert!(matches!(
            albedo.kind,
            ResourceDeclKind::Texture {
                sample: ScalarKind::Float,
                access: ShaderAccess::Read,
                ..
            }
        ));

        assert!(matches!(
            resource(&module, "gSampler").kind,
            ResourceDeclKind::Sampler { comparison: false }
        ));
    }

    #[test]
    fn interfaces_skip_builtins() {
        let module = WgslModule::parse("scene", SCENE).unwrap();
        let inputs: Vec<_> = module
            .vertex_inputs
            .iter()
            .map(|decl| (decl.name.as_str(), decl.location))
            .collect();
        assert_eq!(inputs, [("position", 0), ("uv", 1)]);

        assert_eq!(module.fragment_outputs.len(), 1);
        assert_eq!(module.fragment_outputs[0].name, "target0");
        assert_eq!(
            module.entry_points(),
            [
                ("vs_main".to_owned(), ShaderStage::Vertex),
                ("fs_main".to_owned(), ShaderStage::Fragment)
            ]
        );
    }

    #[test]
    fn storage_access_follows_declaration() {
        let source = r#"
@group(1) @binding(0) var<storage, read> gInput: array<u32>;
@group(1) @binding(1) var<storage, read_write> gOutput: array<vec4<f32>>;
@group(1) @binding(2) var gImage: texture_storage_2d<rgba8uint, write>;

@compute @workgroup_size(8)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    gOutput[id.x] = vec4<f32>(f32(gInput[id.x]));
    textureStore(gImage, vec2<i32>(id.xy), vec4<u32>(1u));
}
"#;
        let module = WgslModule::parse("compute", source).unwrap();
        let input = resource(&module, "gInput");
        assert_eq!(input.register_space, 1);
        assert_eq!(input.stages, ShaderStageFlags::COMPUTE);
        assert!(matches!(
            input.kind,
            ResourceDeclKind::StorageBuffer {
                access: ShaderAccess::Read,
                ..
            }
        ));
        assert!(matches!(
            resource(&module, "gOutput").kind,
            ResourceDeclKind::StorageBuffer {
                access: ShaderAccess::ReadWrite,
                ..
            }
        ));
        assert!(matches!(
            resource(&module, "gImage").kind,
            ResourceDeclKind::Texture {
                sample: ScalarKind::Uint,
                access: ShaderAccess::ReadWrite,
                ..
            }
        ));
    }

    #[test]
    fn invalid_source_reports_the_label() {
        let err = WgslModule::parse("broken", "fn main( {").unwrap_err();
        assert!(matches!(err, ShaderError::Parse { ref label, .. } if label == "broken"));
    }
}
