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

//! The query interface a shader frontend implements so a compiled program can be reflected.
//!
//! A frontend describes declarations as they appear in the shader. Deciding what a
//! declaration means for binding (constant buffer, typed buffer, texture view...) is the
//! job of [`ProgramReflection::create`](super::ProgramReflection::create).

use crate::renderer::api::ShaderStageFlags;
use crate::renderer::reflection::ShaderAccess;

/// The kind of a scalar component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Sint,
    /// Unsigned integer.
    Uint,
    /// Floating point.
    Float,
}

/// The type of a declaration as written in the shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderType {
    /// A scalar of `width` bytes.
    Scalar {
        /// The component kind.
        kind: ScalarKind,
        /// The component width in bytes.
        width: u8,
    },
    /// A vector of `size` components.
    Vector {
        /// The number of components (2 to 4).
        size: u8,
        /// The component kind.
        kind: ScalarKind,
        /// The component width in bytes.
        width: u8,
    },
    /// A floating-point matrix.
    Matrix {
        /// The number of columns.
        columns: u8,
        /// The number of rows.
        rows: u8,
        /// The component width in bytes.
        width: u8,
    },
    /// A GPU pointer.
    Pointer,
    /// An array. `count` is `None` for runtime-sized arrays.
    Array {
        /// The element type.
        element: Box<ShaderType>,
        /// The number of elements.
        count: Option<u32>,
        /// The distance in bytes between elements.
        stride: u32,
    },
    /// A structure.
    Struct {
        /// The members, in declaration order.
        members: Vec<StructMember>,
    },
    /// A type the frontend can't describe. The text explains what it was.
    Unsupported(String),
}

/// A member of a [`ShaderType::Struct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMember {
    /// The member name.
    pub name: String,
    /// The byte offset from the start of the structure.
    pub offset: u32,
    /// The member type.
    pub ty: ShaderType,
}

/// A vertex input or fragment output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    /// The name of the variable.
    pub name: String,
    /// The attribute or render target slot.
    pub location: u32,
    /// The type of the variable.
    pub ty: ShaderType,
}

/// The texel addressing of a texture declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureShapeDim {
    /// 1D.
    D1,
    /// 2D.
    D2,
    /// 3D.
    D3,
    /// Cube map.
    Cube,
}

/// The shape of a texture declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureShape {
    /// The texel addressing.
    pub dim: TextureShapeDim,
    /// Whether the texture is an array.
    pub arrayed: bool,
    /// Whether the texture is multisampled.
    pub multisampled: bool,
}

/// What a resource declaration is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDeclKind {
    /// A uniform buffer of type `ty`, `size` bytes long.
    UniformBuffer {
        /// The buffer contents.
        ty: ShaderType,
        /// The size in bytes.
        size: u32,
    },
    /// A storage buffer.
    StorageBuffer {
        /// The buffer contents.
        ty: ShaderType,
        /// The size in bytes (one element for runtime-sized arrays).
        size: u32,
        /// Whether the shader may write the buffer.
        access: ShaderAccess,
    },
    /// A sampled or storage texture.
    Texture {
        /// The texture shape.
        shape: TextureShape,
        /// The kind of value returned by reads.
        sample: ScalarKind,
        /// Whether the shader may write the texture.
        access: ShaderAccess,
    },
    /// A sampler.
    Sampler {
        /// Whether this is a comparison sampler.
        comparison: bool,
    },
    /// A declaration the frontend can't describe. The text explains what it was.
    Unsupported(String),
}

/// A resource declaration bound to a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDecl {
    /// The declared name.
    pub name: String,
    /// The register (binding) index.
    pub register_index: u32,
    /// The register space (bind group).
    pub register_space: u32,
    /// The number of elements of a resource array, `0` for a single resource.
    pub array_size: u32,
    /// The stages that use the declaration.
    pub stages: ShaderStageFlags,
    /// What the declaration is.
    pub kind: ResourceDeclKind,
}

/// Metadata of a compiled shader program.
///
/// Implemented by shader frontends. Errors found while producing the metadata itself
/// are the frontend's business; everything it can't describe is returned as an
/// `Unsupported` value so reflection can report it.
pub trait ShaderMetadata {
    /// A human-readable name for the program.
    fn label(&self) -> &str;

    /// Inputs of the vertex stage.
    fn vertex_inputs(&self) -> Vec<InterfaceDecl>;

    /// Outputs of the fragment stage.
    fn fragment_outputs(&self) -> Vec<InterfaceDecl>;

    /// Every resource declaration used by at least one stage.
    fn resources(&self) -> Vec<ResourceDecl>;
}
