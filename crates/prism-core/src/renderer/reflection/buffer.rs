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

//! Reflection of a constant or structured buffer.

use super::name::parse_path;
use super::{BindLocation, Resource, ShaderAccess, Variable};
use crate::renderer::api::ShaderStageFlags;
use crate::renderer::error::ReflectionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of a reflected buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferType {
    /// A constant (uniform) buffer.
    Constant,
    /// A structured (storage) buffer.
    Structured,
}

/// Why a variable lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LookupMiss {
    Malformed,
    NotFound(String),
    NotAnArray(String),
    MissingIndex(String),
    OutOfRange { name: String, index: u32, size: u32 },
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMiss::Malformed => write!(f, "the name is malformed"),
            LookupMiss::NotFound(name) => write!(f, "'{name}' is not declared"),
            LookupMiss::NotAnArray(name) => write!(f, "'{name}' is indexed but is not an array"),
            LookupMiss::MissingIndex(name) => {
                write!(f, "'{name}' is an array, but no index was provided")
            }
            LookupMiss::OutOfRange { name, index, size } => {
                write!(f, "index {index} is out of range for '{name}' with {size} elements")
            }
        }
    }
}

/// The layout of one constant or structured buffer.
///
/// Variables are stored flattened: members of nested structures use dotted names
/// (`light.color`) and members of arrays of structures are stored once, at the offset
/// of element 0 (`lights.color`). [`BufferReflection::variable_data`] accepts indexed
/// paths (`lights[3].color`) and computes the element offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferReflection {
    name: String,
    register_index: u32,
    register_space: u32,
    ty: BufferType,
    access: ShaderAccess,
    size: usize,
    variables: BTreeMap<String, Variable>,
    resources: BTreeMap<String, Resource>,
    shader_mask: ShaderStageFlags,
}

impl BufferReflection {
    /// Creates a buffer reflection.
    ///
    /// Constant buffers are always read-only; `access` is ignored for them.
    /// Fails if a variable with a known size ends past `size`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        name: impl Into<String>,
        register_index: u32,
        register_space: u32,
        ty: BufferType,
        access: ShaderAccess,
        size: usize,
        variables: BTreeMap<String, Variable>,
        resources: BTreeMap<String, Resource>,
    ) -> Result<Self, ReflectionError> {
        let name = name.into();
        for (variable_name, variable) in &variables {
            if let Some(end) = variable.end_offset() {
                if end > size {
                    return Err(ReflectionError::VariableOutOfBounds {
                        buffer: name,
                        variable: variable_name.clone(),
                        end,
                        size,
                    });
                }
            }
        }
        let access = match ty {
            BufferType::Constant => ShaderAccess::Read,
            BufferType::Structured => access,
        };
        Ok(Self {
            name,
            register_index,
            register_space,
            ty,
            access,
            size,
            variables,
            resources,
            shader_mask: ShaderStageFlags::NONE,
        })
    }

    /// Sets the stages that use the buffer.
    pub fn with_shader_mask(mut self, shader_mask: ShaderStageFlags) -> Self {
        self.shader_mask = shader_mask;
        self
    }

    /// Finds a variable and computes its byte offset.
    ///
    /// `name` may index arrays at any level (`lights[2].color`). A bare array name is
    /// only accepted as element 0 when `allow_non_indexed_array` is set. Misses are
    /// logged and return `None`.
    pub fn variable_data(
        &self,
        name: &str,
        allow_non_indexed_array: bool,
    ) -> Option<(&Variable, usize)> {
        match self.lookup(name, allow_non_indexed_array) {
            Ok(found) => Some(found),
            Err(miss) => {
                log::warn!(
                    "Can't find variable '{name}' in buffer '{}': {miss}",
                    self.name
                );
                None
            }
        }
    }

    /// The quiet version of [`Self::variable_data`], used when searching several buffers.
    pub(crate) fn lookup(
        &self,
        name: &str,
        allow_non_indexed_array: bool,
    ) -> Result<(&Variable, usize), LookupMiss> {
        let segments = parse_path(name).ok_or(LookupMiss::Malformed)?;

        let mut key = String::with_capacity(name.len());
        let mut element_offset = 0usize;
        let mut found = None;
        for segment in segments {
            if !key.is_empty() {
                key.push('.');
            }
            key.push_str(segment.ident);
            let variable = self
                .variables
                .get(&key)
                .ok_or_else(|| LookupMiss::NotFound(key.clone()))?;

            match segment.index {
                Some(index) => {
                    if !variable.is_array() {
                        return Err(LookupMiss::NotAnArray(key));
                    }
                    if !variable.is_unbounded() && index >= variable.array_size {
                        return Err(LookupMiss::OutOfRange {
                            name: key,
                            index,
                            size: variable.array_size,
                        });
                    }
                    element_offset += index as usize * variable.array_stride as usize;
                }
                None if variable.is_array() && !allow_non_indexed_array => {
                    return Err(LookupMiss::MissingIndex(key));
                }
                None => {}
            }
            found = Some(variable);
        }

        let variable = found.ok_or(LookupMiss::Malformed)?;
        Ok((variable, variable.location + element_offset))
    }

    /// Finds a resource declared inside the buffer.
    pub fn resource_data(&self, name: &str) -> Option<&Resource> {
        let resource = self.resources.get(name);
        if resource.is_none() {
            log::warn!("Can't find resource '{name}' in buffer '{}'", self.name);
        }
        resource
    }

    /// Every variable, keyed by flattened name.
    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    /// Every resource declared inside the buffer.
    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    /// The number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// The buffer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The buffer size in bytes.
    pub fn required_size(&self) -> usize {
        self.size
    }

    /// The buffer kind.
    pub fn ty(&self) -> BufferType {
        self.ty
    }

    /// Whether the shader writes the buffer.
    pub fn access(&self) -> ShaderAccess {
        self.access
    }

    /// The stages that use the buffer.
    pub fn shader_mask(&self) -> ShaderStageFlags {
        self.shader_mask
    }

    /// The register index.
    pub fn register_index(&self) -> u32 {
        self.register_index
    }

    /// The register space.
    pub fn register_space(&self) -> u32 {
        self.register_space
    }

    /// The register coordinate.
    pub fn location(&self) -> BindLocation {
        BindLocation::new(self.register_index, self.register_space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::reflection::VariableType;

    /// ```wgsl
    /// struct Shadow { bias: f32, weights: array<f32, 2> }   // span 16, weights stride 4 at 4
    /// struct Light { color: vec3f, shadow: Shadow }         // span 32, shadow at 16
    /// struct PerFrame {
    ///     viewProj: mat4x4f,          // 0
    ///     arr: array<vec4f, 4>,       // 64, stride 16
    ///     lights: array<Light, 3>,    // 128, stride 32
    ///     sun: Light,                 // 224
    /// }                               // 256
    /// ```
    fn per_frame() -> BufferReflection {
        let mut variables = BTreeMap::new();
        let mut add = |name: &str, variable: Variable| {
            variables.insert(name.to_owned(), variable);
        };
        add("viewProj", Variable::scalar(0, VariableType::Float4x4));
        add("arr", Variable::array(64, VariableType::Float4, 4, 16));
        add("lights", Variable::array(128, VariableType::Struct, 3, 32));
        add("lights.color", Variable::scalar(128, VariableType::Float3));
        add("lights.shadow", Variable::scalar(144, VariableType::Struct));
        add("lights.shadow.bias", Variable::scalar(144, VariableType::Float));
        add("lights.shadow.weights", Variable::array(148, VariableType::Float, 2, 4));
        add("sun", Variable::scalar(224, VariableType::Struct));
        add("sun.color", Variable::scalar(224, VariableType::Float3));
        add("sun.shadow", Variable::scalar(240, VariableType::Struct));
        add("sun.shadow.bias", Variable::scalar(240, VariableType::Float));
        add("sun.shadow.weights", Variable::array(244, VariableType::Float, 2, 4));

        BufferReflection::create(
            "PerFrameCB",
            0,
            0,
            BufferType::Constant,
            ShaderAccess::ReadWrite,
            256,
            variables,
            BTreeMap::new(),
        )
        .unwrap()
    }

    fn offset(buffer: &BufferReflection, name: &str, allow: bool) -> Option<usize> {
        buffer.variable_data(name, allow).map(|(_, offset)| offset)
    }

    #[test]
    fn constant_buffers_are_read_only() {
        assert_eq!(per_frame().access(), ShaderAccess::Read);
    }

    #[test]
    fn bare_array_name_matches_element_zero() {
        let buffer = per_frame();
        assert_eq!(offset(&buffer, "arr", true), offset(&buffer, "arr[0]", false));
        assert_eq!(offset(&buffer, "arr", true), Some(64));
        assert_eq!(offset(&buffer, "arr", false), None);
    }

    #[test]
    fn indices_add_strides() {
        let buffer = per_frame();
        assert_eq!(offset(&buffer, "arr[3]", false), Some(64 + 48));
        assert_eq!(offset(&buffer, "lights[2].color", false), Some(128 + 64));
        assert_eq!(
            offset(&buffer, "lights[1].shadow.weights[1]", false),
            Some(148 + 32 + 4)
        );
        assert_eq!(offset(&buffer, "sun.shadow.bias", false), Some(240));
    }

    #[test]
    fn intermediate_arrays_need_an_index() {
        let buffer = per_frame();
        assert_eq!(offset(&buffer, "lights.color", false), None);
        assert_eq!(offset(&buffer, "lights.color", true), Some(128));
    }

    #[test]
    fn misses_return_none() {
        let buffer = per_frame();
        assert_eq!(offset(&buffer, "arr[4]", false), None);
        assert_eq!(offset(&buffer, "viewProj[0]", false), None);
        assert_eq!(offset(&buffer, "ViewProj", false), None);
        assert_eq!(offset(&buffer, "sun.radius", false), None);
        assert_eq!(offset(&buffer, "arr[1", false), None);

        assert!(matches!(
            buffer.lookup("arr[9]", false),
            Err(LookupMiss::OutOfRange { index: 9, size: 4, .. })
        ));
        assert!(matches!(buffer.lookup("arr", false), Err(LookupMiss::MissingIndex(_))));
    }

    #[test]
    fn returned_variable_is_the_leaf() {
        let buffer = per_frame();
        let (variable, _) = buffer.variable_data("lights[0].shadow.bias", false).unwrap();
        assert_eq!(variable.ty, VariableType::Float);
    }

    #[test]
    fn unbounded_arrays_accept_any_index() {
        let mut variables = BTreeMap::new();
        variables.insert("count".to_owned(), Variable::scalar(0, VariableType::Uint));
        variables.insert(
            "values".to_owned(),
            Variable::array(16, VariableType::Float4, Variable::UNBOUNDED_ARRAY, 16),
        );
        let buffer = BufferReflection::create(
            "data",
            1,
            0,
            BufferType::Structured,
            ShaderAccess::ReadWrite,
            32,
            variables,
            BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(buffer.access(), ShaderAccess::ReadWrite);
        assert_eq!(offset(&buffer, "values[10]", false), Some(16 + 160));
    }

    #[test]
    fn undersized_buffer_is_rejected() {
        let mut variables = BTreeMap::new();
        variables.insert("m".to_owned(), Variable::scalar(0, VariableType::Float4x4));
        let result = BufferReflection::create(
            "tiny",
            0,
            0,
            BufferType::Constant,
            ShaderAccess::Read,
            32,
            variables,
            BTreeMap::new(),
        );
        assert!(matches!(
            result,
            Err(ReflectionError::VariableOutOfBounds { end: 64, size: 32, .. })
        ));
    }
}
