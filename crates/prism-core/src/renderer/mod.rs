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

//! Provides the public, backend-agnostic rendering contracts for Prism.
//!
//! This module defines the "common language" shared by the application layer and a
//! concrete graphics backend. It contains the abstract `traits` (like [`GraphicsDevice`]
//! and [`CommandRecorder`]), the resource objects bound to shaders, the shader
//! [`reflection`] model and the [`binding`] tables built on top of it.
//!
//! The 'what' of binding lives here; the 'how' (parsing a concrete shader language,
//! allocating GPU memory, encoding commands) is provided by the `prism-infra` crate,
//! which implements these traits.

pub mod api;
pub mod binding;
pub mod error;
pub mod reflection;
pub mod settings;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::binding::{
    BoundResource, DescriptorKind, ProgramVars, RootSignature, RootSignatureDesc,
    RootSignatureId,
};
pub use self::error::{
    BindingError, ReflectionError, ResourceError, RootSignatureError, SettingsError,
};
pub use self::reflection::{
    BindLocation, BufferReflection, BufferType, ProgramReflection, Resource, ResourceType,
    ShaderAccess, ShaderMetadata, Variable, VariableType,
};
pub use self::settings::BindingSettings;
pub use self::traits::{CommandRecorder, GraphicsDevice};
