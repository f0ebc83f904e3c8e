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

//! Static description of a compiled shader program: its stage interfaces, its constant
//! and structured buffers and its standalone resources.

mod buffer;
pub mod metadata;
mod name;
mod program;
mod resource;
mod variable;

pub use self::buffer::{BufferReflection, BufferType};
pub use self::metadata::{
    InterfaceDecl, ResourceDecl, ResourceDeclKind, ScalarKind, ShaderMetadata, ShaderType,
    StructMember, TextureShape, TextureShapeDim,
};
pub use self::program::ProgramReflection;
pub use self::resource::{
    BindLocation, Dimensions, Resource, ResourceKind, ResourceType, ReturnType, ShaderAccess,
};
pub use self::variable::{Variable, VariableType};
