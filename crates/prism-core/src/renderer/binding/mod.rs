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

//! Resource binding: root signature layouts, register-to-root-parameter resolution
//! and the per-program [`ProgramVars`] table.

mod program_vars;
pub mod resolver;
pub mod root_signature;
mod slot;

pub use self::program_vars::ProgramVars;
pub use self::resolver::find_root_offset;
pub use self::root_signature::{
    DescriptorKind, DescriptorRange, DescriptorTable, RootDescriptor, RootSignature,
    RootSignatureDesc, RootSignatureId,
};
pub use self::slot::BoundResource;
