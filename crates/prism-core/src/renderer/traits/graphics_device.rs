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

use crate::renderer::api::*;
use crate::renderer::binding::{RootSignature, RootSignatureDesc};
use crate::renderer::error::{ResourceError, RootSignatureError};
use std::fmt::Debug;
use std::sync::Arc;

/// Creates the GPU objects bound by [`ProgramVars`](crate::renderer::ProgramVars).
///
/// Implementations must be usable from several threads at once.
pub trait GraphicsDevice: Send + Sync + Debug {
    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// ## Returns
    /// A `Result` containing the created buffer or an error if the creation fails.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<Arc<Buffer>, ResourceError>;

    /// Creates a new texture.
    /// ## Arguments
    /// * `descriptor` - A reference to a `TextureDescriptor` containing the texture configuration.
    /// ## Returns
    /// A `Result` containing the created texture or an error if the creation fails.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, ResourceError>;

    /// Creates a new sampler.
    /// ## Arguments
    /// * `descriptor` - A reference to a `SamplerDescriptor` containing the filtering configuration.
    /// ## Returns
    /// A `Result` containing the created sampler or an error if the creation fails.
    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<Sampler>, ResourceError>;

    /// Creates a root signature.
    /// ## Arguments
    /// * `descriptor` - The layout of root descriptors and descriptor tables.
    /// ## Errors
    /// * `RootSignatureError` - If the layout has a table with no range or with several.
    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDesc,
    ) -> Result<Arc<RootSignature>, RootSignatureError>;
}
