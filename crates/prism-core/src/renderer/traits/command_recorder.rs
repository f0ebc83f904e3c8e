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

use crate::renderer::api::{Buffer, DescriptorView, GpuAddress, ResourceRef, ResourceState};
use crate::renderer::binding::{DescriptorKind, RootSignature};

/// A trait for an object that records the commands produced by a binding commit.
///
/// Commands must be kept in the order they are recorded. Root parameter offsets index
/// the root descriptors first, then the descriptor tables, as described by
/// [`RootSignatureDesc`](crate::renderer::RootSignatureDesc).
pub trait CommandRecorder {
    /// Makes `root_signature` the layout for the following root parameters.
    fn set_root_signature(&mut self, root_signature: &RootSignature);

    /// Records a copy of `data` into `buffer` at byte `offset`.
    fn write_buffer(&mut self, buffer: &Buffer, offset: u64, data: &[u8]);

    /// Records a transition of `resource` into `state`.
    fn resource_barrier(&mut self, resource: ResourceRef, state: ResourceState);

    /// Binds a buffer address directly to a root descriptor.
    fn set_root_descriptor(&mut self, root_offset: u32, kind: DescriptorKind, address: GpuAddress);

    /// Writes `view` into the single-range descriptor table at `root_offset`.
    fn set_descriptor_table(&mut self, root_offset: u32, view: &DescriptorView);
}
