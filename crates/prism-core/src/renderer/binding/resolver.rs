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

//! Maps a shader register to the root parameter that binds it.

use super::{DescriptorKind, RootSignature};

/// Finds the root parameter offset binding `(kind, register_index, register_space)`.
///
/// Root descriptors are searched first, then descriptor tables by the first register
/// of their range. Returns `None` when the signature doesn't bind the register.
pub fn find_root_offset(
    root_signature: &RootSignature,
    kind: DescriptorKind,
    register_index: u32,
    register_space: u32,
) -> Option<u32> {
    let desc = root_signature.desc();

    let root = desc.root_descriptors.iter().position(|descriptor| {
        descriptor.kind == kind
            && descriptor.register_index == register_index
            && descriptor.register_space == register_space
    });
    if let Some(offset) = root {
        return Some(offset as u32);
    }

    desc.descriptor_tables
        .iter()
        .position(|table| {
            table.ranges.first().is_some_and(|range| {
                range.kind == kind
                    && range.base_register == register_index
                    && range.register_space == register_space
            })
        })
        .map(|offset| (desc.root_descriptors.len() + offset) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::ShaderStageFlags;
    use crate::renderer::binding::{RootSignatureDesc, RootSignatureId};
    use crate::renderer::reflection::BindLocation;

    fn signature() -> RootSignature {
        let mut desc = RootSignatureDesc::new();
        desc.add_root_descriptor(DescriptorKind::Cbv, BindLocation::new(0, 0), ShaderStageFlags::ALL)
            .add_root_descriptor(DescriptorKind::Cbv, BindLocation::new(1, 0), ShaderStageFlags::ALL)
            .add_root_descriptor(DescriptorKind::Uav, BindLocation::new(0, 1), ShaderStageFlags::ALL)
            .add_descriptor_table(DescriptorKind::Srv, BindLocation::new(0, 0), 1, ShaderStageFlags::ALL)
            .add_descriptor_table(DescriptorKind::Srv, BindLocation::new(1, 0), 4, ShaderStageFlags::ALL)
            .add_descriptor_table(DescriptorKind::Sampler, BindLocation::new(0, 0), 1, ShaderStageFlags::ALL);
        RootSignature::new(RootSignatureId(1), desc).unwrap()
    }

    #[test]
    fn root_descriptors_come_first() {
        let signature = signature();
        assert_eq!(find_root_offset(&signature, DescriptorKind::Cbv, 0, 0), Some(0));
        assert_eq!(find_root_offset(&signature, DescriptorKind::Cbv, 1, 0), Some(1));
        assert_eq!(find_root_offset(&signature, DescriptorKind::Uav, 0, 1), Some(2));
    }

    #[test]
    fn tables_follow_root_descriptors() {
        let signature = signature();
        assert_eq!(find_root_offset(&signature, DescriptorKind::Srv, 0, 0), Some(3));
        assert_eq!(find_root_offset(&signature, DescriptorKind::Srv, 1, 0), Some(4));
        assert_eq!(find_root_offset(&signature, DescriptorKind::Sampler, 0, 0), Some(5));
    }

    #[test]
    fn category_and_space_must_match() {
        let signature = signature();
        assert_eq!(find_root_offset(&signature, DescriptorKind::Uav, 0, 0), None);
        assert_eq!(find_root_offset(&signature, DescriptorKind::Cbv, 0, 1), None);
        // Only the first register of a range identifies the table.
        assert_eq!(find_root_offset(&signature, DescriptorKind::Srv, 2, 0), None);
    }
}
