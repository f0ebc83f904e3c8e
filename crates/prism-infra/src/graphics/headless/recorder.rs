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

use prism_core::renderer::{
    Buffer, BufferId, CommandRecorder, DescriptorKind, DescriptorView, GpuAddress, ResourceRef,
    ResourceState, RootSignature, RootSignatureId,
};
use std::collections::HashMap;
use std::fmt;

/// A command captured by a [`RecordingCommandList`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// A root signature was set.
    SetRootSignature(RootSignatureId),
    /// Bytes were written to a buffer.
    WriteBuffer {
        /// The destination buffer.
        buffer: BufferId,
        /// The destination offset in bytes.
        offset: u64,
        /// The number of bytes written.
        size: u64,
    },
    /// A resource was transitioned.
    Barrier {
        /// The transitioned object.
        resource: ResourceRef,
        /// The new state.
        state: ResourceState,
    },
    /// An address was bound to a root descriptor.
    RootDescriptor {
        /// The root parameter offset.
        root_offset: u32,
        /// The descriptor category.
        kind: DescriptorKind,
        /// The bound address. Zero for the null address.
        address: GpuAddress,
    },
    /// A view was written into a descriptor table.
    DescriptorTable {
        /// The root parameter offset.
        root_offset: u32,
        /// The written view.
        view: DescriptorView,
    },
}

impl fmt::Display for RecordedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedCommand::SetRootSignature(id) => write!(f, "set_root_signature {}", id.0),
            RecordedCommand::WriteBuffer {
                buffer,
                offset,
                size,
            } => write!(f, "write_buffer buffer {} [{offset}..{}]", buffer.0, offset + size),
            RecordedCommand::Barrier { resource, state } => {
                write!(f, "barrier {resource:?} -> {state:?}")
            }
            RecordedCommand::RootDescriptor {
                root_offset,
                kind,
                address,
            } => write!(f, "root[{root_offset}] {kind:?} @ {:#x}", address.0),
            RecordedCommand::DescriptorTable { root_offset, view } if view.is_null() => {
                write!(f, "table[{root_offset}] null {:?}", view.kind)
            }
            RecordedCommand::DescriptorTable { root_offset, view } => {
                write!(f, "table[{root_offset}] {:?} {:?}", view.kind, view.target)
            }
        }
    }
}

/// A [`CommandRecorder`] that stores what it receives.
#[derive(Debug, Default)]
pub struct RecordingCommandList {
    commands: Vec<RecordedCommand>,
    buffer_contents: HashMap<BufferId, Vec<u8>>,
}

impl RecordingCommandList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands recorded so far, in order.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Removes and returns the recorded commands. Buffer contents are kept.
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The bytes written to `buffer`, or `None` if nothing was written to it.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffer_contents.get(&buffer).map(Vec::as_slice)
    }
}

impl CommandRecorder for RecordingCommandList {
    fn set_root_signature(&mut self, root_signature: &RootSignature) {
        self.commands
            .push(RecordedCommand::SetRootSignature(root_signature.id()));
    }

    fn write_buffer(&mut self, buffer: &Buffer, offset: u64, data: &[u8]) {
        let end = offset as usize + data.len();
        assert!(
            end as u64 <= buffer.size(),
            "write of {} bytes at offset {offset} overflows buffer {:?} of {} bytes",
            data.len(),
            buffer.id(),
            buffer.size()
        );
        let contents = self
            .buffer_contents
            .entry(buffer.id())
            .or_insert_with(|| vec![0; buffer.size() as usize]);
        contents[offset as usize..end].copy_from_slice(data);

        self.commands.push(RecordedCommand::WriteBuffer {
            buffer: buffer.id(),
            offset,
            size: data.len() as u64,
        });
    }

    fn resource_barrier(&mut self, resource: ResourceRef, state: ResourceState) {
        self.commands
            .push(RecordedCommand::Barrier { resource, state });
    }

    fn set_root_descriptor(&mut self, root_offset: u32, kind: DescriptorKind, address: GpuAddress) {
        self.commands.push(RecordedCommand::RootDescriptor {
            root_offset,
            kind,
            address,
        });
    }

    fn set_descriptor_table(&mut self, root_offset: u32, view: &DescriptorView) {
        self.commands.push(RecordedCommand::DescriptorTable {
            root_offset,
            view: *view,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::headless::HeadlessDevice;
    use prism_core::renderer::{BufferDescriptor, BufferUsage, GraphicsDevice};

    #[test]
    fn writes_accumulate_in_buffer_contents() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 8,
                usage: BufferUsage::COPY_DST,
            })
            .unwrap();
        let mut list = RecordingCommandList::new();
        assert!(list.buffer_contents(buffer.id()).is_none());

        list.write_buffer(&buffer, 4, &[1, 2, 3, 4]);
        list.write_buffer(&buffer, 0, &[9]);
        assert_eq!(
            list.buffer_contents(buffer.id()),
            Some(&[9, 0, 0, 0, 1, 2, 3, 4][..])
        );
        assert_eq!(list.commands().len(), 2);
        assert_eq!(
            list.commands()[0].to_string(),
            format!("write_buffer buffer {} [4..8]", buffer.id().0)
        );

        let taken = list.take_commands();
        assert_eq!(taken.len(), 2);
        assert!(list.commands().is_empty());
        assert!(list.buffer_contents(buffer.id()).is_some());
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn out_of_bounds_write_is_fatal() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 4,
                usage: BufferUsage::COPY_DST,
            })
            .unwrap();
        RecordingCommandList::new().write_buffer(&buffer, 2, &[0; 4]);
    }
}
