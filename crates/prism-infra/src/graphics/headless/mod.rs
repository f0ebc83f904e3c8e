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

//! A backend without a GPU.
//!
//! [`HeadlessDevice`] hands out ids and 256-byte aligned GPU addresses from atomic
//! counters. [`RecordingCommandList`] keeps every command it receives, plus the bytes
//! written to each buffer, so a commit can be inspected or asserted on.

mod device;
mod recorder;

pub use self::device::HeadlessDevice;
pub use self::recorder::{RecordedCommand, RecordingCommandList};
