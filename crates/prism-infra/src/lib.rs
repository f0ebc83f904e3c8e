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

//! # Prism Infra
//!
//! Concrete implementations of the contracts defined in `prism-core`: a WGSL
//! shader-metadata frontend built on `naga` and a headless graphics backend that
//! allocates GPU objects in CPU memory and records binding commands.

#![warn(missing_docs)]

pub mod graphics;
pub mod shader;

pub use graphics::headless::{HeadlessDevice, RecordedCommand, RecordingCommandList};
pub use shader::{ShaderError, WgslModule};
