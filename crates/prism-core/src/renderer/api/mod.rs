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

//! Resource objects shared between the application, the binding tables and the backend.

pub mod buffer;
pub mod program;
pub mod shader_buffer;
pub mod texture;
pub mod typed_buffer;
pub mod util;
pub mod view;

pub use self::buffer::*;
pub use self::program::*;
pub use self::shader_buffer::{ConstantBuffer, StructuredBuffer};
pub use self::texture::*;
pub use self::typed_buffer::*;
pub use self::util::*;
pub use self::view::*;
