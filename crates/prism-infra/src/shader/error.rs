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

use thiserror::Error;

/// A shader source could not be turned into metadata.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// The source is not valid WGSL.
    #[error("Failed to parse shader '{label}':\n{message}")]
    Parse {
        /// The label of the shader.
        label: String,
        /// The diagnostic, with source context.
        message: String,
    },
    /// The module parsed but failed validation.
    #[error("Shader '{label}' failed validation: {message}")]
    Validation {
        /// The label of the shader.
        label: String,
        /// The validator's diagnostic.
        message: String,
    },
}
