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

//! Defines the hierarchy of error types for the reflection and binding subsystem.
//!
//! Only construction-time failures are errors. Recoverable mistakes made while
//! binding resources (unknown names, wrong categories) are reported through the
//! `log` facade and a `false`/`None` return instead.

use crate::renderer::binding::DescriptorKind;
use crate::renderer::BindLocation;
use thiserror::Error;

/// Reflection of a compiled program failed.
///
/// The loader must refuse to use a program whose reflection failed.
#[derive(Debug, Error)]
pub enum ReflectionError {
    /// One or more declarations could not be represented.
    #[error("Reflection failed for program '{program}':\n{log}")]
    Failed {
        /// The label of the program being reflected.
        program: String,
        /// Every problem found, one per line.
        log: String,
    },
    /// A buffer declares a variable that ends past the buffer's size.
    #[error(
        "Variable '{variable}' of buffer '{buffer}' ends at byte {end}, past the buffer size of {size}"
    )]
    VariableOutOfBounds {
        /// The buffer name.
        buffer: String,
        /// The offending variable.
        variable: String,
        /// The end offset of the variable.
        end: usize,
        /// The declared buffer size.
        size: usize,
    },
}

/// An error related to the creation of a GPU resource (buffers, textures, samplers).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The requested size is zero or larger than the device can allocate.
    #[error("Invalid buffer size {size} for '{label}'")]
    InvalidSize {
        /// The label of the resource.
        label: String,
        /// The requested size.
        size: u64,
    },
    /// The requested format cannot be used the way it was asked.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// An error originating from the specific graphics backend implementation.
    #[error("Backend-specific resource error: {0}")]
    BackendError(String),
}

/// A pipeline layout description is malformed.
#[derive(Debug, Error)]
pub enum RootSignatureError {
    /// A descriptor table does not hold exactly one range.
    #[error("Descriptor table {table} has {ranges} ranges, expected exactly one")]
    InvalidTable {
        /// The index of the table inside the description.
        table: usize,
        /// The number of ranges found.
        ranges: usize,
    },
    /// A descriptor table range covers no register.
    #[error("Descriptor table {table} has an empty range")]
    EmptyRange {
        /// The index of the table inside the description.
        table: usize,
    },
}

/// Building a binding table failed.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A declaration has no matching slot in the pipeline layout.
    ///
    /// This means the reflection and the pipeline layout disagree.
    #[error(
        "Can't find a root signature slot for '{name}' ({kind:?} at register {} space {})",
        location.index,
        location.space
    )]
    UnresolvedLayout {
        /// The name of the declaration.
        name: String,
        /// The descriptor category searched.
        kind: DescriptorKind,
        /// The register of the declaration.
        location: BindLocation,
    },
    /// The default pipeline layout could not be built.
    #[error(transparent)]
    RootSignature(#[from] RootSignatureError),
    /// A backing buffer could not be allocated.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Binding settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings from '{path}': {source}")]
    Io {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings text is not valid RON.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
