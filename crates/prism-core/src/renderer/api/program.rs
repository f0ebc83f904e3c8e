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

//! A loaded shader program and its reflection.

use crate::renderer::binding::ProgramVars;
use crate::renderer::error::{BindingError, ReflectionError};
use crate::renderer::reflection::{ProgramReflection, ShaderMetadata};
use crate::renderer::traits::GraphicsDevice;
use std::sync::Arc;

/// A shader program whose reflection succeeded.
///
/// A `Program` can't exist without a valid reflection, so a program that failed
/// reflection is never handed to the binding layer.
#[derive(Debug, Clone)]
pub struct Program {
    label: String,
    reflection: Arc<ProgramReflection>,
}

impl Program {
    /// Reflects `metadata` and wraps the result.
    pub fn create(
        label: impl Into<String>,
        metadata: &dyn ShaderMetadata,
    ) -> Result<Self, ReflectionError> {
        let label = label.into();
        let reflection = ProgramReflection::create(metadata).inspect_err(|err| {
            log::error!("Program '{label}' can't be used: {err}");
        })?;
        Ok(Self {
            label,
            reflection: Arc::new(reflection),
        })
    }

    /// The program's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The reflection shared by every binding table of this program.
    pub fn reflection(&self) -> &Arc<ProgramReflection> {
        &self.reflection
    }

    /// Creates a binding table laid out by the program's default root signature.
    pub fn create_vars(
        &self,
        device: &dyn GraphicsDevice,
        allocate_buffers: bool,
    ) -> Result<ProgramVars, BindingError> {
        ProgramVars::create(device, self.reflection.clone(), allocate_buffers, None)
    }
}
