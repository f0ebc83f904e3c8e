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

//! Runtime knobs of the binding tables, loadable from RON.

use crate::renderer::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling how [`ProgramVars`](crate::renderer::ProgramVars) treats
/// unbound slots.
///
/// ```ron
/// (
///     null_sampler_fallback: true,
///     warn_on_unbound_constant_buffers: false,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingSettings {
    /// Bind the null sampler placeholder to sampler slots left empty.
    /// Off by default: empty sampler slots are not bound at all.
    pub null_sampler_fallback: bool,
    /// Log a warning when a constant buffer slot is empty at commit time.
    pub warn_on_unbound_constant_buffers: bool,
}

impl Default for BindingSettings {
    fn default() -> Self {
        Self {
            null_sampler_fallback: false,
            warn_on_unbound_constant_buffers: true,
        }
    }
}

impl BindingSettings {
    /// Parses settings from a RON string. Missing fields keep their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::de::from_str(text)?)
    }

    /// Reads and parses a RON settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let settings = BindingSettings::from_ron_str("(null_sampler_fallback: true)").unwrap();
        assert!(settings.null_sampler_fallback);
        assert!(settings.warn_on_unbound_constant_buffers);
    }

    #[test]
    fn invalid_ron_is_an_error() {
        assert!(matches!(
            BindingSettings::from_ron_str("(null_sampler_fallback: 3"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = BindingSettings::from_file("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn pretty_round_trip() {
        let settings = BindingSettings {
            null_sampler_fallback: true,
            warn_on_unbound_constant_buffers: false,
        };
        let text = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(BindingSettings::from_ron_str(&text).unwrap(), settings);
    }
}
