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

//! Reflection of a single shader variable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The data type of a reflected variable.
///
/// Matrix variants are named `Float{rows}x{columns}`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VariableType {
    #[default]
    Unknown,
    Bool,
    Bool2,
    Bool3,
    Bool4,
    Uint,
    Uint2,
    Uint3,
    Uint4,
    Uint64,
    Uint64_2,
    Uint64_3,
    Uint64_4,
    Int,
    Int2,
    Int3,
    Int4,
    Int64,
    Int64_2,
    Int64_3,
    Int64_4,
    Float,
    Float2,
    Float3,
    Float4,
    Float2x2,
    Float2x3,
    Float2x4,
    Float3x2,
    Float3x3,
    Float3x4,
    Float4x2,
    Float4x3,
    Float4x4,
    /// A pointer into GPU memory.
    GpuPtr,
    /// A resource declared inside a buffer.
    Resource,
    /// An aggregate. Its members are reflected as separate variables.
    Struct,
}

impl VariableType {
    /// The size in bytes of one element, or `None` for types without an intrinsic size.
    ///
    /// Matrices use the padded column layout: two-row columns take 8 bytes per 32-bit
    /// component pair, three and four-row columns take 16 bytes.
    pub fn byte_size(self) -> Option<usize> {
        use VariableType::*;
        let size = match self {
            Bool | Uint | Int | Float => 4,
            Bool2 | Uint2 | Int2 | Float2 => 8,
            Bool3 | Uint3 | Int3 | Float3 => 12,
            Bool4 | Uint4 | Int4 | Float4 => 16,
            Uint64 | Int64 | GpuPtr => 8,
            Uint64_2 | Int64_2 => 16,
            Uint64_3 | Int64_3 => 24,
            Uint64_4 | Int64_4 => 32,
            Float2x2 => 16,
            Float3x2 => 24,
            Float4x2 => 32,
            Float2x3 | Float2x4 => 32,
            Float3x3 | Float3x4 => 48,
            Float4x3 | Float4x4 => 64,
            Unknown | Resource | Struct => return None,
        };
        Some(size)
    }

    /// Returns `true` for scalar and vector types, the only types allowed on stage interfaces.
    pub fn is_scalar_or_vector(self) -> bool {
        use VariableType::*;
        !matches!(
            self,
            Unknown
                | GpuPtr
                | Resource
                | Struct
                | Float2x2
                | Float2x3
                | Float2x4
                | Float3x2
                | Float3x3
                | Float3x4
                | Float4x2
                | Float4x3
                | Float4x4
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A reflected variable: a buffer member, a vertex attribute or a fragment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variable {
    /// Byte offset from the start of the buffer, or the slot of a stage-interface variable.
    /// For members of arrays of structures this is the offset inside element 0.
    pub location: usize,
    /// The number of array elements, or `0` if not an array.
    pub array_size: u32,
    /// The distance in bytes between array elements, or `0` if not an array.
    pub array_stride: u32,
    /// For matrices, whether the matrix is stored row-major.
    pub is_row_major: bool,
    /// The data type.
    pub ty: VariableType,
}

impl Variable {
    /// Array size used for runtime-sized arrays.
    pub const UNBOUNDED_ARRAY: u32 = u32::MAX;

    /// A non-array variable.
    pub fn scalar(location: usize, ty: VariableType) -> Self {
        Self {
            location,
            ty,
            ..Default::default()
        }
    }

    /// An array variable.
    pub fn array(location: usize, ty: VariableType, array_size: u32, array_stride: u32) -> Self {
        debug_assert!(array_size > 0 && array_stride > 0);
        Self {
            location,
            array_size,
            array_stride,
            is_row_major: false,
            ty,
        }
    }

    /// Returns `true` if the variable is an array.
    pub fn is_array(&self) -> bool {
        self.array_size > 0
    }

    /// Returns `true` if the variable is a runtime-sized array.
    pub fn is_unbounded(&self) -> bool {
        self.array_size == Self::UNBOUNDED_ARRAY
    }

    /// The end offset of the variable's storage, when it can be computed.
    pub fn end_offset(&self) -> Option<usize> {
        if self.is_unbounded() {
            return None;
        }
        let element = self.ty.byte_size()?;
        if self.is_array() {
            let last = (self.array_size as usize - 1) * self.array_stride as usize;
            Some(self.location + last + element)
        } else {
            Some(self.location + element)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_sizes_use_padded_columns() {
        assert_eq!(VariableType::Float4x4.byte_size(), Some(64));
        assert_eq!(VariableType::Float3x3.byte_size(), Some(48));
        assert_eq!(VariableType::Float2x2.byte_size(), Some(16));
        assert_eq!(VariableType::Struct.byte_size(), None);
    }

    #[test]
    fn end_offset_of_arrays() {
        let single = Variable::scalar(16, VariableType::Float3);
        assert_eq!(single.end_offset(), Some(28));

        let array = Variable::array(32, VariableType::Float, 4, 16);
        assert_eq!(array.end_offset(), Some(32 + 48 + 4));

        let unbounded = Variable::array(16, VariableType::Uint, Variable::UNBOUNDED_ARRAY, 4);
        assert!(unbounded.end_offset().is_none());
    }

    #[test]
    fn interface_types() {
        assert!(VariableType::Float4.is_scalar_or_vector());
        assert!(VariableType::Uint.is_scalar_or_vector());
        assert!(!VariableType::Float4x4.is_scalar_or_vector());
        assert!(!VariableType::Struct.is_scalar_or_vector());
    }
}
