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

//! Parsing of variable paths such as `lights[2].color`.

/// One `.`-separated component of a variable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathSegment<'a> {
    pub ident: &'a str,
    pub index: Option<u32>,
}

/// Splits `name` into segments. Returns `None` for malformed names: empty
/// components, unbalanced brackets, non-numeric or repeated indices.
pub(crate) fn parse_path(name: &str) -> Option<Vec<PathSegment<'_>>> {
    name.split('.').map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> Option<PathSegment<'_>> {
    let (ident, index) = match segment.find('[') {
        Some(open) => {
            let rest = segment[open + 1..].strip_suffix(']')?;
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (&segment[..open], Some(rest.parse().ok()?))
        }
        None => (segment, None),
    };
    if ident.is_empty() || ident.contains(']') {
        return None;
    }
    Some(PathSegment { ident, index })
}
