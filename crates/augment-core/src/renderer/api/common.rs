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

//! Small enums shared by descriptors and command encoders.

use super::texture::TextureFormat;

/// The format of the indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned integer indices.
    Uint16,
    /// 32-bit unsigned integer indices.
    Uint32,
}

impl IndexFormat {
    /// Size of a single index in bytes.
    pub const fn byte_size(self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Each vertex is a point.
    Point,
    /// Every two vertices form a line.
    Line,
    /// Every three vertices form a triangle.
    #[default]
    Triangle,
    /// Triangles share the two previous vertices.
    TriangleStrip,
}

/// The programmable stage a shader function runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader stage.
    Vertex,
    /// Fragment shader stage.
    Fragment,
    /// Compute shader stage.
    Compute,
}

/// The surface a frame is rendered into.
///
/// Render pipelines are compiled against these formats, so every module
/// receives the destination when building its pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderDestination {
    /// Pixel format of the color attachment.
    pub color_format: TextureFormat,
    /// Pixel format of the depth/stencil attachment.
    pub depth_stencil_format: TextureFormat,
    /// MSAA sample count.
    pub sample_count: u32,
}

impl Default for RenderDestination {
    fn default() -> Self {
        Self {
            color_format: TextureFormat::Bgra8UnormSrgb,
            depth_stencil_format: TextureFormat::Depth32FloatStencil8,
            sample_count: 1,
        }
    }
}
