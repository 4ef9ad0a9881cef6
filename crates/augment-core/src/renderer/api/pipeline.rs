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

//! Pipeline state descriptors and handles.
//!
//! Shader code is precompiled into a library; pipelines reference their entry
//! points by name and the device fails the compilation when a name is missing.

use super::common::{PrimitiveType, ShaderStage};
use super::indices::VertexAttribute;
use super::texture::TextureFormat;
use std::borrow::Cow;

/// An opaque handle to a compiled shader library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderLibraryId(pub usize);

/// An opaque handle to a compiled render pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPipelineId(pub usize);

/// An opaque handle to a compiled compute pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputePipelineId(pub usize);

/// An opaque handle to a depth-stencil state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateId(pub usize);

/// Component layout of a single vertex attribute.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float2,
    Float3,
    Float4,
    UShort4,
    UChar4Normalized,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub const fn size(self) -> u64 {
        match self {
            VertexFormat::Float2 => 8,
            VertexFormat::Float3 => 12,
            VertexFormat::Float4 => 16,
            VertexFormat::UShort4 => 8,
            VertexFormat::UChar4Normalized => 4,
        }
    }
}

/// One attribute inside a [`VertexLayoutDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// Shader location of the attribute.
    pub attribute: VertexAttribute,
    /// Component layout.
    pub format: VertexFormat,
    /// Byte offset inside the vertex.
    pub offset: u64,
    /// Buffer slot the attribute is fetched from.
    pub buffer_index: u32,
}

/// Describes how vertex buffers are laid out in memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayoutDescriptor {
    /// The attributes read by the vertex function.
    pub attributes: Vec<VertexAttributeDescriptor>,
    /// Distance in bytes between two consecutive vertices.
    pub stride: u64,
}

impl VertexLayoutDescriptor {
    /// Builds a tightly packed single-buffer layout from `(attribute, format)` pairs.
    pub fn packed(buffer_index: u32, attributes: &[(VertexAttribute, VertexFormat)]) -> Self {
        let mut offset = 0;
        let attributes = attributes
            .iter()
            .map(|&(attribute, format)| {
                let descriptor = VertexAttributeDescriptor {
                    attribute,
                    format,
                    offset,
                    buffer_index,
                };
                offset += format.size();
                descriptor
            })
            .collect();
        Self {
            attributes,
            stride: offset,
        }
    }

    /// Returns `true` if the layout feeds joint indices and weights.
    pub fn is_skinned(&self) -> bool {
        let has = |wanted| self.attributes.iter().any(|a| a.attribute == wanted);
        has(VertexAttribute::JointIndices) && has(VertexAttribute::JointWeights)
    }
}

/// How the fragment output is combined with the color attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Output replaces the attachment.
    #[default]
    Opaque,
    /// Source-over alpha blending.
    AlphaBlended,
    /// Output is added to the attachment.
    Additive,
}

/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

/// Depth comparison used by a depth-stencil state.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    Never,
    #[default]
    Less,
    LessEqual,
    Always,
}

/// Constant and slope-scaled depth offset, used by the shadow pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthBias {
    /// Constant bias.
    pub depth_bias: f32,
    /// Bias scaled by the polygon slope.
    pub slope_scale: f32,
    /// Maximum bias applied.
    pub clamp: f32,
}

/// A descriptor for compiling a render pipeline.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The library the functions are looked up in.
    pub library: ShaderLibraryId,
    /// Name of the vertex function.
    pub vertex_function: Cow<'a, str>,
    /// Name of the fragment function. `None` for depth-only pipelines.
    pub fragment_function: Option<Cow<'a, str>>,
    /// Vertex fetch layout, `None` when the vertex function reads raw buffers.
    pub vertex_layout: Option<VertexLayoutDescriptor>,
    /// Primitive topology class.
    pub primitive: PrimitiveType,
    /// Color attachment format, `None` for depth-only pipelines.
    pub color_format: Option<TextureFormat>,
    /// Depth attachment format.
    pub depth_format: Option<TextureFormat>,
    /// MSAA sample count.
    pub sample_count: u32,
    /// Color blending.
    pub blend: BlendMode,
}

impl RenderPipelineDescriptor<'_> {
    /// Iterates over the `(stage, name)` pairs the pipeline needs from its library.
    pub fn functions(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        std::iter::once((ShaderStage::Vertex, self.vertex_function.as_ref())).chain(
            self.fragment_function
                .as_deref()
                .map(|name| (ShaderStage::Fragment, name)),
        )
    }
}

/// A descriptor for a depth-stencil state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepthStencilDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Whether depth writes are enabled.
    pub depth_write_enabled: bool,
}

/// A descriptor for compiling a compute pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComputePipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The library the function is looked up in.
    pub library: ShaderLibraryId,
    /// Name of the kernel function.
    pub function: Cow<'a, str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_accumulates_offsets() {
        let layout = VertexLayoutDescriptor::packed(
            0,
            &[
                (VertexAttribute::Position, VertexFormat::Float3),
                (VertexAttribute::Texcoord, VertexFormat::Float2),
                (VertexAttribute::Normal, VertexFormat::Float3),
            ],
        );
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 20);
        assert_eq!(layout.stride, 32);
        assert!(!layout.is_skinned());
    }

    #[test]
    fn joint_attributes_mark_layout_as_skinned() {
        let layout = VertexLayoutDescriptor::packed(
            0,
            &[
                (VertexAttribute::Position, VertexFormat::Float3),
                (VertexAttribute::JointIndices, VertexFormat::UShort4),
                (VertexAttribute::JointWeights, VertexFormat::Float4),
            ],
        );
        assert!(layout.is_skinned());
    }

    #[test]
    fn depth_only_pipeline_lists_only_vertex_function() {
        let desc = RenderPipelineDescriptor {
            label: None,
            library: ShaderLibraryId(0),
            vertex_function: "anchorGeometryShadowVertex".into(),
            fragment_function: None,
            vertex_layout: None,
            primitive: PrimitiveType::Triangle,
            color_format: None,
            depth_format: Some(TextureFormat::Depth32Float),
            sample_count: 1,
            blend: BlendMode::Opaque,
        };
        let functions: Vec<_> = desc.functions().collect();
        assert_eq!(functions, vec![(ShaderStage::Vertex, "anchorGeometryShadowVertex")]);
    }
}
