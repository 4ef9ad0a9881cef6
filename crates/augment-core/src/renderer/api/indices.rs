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

//! Binding slots shared between the CPU side and the shader sources.
//!
//! The numeric values are part of the shader ABI: shaders declare their inputs
//! with these exact indices, so variants must never be reordered.

/// Buffer binding slots.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BufferIndex {
    MeshPositions = 0,
    MeshGenerics,
    AnchorInstanceUniforms,
    SharedUniforms,
    MaterialUniforms,
    TrackingPointData,
    MeshPalettes,
    MeshPaletteIndex,
    MeshPaletteSize,
    AnchorEffectsUniforms,
    EnvironmentUniforms,
    PrecalculationOutputBuffer,
    DrawCallIndex,
    DrawCallGroupIndex,
    RawVertexData,
    CameraVertices,
    SceneVertices,
    LodRoughness,
    InstanceCount,
}

impl BufferIndex {
    /// The slot number passed to the encoder.
    #[inline]
    pub const fn slot(self) -> u32 {
        self as u32
    }
}

/// Texture binding slots.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TextureIndex {
    Color = 0,
    Y,
    CbCr,
    Metallic,
    Roughness,
    Normal,
    AmbientOcclusion,
    EmissionMap,
    SubsurfaceMap,
    SpecularMap,
    SpecularTintMap,
    AnisotropicMap,
    SheenMap,
    SheenTintMap,
    ClearcoatMap,
    ClearcoatGlossMap,
    EnvironmentMap,
    DiffuseIblMap,
    SpecularIblMap,
    BrdfLookupMap,
    ShadowMap,
}

impl TextureIndex {
    /// The slot number passed to the encoder.
    #[inline]
    pub const fn slot(self) -> u32 {
        self as u32
    }
}

/// Vertex attribute locations.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexAttribute {
    Position = 0,
    Texcoord,
    Normal,
    Tangent,
    JointIndices,
    JointWeights,
    Color,
}

impl VertexAttribute {
    /// The attribute location used in vertex descriptors.
    #[inline]
    pub const fn location(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_shader_header_order() {
        assert_eq!(BufferIndex::MeshPositions.slot(), 0);
        assert_eq!(BufferIndex::AnchorInstanceUniforms.slot(), 2);
        assert_eq!(BufferIndex::EnvironmentUniforms.slot(), 10);
        assert_eq!(BufferIndex::InstanceCount.slot(), 18);
        assert_eq!(TextureIndex::CbCr.slot(), 2);
        assert_eq!(TextureIndex::ShadowMap.slot(), 20);
        assert_eq!(VertexAttribute::JointWeights.location(), 5);
    }
}
