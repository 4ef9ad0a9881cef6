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

//! CPU mirrors of the structures the shaders read.
//!
//! Every struct is `#[repr(C)]` and [`bytemuck::Pod`] so it can be written into
//! a ring slot without conversion. Vectors are padded to 16 bytes the same way
//! the shading language lays them out, and the padding is spelled out in
//! explicit fields so the structs stay free of implicit padding.

use bytemuck::{Pod, Zeroable};

/// Column-major 4x4 matrix as stored on the GPU.
pub type GpuMat4 = [[f32; 4]; 4];

/// Column-major 3x3 matrix, each column padded to four floats.
pub type GpuMat3 = [[f32; 4]; 3];

/// Number of material properties a level-of-detail blend can weigh.
pub const MAP_WEIGHT_COUNT: usize = 14;

/// The identity matrix in GPU layout.
pub const GPU_IDENTITY: GpuMat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// The 3x3 identity matrix in GPU layout.
pub const GPU_IDENTITY3: GpuMat3 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

/// Per-frame camera data shared by every module.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SharedUniforms {
    /// Camera to clip space.
    pub projection_matrix: GpuMat4,
    /// World to camera space.
    pub view_matrix: GpuMat4,
    /// Non-zero when the depth matte is active.
    pub use_depth: i32,
    pub(crate) _padding: [i32; 3],
}

impl SharedUniforms {
    /// Creates shared uniforms from the camera matrices.
    pub fn new(projection_matrix: GpuMat4, view_matrix: GpuMat4, use_depth: bool) -> Self {
        Self {
            projection_matrix,
            view_matrix,
            use_depth: use_depth as i32,
            _padding: [0; 3],
        }
    }
}

/// Lighting terms for one instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EnvironmentUniforms {
    /// Linear RGB ambient color.
    pub ambient_light_color: [f32; 3],
    /// Ambient intensity, normalised so that 1000 lumens is 1.0.
    pub ambient_light_intensity: f32,
    /// Direction of the key light in world space.
    pub directional_light_direction: [f32; 3],
    /// Non-zero when an environment probe texture is bound.
    pub has_environment_map: i32,
    /// Linear RGB key light color.
    pub directional_light_color: [f32; 3],
    pub(crate) _padding: f32,
    /// Light-space transform used by the shadow lookup.
    pub directional_light_mvp: GpuMat4,
    /// Transform from world space into shadow map texture space.
    pub shadow_mvp_transform_matrix: GpuMat4,
}

impl Default for EnvironmentUniforms {
    fn default() -> Self {
        Self {
            ambient_light_color: [0.5, 0.5, 0.5],
            ambient_light_intensity: 1.0,
            directional_light_direction: [0.0, -1.0, 0.0],
            has_environment_map: 0,
            directional_light_color: [1.0, 1.0, 1.0],
            _padding: 0.0,
            directional_light_mvp: GPU_IDENTITY,
            shadow_mvp_transform_matrix: GPU_IDENTITY,
        }
    }
}

/// Transforms for one instance of an anchored model.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AnchorInstanceUniforms {
    /// Zero when the slot holds no geometry this frame.
    pub has_geometry: i32,
    /// Non-zero when `heading_transform` applies.
    pub has_heading: i32,
    /// `0` for absolute headings, `1` for relative headings.
    pub heading_type: i32,
    pub(crate) _padding: i32,
    /// Rotation offset of the heading.
    pub heading_transform: GpuMat4,
    /// Placement of the instance in world space.
    pub location_transform: GpuMat4,
    /// Node transform of the mesh inside its asset.
    pub world_transform: GpuMat4,
    /// Final model matrix.
    pub model_matrix: GpuMat4,
    /// Inverse transpose of the model matrix.
    pub normal_matrix: GpuMat3,
    /// Level-of-detail blend weights.
    pub map_weights: [f32; MAP_WEIGHT_COUNT],
    pub(crate) _padding2: [f32; 2],
}

impl AnchorInstanceUniforms {
    /// A slot that renders nothing.
    pub fn empty() -> Self {
        Self {
            has_geometry: 0,
            has_heading: 0,
            heading_type: 0,
            _padding: 0,
            heading_transform: GPU_IDENTITY,
            location_transform: GPU_IDENTITY,
            world_transform: GPU_IDENTITY,
            model_matrix: GPU_IDENTITY,
            normal_matrix: GPU_IDENTITY3,
            map_weights: [1.0; MAP_WEIGHT_COUNT],
            _padding2: [0.0; 2],
        }
    }
}

impl Default for AnchorInstanceUniforms {
    fn default() -> Self {
        Self::empty()
    }
}

/// Visual effects applied to one instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AnchorEffectsUniforms {
    /// Multiplicative color tint.
    pub tint: [f32; 3],
    /// Opacity.
    pub alpha: f32,
    /// Emissive boost.
    pub glow: f32,
    pub(crate) _padding: [f32; 3],
    /// Extra scale applied in model space.
    pub scale: GpuMat4,
}

impl AnchorEffectsUniforms {
    /// Creates an effects block from explicit values.
    pub fn new(alpha: f32, glow: f32, tint: [f32; 3], scale: GpuMat4) -> Self {
        Self {
            tint,
            alpha,
            glow,
            _padding: [0.0; 3],
            scale,
        }
    }
}

impl Default for AnchorEffectsUniforms {
    fn default() -> Self {
        Self::new(1.0, 0.0, [1.0, 1.0, 1.0], GPU_IDENTITY)
    }
}

/// Constant material properties of a submesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[allow(missing_docs)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    pub emission_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub ambient_occlusion: f32,
    pub opacity: f32,
    pub subsurface: f32,
    pub specular: f32,
    pub specular_tint: f32,
    pub anisotropic: f32,
    pub sheen: f32,
    pub sheen_tint: f32,
    pub clearcoat: f32,
    pub clearcoat_gloss: f32,
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            emission_color: [0.0, 0.0, 0.0, 1.0],
            roughness: 1.0,
            metalness: 0.0,
            ambient_occlusion: 1.0,
            opacity: 1.0,
            subsurface: 0.0,
            specular: 0.5,
            specular_tint: 0.0,
            anisotropic: 0.0,
            sheen: 0.0,
            sheen_tint: 0.0,
            clearcoat: 0.0,
            clearcoat_gloss: 0.0,
        }
    }
}

/// Everything a vertex function needs for one draw call, computed once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[allow(missing_docs)]
pub struct PrecalculatedParameters {
    /// Zero when the entry must not be drawn.
    pub has_geometry: i32,
    pub has_heading: i32,
    pub heading_type: i32,
    pub use_depth: i32,
    pub world_transform: GpuMat4,
    pub heading_transform: GpuMat4,
    /// World transform with the heading applied.
    pub coordinate_space_transform: GpuMat4,
    pub location_transform: GpuMat4,
    pub projection_matrix: GpuMat4,
    /// `location_transform * coordinate_space_transform`.
    pub model_matrix: GpuMat4,
    pub normal_matrix: GpuMat3,
    pub model_view_matrix: GpuMat4,
    pub model_view_projection_matrix: GpuMat4,
    pub shadow_mvp_transform_matrix: GpuMat4,
    pub directional_light_mvp: GpuMat4,
    pub map_weights: [f32; MAP_WEIGHT_COUNT],
    pub(crate) _padding: [f32; 2],
}

impl PrecalculatedParameters {
    /// The sentinel written for culled or missing entries.
    pub fn empty() -> Self {
        Self {
            has_geometry: 0,
            has_heading: 0,
            heading_type: 0,
            use_depth: 0,
            world_transform: GPU_IDENTITY,
            heading_transform: GPU_IDENTITY,
            coordinate_space_transform: GPU_IDENTITY,
            location_transform: GPU_IDENTITY,
            projection_matrix: GPU_IDENTITY,
            model_matrix: GPU_IDENTITY,
            normal_matrix: GPU_IDENTITY3,
            model_view_matrix: GPU_IDENTITY,
            model_view_projection_matrix: GPU_IDENTITY,
            shadow_mvp_transform_matrix: GPU_IDENTITY,
            directional_light_mvp: GPU_IDENTITY,
            map_weights: [1.0; MAP_WEIGHT_COUNT],
            _padding: [0.0; 2],
        }
    }
}

impl Default for PrecalculatedParameters {
    fn default() -> Self {
        Self::empty()
    }
}

/// One vertex of the full-screen camera image quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraPlaneVertex {
    /// Clip-space position.
    pub position: [f32; 2],
    /// Texture coordinate into the captured image.
    pub texcoord: [f32; 2],
}

/// One raw feature point as drawn by the tracking point overlay.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TrackingPointVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Point size in pixels.
    pub size: f32,
    /// RGBA color.
    pub color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn layouts_match_shader_sizes() {
        assert_eq!(size_of::<SharedUniforms>(), 144);
        assert_eq!(size_of::<EnvironmentUniforms>(), 176);
        assert_eq!(size_of::<AnchorInstanceUniforms>(), 384);
        assert_eq!(size_of::<AnchorEffectsUniforms>(), 96);
        assert_eq!(size_of::<MaterialUniforms>(), 80);
        assert_eq!(size_of::<PrecalculatedParameters>(), 16 + 64 * 10 + 48 + 64);
    }

    #[test]
    fn default_effects_are_neutral() {
        let effects = AnchorEffectsUniforms::default();
        assert_eq!(effects.alpha, 1.0);
        assert_eq!(effects.glow, 0.0);
        assert_eq!(effects.tint, [1.0, 1.0, 1.0]);
        assert_eq!(effects.scale, GPU_IDENTITY);
    }

    #[test]
    fn empty_instance_has_no_geometry() {
        let instance = AnchorInstanceUniforms::empty();
        assert_eq!(instance.has_geometry, 0);
        assert_eq!(bytemuck::bytes_of(&instance).len(), 384);
    }
}
