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

//! Shader function selection.
//!
//! Vertex functions depend on the module, the pass and whether the mesh is
//! skinned. Fragment functions depend on the module and the shader preference;
//! shadow pipelines have none.

use crate::render_pass::RenderPassKind;
use augment_core::config::ShaderPreference;
use augment_core::renderer::ModuleIdentifier;

fn prefix(module: ModuleIdentifier) -> &'static str {
    match module {
        ModuleIdentifier::Anchors => "anchorGeometry",
        ModuleIdentifier::Surfaces => "surfaceGeometry",
        ModuleIdentifier::Trackers => "trackerGeometry",
        ModuleIdentifier::Unanchored => "unanchoredGeometry",
        ModuleIdentifier::Paths => "pathGeometry",
        ModuleIdentifier::CameraPlane => "capturedImage",
        ModuleIdentifier::TrackingPoints => "trackingPoint",
        ModuleIdentifier::SharedBuffers => "shared",
        ModuleIdentifier::Precalculation => "precalculation",
    }
}

/// Name of the vertex function.
pub fn vertex_function(module: ModuleIdentifier, pass: RenderPassKind, skinned: bool) -> String {
    let stage = match pass {
        RenderPassKind::Main => "VertexTransform",
        RenderPassKind::Shadow => "ShadowVertexTransform",
    };
    let skin = if skinned { "Skinned" } else { "" };
    format!("{}{stage}{skin}", prefix(module))
}

/// Name of the fragment function, `None` for the shadow pass.
pub fn fragment_function(
    module: ModuleIdentifier,
    pass: RenderPassKind,
    preference: ShaderPreference,
) -> Option<String> {
    if pass == RenderPassKind::Shadow {
        return None;
    }
    let lighting = match preference {
        ShaderPreference::Simple => "Simple",
        ShaderPreference::Blinn => "Blinn",
        ShaderPreference::Pbr => "PBR",
    };
    Some(format!("{}FragmentLighting{lighting}", prefix(module)))
}

/// Name of the precalculation kernel.
pub const PRECALCULATION_KERNEL: &str = "precalculationComputeShader";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skinned_geometry_uses_skinned_vertex_function() {
        assert_eq!(
            vertex_function(ModuleIdentifier::Anchors, RenderPassKind::Main, false),
            "anchorGeometryVertexTransform"
        );
        assert_eq!(
            vertex_function(ModuleIdentifier::Anchors, RenderPassKind::Main, true),
            "anchorGeometryVertexTransformSkinned"
        );
        assert_eq!(
            vertex_function(ModuleIdentifier::Anchors, RenderPassKind::Shadow, true),
            "anchorGeometryShadowVertexTransformSkinned"
        );
    }

    #[test]
    fn preference_selects_fragment_function() {
        let f = |p| fragment_function(ModuleIdentifier::Surfaces, RenderPassKind::Main, p);
        assert_eq!(f(ShaderPreference::Simple).as_deref(), Some("surfaceGeometryFragmentLightingSimple"));
        assert_eq!(f(ShaderPreference::Blinn).as_deref(), Some("surfaceGeometryFragmentLightingBlinn"));
        assert_eq!(f(ShaderPreference::Pbr).as_deref(), Some("surfaceGeometryFragmentLightingPBR"));
        assert_eq!(
            fragment_function(ModuleIdentifier::Anchors, RenderPassKind::Shadow, ShaderPreference::Pbr),
            None
        );
    }
}
