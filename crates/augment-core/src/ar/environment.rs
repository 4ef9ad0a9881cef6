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

use crate::math::{color_temperature_to_rgb, translation_of, Mat4, Vec3};
use crate::renderer::TextureId;
use std::collections::HashSet;
use uuid::Uuid;

/// Lumens that map to an ambient intensity of 1.0.
pub const AMBIENT_INTENSITY_SCALE: f32 = 1000.0;

/// Ambient light estimate for the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEstimate {
    /// Ambient intensity in lumens.
    pub ambient_intensity: f32,
    /// Ambient color temperature in Kelvin.
    pub ambient_color_temperature: f32,
}

impl LightEstimate {
    /// Linear RGB color of the ambient light.
    pub fn ambient_color(&self) -> Vec3 {
        color_temperature_to_rgb(self.ambient_color_temperature)
    }

    /// Intensity normalised for the shaders.
    pub fn normalized_intensity(&self) -> f32 {
        self.ambient_intensity / AMBIENT_INTENSITY_SCALE
    }
}

/// A spatial light capture used for reflections.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentProbe {
    #[allow(missing_docs)]
    pub identifier: Uuid,
    /// Center of the probe in world space.
    pub transform: Mat4,
    /// Size of the captured box.
    pub extent: Vec3,
    /// The cube map, once the session has produced one.
    pub texture: Option<TextureId>,
}

impl EnvironmentProbe {
    /// Volume of the captured box.
    pub fn volume(&self) -> f32 {
        (self.extent.x * self.extent.y * self.extent.z).abs()
    }

    /// Center of the probe.
    pub fn position(&self) -> Vec3 {
        translation_of(&self.transform)
    }
}

/// A probe and the anchors it is known to cover.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeAssociation {
    #[allow(missing_docs)]
    pub probe: EnvironmentProbe,
    /// Identifiers of the anchors inside the probe.
    pub related_anchors: HashSet<Uuid>,
}

/// Per-frame lighting state.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentProperties {
    /// Ambient estimate, when the session provides one.
    pub light_estimate: Option<LightEstimate>,
    /// Key light direction in world space.
    pub directional_light_direction: Vec3,
    /// Key light color.
    pub directional_light_color: Vec3,
    /// Known probes and the anchors they cover.
    pub probes: Vec<ProbeAssociation>,
}

impl EnvironmentProperties {
    /// The most localised probe covering `anchor`.
    ///
    /// When several probes reference the same anchor the one with the smallest
    /// volume wins; ties keep the first probe in list order.
    pub fn best_probe_for(&self, anchor: &Uuid) -> Option<&EnvironmentProbe> {
        let mut best: Option<&EnvironmentProbe> = None;
        for association in self.probes.iter().filter(|a| a.related_anchors.contains(anchor)) {
            let candidate = &association.probe;
            match best {
                Some(current) if current.volume() <= candidate.volume() => {}
                _ => best = Some(candidate),
            }
        }
        best
    }
}

impl Default for EnvironmentProperties {
    fn default() -> Self {
        Self {
            light_estimate: None,
            directional_light_direction: Vec3::new(0.0, -1.0, 0.0),
            directional_light_color: Vec3::ONE,
            probes: Vec::new(),
        }
    }
}

/// Shadow mapping inputs for the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowProperties {
    /// The depth texture written by the shadow pass.
    pub shadow_map: Option<TextureId>,
    /// World to shadow map texture space.
    pub shadow_mvp_matrix: Mat4,
    /// World to light clip space.
    pub directional_light_mvp: Mat4,
}

impl Default for ShadowProperties {
    fn default() -> Self {
        Self {
            shadow_map: None,
            shadow_mvp_matrix: Mat4::IDENTITY,
            directional_light_mvp: Mat4::IDENTITY,
        }
    }
}
