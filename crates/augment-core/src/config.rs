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

//! Renderer configuration.

use serde::{Deserialize, Serialize};

/// Fragment function family used for lit geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShaderPreference {
    /// Unlit base color.
    Simple,
    /// Blinn-Phong.
    Blinn,
    /// Physically based.
    #[default]
    Pbr,
}

/// Tunables of the renderer. Every field has a default, so a partial RON
/// document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Ring depth, i.e. frames in flight.
    pub max_in_flight_frames: usize,
    /// Entities at this distance from the camera or further are culled.
    pub render_distance: f32,
    /// Palette entries available per frame slot.
    pub max_palette_size: usize,
    /// Whether the shadow pass is built and encoded.
    pub shadows_enabled: bool,
    /// Fragment function family.
    pub shader_preference: ShaderPreference,
    /// Registers the feature point overlay.
    pub debug_tracking_points: bool,
    /// Feature points drawn by the overlay.
    pub max_tracking_points: usize,
    /// Registers the precalculation compute module.
    pub precalculation_enabled: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_in_flight_frames: 3,
            render_distance: 500.0,
            max_palette_size: 100,
            shadows_enabled: true,
            shader_preference: ShaderPreference::Pbr,
            debug_tracking_points: false,
            max_tracking_points: 2048,
            precalculation_enabled: true,
        }
    }
}

impl RendererConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}
