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

use crate::math::{translation_of, Mat3, Mat4, UVec2, Vec3};
use crate::renderer::TextureId;

/// Interface orientation of the viewport.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewportOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// The camera image planes of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapturedImage {
    /// Luma (Y) plane.
    pub luma: TextureId,
    /// Chroma (CbCr) plane.
    pub chroma: TextureId,
}

/// Per-frame camera state from the tracking session.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraProperties {
    /// World to camera space.
    pub view_matrix: Mat4,
    /// Camera to clip space.
    pub projection_matrix: Mat4,
    /// Camera pose in world space.
    pub camera_transform: Mat4,
    /// Monotonic frame counter.
    pub current_frame: u64,
    /// Frames per second of the session.
    pub frame_rate: f64,
    /// Drawable size in pixels.
    pub viewport_size: UVec2,
    #[allow(missing_docs)]
    pub orientation: ViewportOrientation,
    /// Raw feature points detected this frame.
    pub raw_feature_points: Vec<Vec3>,
    /// Set on the first frame after a resize or rotation.
    pub viewport_size_did_change: bool,
    /// Maps normalised image coordinates to viewport coordinates.
    pub display_transform: Mat3,
    /// Camera image of this frame, if available.
    pub captured_image: Option<CapturedImage>,
}

impl CameraProperties {
    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        translation_of(&self.camera_transform)
    }

    /// Session time in seconds derived from the frame counter.
    pub fn elapsed_seconds(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.current_frame as f64 / self.frame_rate
        } else {
            0.0
        }
    }
}

impl Default for CameraProperties {
    fn default() -> Self {
        Self {
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            camera_transform: Mat4::IDENTITY,
            current_frame: 0,
            frame_rate: 60.0,
            viewport_size: UVec2::new(1170, 2532),
            orientation: ViewportOrientation::Portrait,
            raw_feature_points: Vec::new(),
            viewport_size_did_change: false,
            display_transform: Mat3::IDENTITY,
            captured_image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_seconds_uses_frame_rate() {
        let camera = CameraProperties {
            current_frame: 90,
            frame_rate: 60.0,
            ..Default::default()
        };
        assert_eq!(camera.elapsed_seconds(), 1.5);
    }

    #[test]
    fn zero_frame_rate_yields_zero_time() {
        let camera = CameraProperties {
            current_frame: 90,
            frame_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(camera.elapsed_seconds(), 0.0);
    }
}
