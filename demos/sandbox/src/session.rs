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

//! A scripted AR session: an orbiting camera around a ring of anchors.

use augment_core::ar::{
    AnchorState, AugmentedAnchor, CapturedImage, Effect, EffectKeyframe, EffectKind, EffectValue,
    EnvironmentProbe, FrameInput, GeometricEntity, Heading, LightEstimate, PathSegmentAnchor,
    ProbeAssociation, RealSurfaceAnchor, TrackerAnchor,
};
use augment_core::asset::{primitives, AssetCompletion, ModelProvider};
use augment_core::math::{Mat4, Quat, Vec3};
use augment_core::renderer::TextureId;
use std::collections::HashSet;
use std::f32::consts::TAU;
use std::time::Duration;
use uuid::Uuid;

const RING_ANCHORS: usize = 24;
const RING_RADIUS: f32 = 3.0;
const PATH_POINTS: u32 = 8;

/// Provides cubes for everything, except one identifier it never heard of.
pub struct SyntheticProvider {
    pub unknown: Uuid,
    pub latency: Duration,
}

impl ModelProvider for SyntheticProvider {
    fn load_asset(&self, type_tag: &str, identifier: Option<Uuid>, completion: AssetCompletion) {
        let asset = match identifier {
            Some(id) if id == self.unknown => None,
            _ if type_tag == "RealSurface" => Some(primitives::plane(type_tag)),
            _ => Some(primitives::cube(type_tag)),
        };
        let latency = self.latency;
        std::thread::spawn(move || {
            std::thread::sleep(latency);
            completion(asset);
        });
    }
}

/// Produces one [`FrameInput`] per call.
pub struct SyntheticSession {
    frame: u64,
    frame_rate: f64,
    special: Uuid,
    unknown: Uuid,
    path: Uuid,
    probe_texture: TextureId,
    shadow_map: TextureId,
}

impl SyntheticSession {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame: 0,
            frame_rate,
            special: Uuid::new_v4(),
            unknown: Uuid::new_v4(),
            path: Uuid::new_v4(),
            probe_texture: TextureId(100),
            shadow_map: TextureId(101),
        }
    }

    /// The identifier the provider has no model for.
    pub fn unknown_identifier(&self) -> Uuid {
        self.unknown
    }

    fn pulse() -> Effect {
        Effect::animated(
            EffectKind::Glow,
            vec![
                EffectKeyframe {
                    time: 0.0,
                    value: EffectValue::Scalar(0.0),
                },
                EffectKeyframe {
                    time: 1.0,
                    value: EffectValue::Scalar(1.0),
                },
            ],
        )
    }

    /// Entities of the current frame.
    pub fn entities(&self) -> Vec<GeometricEntity> {
        let mut entities = Vec::new();
        for i in 0..RING_ANCHORS {
            let angle = i as f32 / RING_ANCHORS as f32 * TAU;
            let position = Vec3::new(angle.cos() * RING_RADIUS, 0.0, angle.sin() * RING_RADIUS);
            let mut state = AnchorState::new(Mat4::from_translation(position)).with_shadows(true);
            match i % 8 {
                0 => state = state.with_identifier(self.special).with_effects(vec![Self::pulse()]),
                3 => state = state.with_identifier(self.unknown),
                5 => state = state.with_heading(Heading::relative(Quat::from_rotation_y(angle))),
                _ => {}
            }
            entities.push(GeometricEntity::Augmented(AugmentedAnchor { state }));
        }

        entities.push(GeometricEntity::Surface(RealSurfaceAnchor {
            state: AnchorState::new(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))),
            extent: Vec3::new(4.0, 0.0, 4.0),
        }));
        entities.push(GeometricEntity::Tracker(TrackerAnchor {
            state: AnchorState::new(Mat4::from_translation(Vec3::new(0.0, 0.0, -0.5))),
            follows_camera: true,
        }));

        for sequence in 0..PATH_POINTS {
            let t = sequence as f32 / PATH_POINTS as f32;
            entities.push(GeometricEntity::PathSegment(PathSegmentAnchor {
                state: AnchorState::new(Mat4::from_translation(Vec3::new(t * 4.0 - 2.0, -0.9, t.sin()))),
                path_identifier: self.path,
                sequence,
            }));
        }
        entities
    }

    /// Advances the session by one frame.
    pub fn next_frame(&mut self) -> FrameInput {
        let seconds = self.frame as f64 / self.frame_rate;
        let angle = seconds as f32 * 0.5;
        let eye = Vec3::new(angle.cos() * 6.0, 1.5, angle.sin() * 6.0);
        let camera_transform = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y).inverse();

        let mut frame = FrameInput {
            entities: self.entities(),
            ..FrameInput::default()
        };
        frame.camera.camera_transform = camera_transform;
        frame.camera.view_matrix = camera_transform.inverse();
        frame.camera.projection_matrix = Mat4::perspective_rh(1.0, 0.46, 0.01, 1000.0);
        frame.camera.current_frame = self.frame;
        frame.camera.frame_rate = self.frame_rate;
        frame.camera.viewport_size_did_change = self.frame == 0;
        frame.camera.raw_feature_points = (0..64)
            .map(|i| Vec3::new((i % 8) as f32 * 0.25, -1.0, (i / 8) as f32 * 0.25))
            .collect();
        frame.camera.captured_image = Some(CapturedImage {
            luma: TextureId(1),
            chroma: TextureId(2),
        });

        frame.environment.light_estimate = Some(LightEstimate {
            ambient_intensity: 1000.0,
            ambient_color_temperature: 6500.0,
        });
        frame.environment.probes = vec![ProbeAssociation {
            probe: EnvironmentProbe {
                identifier: Uuid::new_v4(),
                transform: Mat4::IDENTITY,
                extent: Vec3::splat(8.0),
                texture: Some(self.probe_texture),
            },
            related_anchors: HashSet::from([self.special]),
        }];
        frame.shadow.shadow_map = Some(self.shadow_map);

        self.frame += 1;
        frame
    }
}
