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

//! Transform composition for every entity kind.
//!
//! Each kind places its geometry differently (surfaces stretch to their
//! extent, camera-bound trackers ride along with the camera, targets turn to
//! face it). The rules live here, in one `match`, and are shared by the
//! render modules and the precalculation module.

use crate::animation::sample_transform_animation;
use crate::draw_call::DrawData;
use augment_core::ar::{CameraProperties, GeometricEntity, Heading};
use augment_core::math::{normal_matrix, translation_of, Mat3, Mat4, Quat, Vec3, EPSILON};

/// The transforms written for one instance of one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposedTransform {
    /// Where the instance sits in world space.
    pub location: Mat4,
    /// Node transform of the mesh inside its model.
    pub world: Mat4,
    /// Heading, when the entity has one.
    pub heading: Option<Heading>,
    /// `world` with the heading applied.
    pub coordinate_space: Mat4,
    /// `location * coordinate_space`.
    pub model: Mat4,
    /// Inverse transpose of the model matrix.
    pub normal: Mat3,
}

/// World-space placement of `entity` before the mesh node transform.
pub fn location_transform(entity: &GeometricEntity, camera: &CameraProperties) -> Mat4 {
    match entity {
        GeometricEntity::Augmented(anchor) => anchor.state.transform,
        GeometricEntity::Unanchored(object) => object.state.transform,
        GeometricEntity::PathSegment(point) => point.state.transform,
        GeometricEntity::Surface(surface) => {
            let extent = surface.extent;
            surface.state.transform * Mat4::from_scale(Vec3::new(extent.x, 1.0, extent.z))
        }
        GeometricEntity::Tracker(tracker) if tracker.follows_camera => {
            camera.camera_transform * tracker.state.transform
        }
        GeometricEntity::Tracker(tracker) => tracker.state.transform,
        GeometricEntity::Target(target) => {
            facing_camera(&target.state.transform, camera.position())
        }
    }
}

/// Keeps translation and scale of `transform`, rotating it to look at `eye`.
fn facing_camera(transform: &Mat4, eye: Vec3) -> Mat4 {
    let (scale, rotation, translation) = transform.to_scale_rotation_translation();
    let to_eye = eye - translation;
    let rotation = if to_eye.length_squared() <= EPSILON * EPSILON {
        rotation
    } else {
        Quat::from_rotation_arc(Vec3::Z, to_eye.normalize())
    };
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// World-space position used for the render distance cull.
pub fn entity_position(entity: &GeometricEntity, camera: &CameraProperties) -> Vec3 {
    translation_of(&location_transform(entity, camera))
}

/// Returns `true` if `position` is strictly closer to the camera than `render_distance`.
#[inline]
pub fn within_render_distance(position: Vec3, camera: &CameraProperties, render_distance: f32) -> bool {
    camera.position().distance(position) < render_distance
}

/// Node transform of `draw_data` at `seconds`, animated when keyframes exist.
pub fn node_world_transform(draw_data: &DrawData, seconds: f64) -> Mat4 {
    draw_data
        .world_transform_animation
        .as_ref()
        .and_then(|animation| sample_transform_animation(animation, seconds))
        .unwrap_or(draw_data.world_transform)
}

/// Composes the transforms of one entity drawn with a node transform of `world`.
pub fn compose(entity: &GeometricEntity, world: Mat4, camera: &CameraProperties) -> ComposedTransform {
    compose_at(location_transform(entity, camera), world, entity.state().heading)
}

/// Composes transforms from an already computed location.
pub fn compose_at(location: Mat4, world: Mat4, heading: Option<Heading>) -> ComposedTransform {
    let coordinate_space = heading.map_or(world, |h| h.apply(&world));
    let model = location * coordinate_space;
    ComposedTransform {
        location,
        world,
        heading,
        coordinate_space,
        model,
        normal: normal_matrix(&model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use augment_core::ar::{AnchorState, GazeTarget, RealSurfaceAnchor, TrackerAnchor};

    fn camera_at(position: Vec3) -> CameraProperties {
        CameraProperties {
            camera_transform: Mat4::from_translation(position),
            ..Default::default()
        }
    }

    #[test]
    fn surfaces_stretch_to_extent() {
        let entity = GeometricEntity::Surface(RealSurfaceAnchor {
            state: AnchorState::new(Mat4::IDENTITY),
            extent: Vec3::new(2.0, 0.0, 3.0),
        });
        let location = location_transform(&entity, &CameraProperties::default());
        assert_relative_eq!(location.transform_point3(Vec3::new(0.5, 0.0, 0.5)), Vec3::new(1.0, 0.0, 1.5));
    }

    #[test]
    fn camera_trackers_follow_the_camera() {
        let entity = GeometricEntity::Tracker(TrackerAnchor {
            state: AnchorState::new(Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0))),
            follows_camera: true,
        });
        let camera = camera_at(Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(entity_position(&entity, &camera), Vec3::new(5.0, 0.0, -1.0));
    }

    #[test]
    fn targets_face_the_camera() {
        let entity = GeometricEntity::Target(GazeTarget {
            state: AnchorState::new(Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0))),
        });
        let camera = camera_at(Vec3::ZERO);
        let location = location_transform(&entity, &camera);
        let forward = location.transform_vector3(Vec3::Z);
        assert_relative_eq!(forward, Vec3::Z, epsilon = 1e-5);
        assert_relative_eq!(translation_of(&location), Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn model_is_location_times_coordinate_space() {
        let location = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let world = Mat4::from_scale(Vec3::splat(2.0));
        let heading = Heading::relative(Quat::from_rotation_y(std::f32::consts::PI));
        let composed = compose_at(location, world, Some(heading));
        assert_relative_eq!(composed.model, location * heading.apply(&world));
    }

    #[test]
    fn render_distance_is_strict() {
        let camera = camera_at(Vec3::ZERO);
        assert!(within_render_distance(Vec3::new(0.0, 0.0, 499.9), &camera, 500.0));
        assert!(!within_render_distance(Vec3::new(0.0, 0.0, 500.0), &camera, 500.0));
    }
}
