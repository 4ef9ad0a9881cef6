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

//! Skeletal animation evaluation.
//!
//! Pure functions only: a keyframe search, world pose composition and matrix
//! palette computation. The same keyframe search samples node transform
//! animations and effect timelines.

use augment_core::asset::{AnimatedSkeleton, SkinData, TransformAnimation};
use augment_core::math::Mat4;
use thiserror::Error;

/// Errors raised when skeleton or skin data is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    /// A joint's parent does not precede it.
    #[error("joint {joint} has parent {parent}, parents must precede their children")]
    ParentOrder {
        /// The offending joint.
        joint: usize,
        /// Its parent index.
        parent: usize,
    },
    /// A keyframe does not hold one pose per joint.
    #[error("keyframe {keyframe} has {found} poses, expected {expected}")]
    PoseCount {
        /// Index of the keyframe.
        keyframe: usize,
        /// Poses found.
        found: usize,
        /// Joints in the skeleton.
        expected: usize,
    },
    /// Timestamps and pose arrays disagree in length.
    #[error("{times} key times for {translations} translation and {rotations} rotation keyframes")]
    KeyframeCount {
        /// Number of timestamps.
        times: usize,
        /// Number of translation keyframes.
        translations: usize,
        /// Number of rotation keyframes.
        rotations: usize,
    },
    /// The skin references a joint that the skeleton does not have.
    #[error("skin joint {skin_joint} maps to skeleton joint {skeleton_joint} of {joint_count}")]
    SkinJointOutOfRange {
        /// Index in the skin.
        skin_joint: usize,
        /// Referenced skeleton joint.
        skeleton_joint: usize,
        /// Joints in the skeleton.
        joint_count: usize,
    },
    /// The skin has a different number of inverse bind transforms than joints.
    #[error("skin has {joints} joints but {bind_transforms} inverse bind transforms")]
    BindTransformCount {
        /// Joints in the skin.
        joints: usize,
        /// Inverse bind transforms in the skin.
        bind_transforms: usize,
    },
}

/// Index of the largest timestamp `<= key` in `sorted_times`.
///
/// Keys before the first sample yield `0`, keys past the last sample yield the
/// last index. Returns `None` for an empty slice.
pub fn lower_bound_keyframe_index(sorted_times: &[f64], key: f64) -> Option<usize> {
    if sorted_times.is_empty() {
        return None;
    }
    let upper = sorted_times.partition_point(|&t| t <= key);
    Some(upper.saturating_sub(1))
}

/// Checks the structural invariants the evaluator relies on.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_skeleton(skeleton: &AnimatedSkeleton) -> Result<(), AnimationError> {
    let joint_count = skeleton.joint_count();
    for (joint, parent) in skeleton.parent_indices.iter().enumerate() {
        if let Some(parent) = *parent {
            if parent >= joint {
                return Err(AnimationError::ParentOrder { joint, parent });
            }
        }
    }
    if skeleton.key_times.len() != skeleton.translations.len()
        || skeleton.key_times.len() != skeleton.rotations.len()
    {
        return Err(AnimationError::KeyframeCount {
            times: skeleton.key_times.len(),
            translations: skeleton.translations.len(),
            rotations: skeleton.rotations.len(),
        });
    }
    let poses = skeleton.translations.iter().zip(&skeleton.rotations);
    for (keyframe, (translations, rotations)) in poses.enumerate() {
        let found = translations.len().min(rotations.len());
        if translations.len() != joint_count || rotations.len() != joint_count {
            return Err(AnimationError::PoseCount {
                keyframe,
                found,
                expected: joint_count,
            });
        }
    }
    Ok(())
}

/// Checks that `skin` can be evaluated against `skeleton`.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_skin(skin: &SkinData, skeleton: &AnimatedSkeleton) -> Result<(), AnimationError> {
    if skin.inverse_bind_transforms.len() != skin.skin_to_skeleton.len() {
        return Err(AnimationError::BindTransformCount {
            joints: skin.skin_to_skeleton.len(),
            bind_transforms: skin.inverse_bind_transforms.len(),
        });
    }
    let joint_count = skeleton.joint_count();
    for (skin_joint, &skeleton_joint) in skin.skin_to_skeleton.iter().enumerate() {
        if skeleton_joint >= joint_count {
            return Err(AnimationError::SkinJointOutOfRange {
                skin_joint,
                skeleton_joint,
                joint_count,
            });
        }
    }
    Ok(())
}

/// World-space pose of every joint at `keyframe`.
///
/// Each local transform is `translation * rotation`; world transforms are
/// composed front to back, relying on parents preceding children. An
/// out-of-range keyframe is clamped to the last one. A skeleton without
/// keyframes yields identity poses.
pub fn evaluate_animation(skeleton: &AnimatedSkeleton, keyframe: usize) -> Vec<Mat4> {
    let joint_count = skeleton.joint_count();
    let Some(last) = skeleton.keyframe_count().checked_sub(1) else {
        return vec![Mat4::IDENTITY; joint_count];
    };
    let keyframe = keyframe.min(last);
    let translations = &skeleton.translations[keyframe];
    let rotations = &skeleton.rotations[keyframe];

    let mut world_pose: Vec<Mat4> = Vec::with_capacity(joint_count);
    for joint in 0..joint_count {
        let local = Mat4::from_rotation_translation(rotations[joint], translations[joint]);
        let world = match skeleton.parent_indices[joint] {
            Some(parent) => world_pose[parent] * local,
            None => local,
        };
        world_pose.push(world);
    }
    world_pose
}

/// World pose at session time `seconds`, using the keyframe at or before it.
pub fn evaluate_animation_at(skeleton: &AnimatedSkeleton, seconds: f64) -> Vec<Mat4> {
    let keyframe = lower_bound_keyframe_index(&skeleton.key_times, seconds).unwrap_or(0);
    evaluate_animation(skeleton, keyframe)
}

/// Skinning matrices: for each skin joint, its world pose times its inverse bind transform.
pub fn evaluate_matrix_palette(world_pose: &[Mat4], skin: &SkinData) -> Vec<Mat4> {
    skin.skin_to_skeleton
        .iter()
        .zip(&skin.inverse_bind_transforms)
        .map(|(&joint, inverse_bind)| {
            let pose = world_pose.get(joint).copied().unwrap_or(Mat4::IDENTITY);
            pose * *inverse_bind
        })
        .collect()
}

/// Samples a node transform animation at `seconds`.
///
/// Returns `None` if the animation has no keyframes.
pub fn sample_transform_animation(animation: &TransformAnimation, seconds: f64) -> Option<Mat4> {
    let index = lower_bound_keyframe_index(&animation.key_times, seconds)?;
    animation.transforms.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use augment_core::math::{Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    fn two_joint_skeleton() -> AnimatedSkeleton {
        AnimatedSkeleton {
            joint_paths: vec!["root".into(), "root/arm".into()],
            parent_indices: vec![None, Some(0)],
            key_times: vec![0.0, 1.0],
            translations: vec![
                vec![Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)],
                vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            ],
            rotations: vec![
                vec![Quat::IDENTITY, Quat::IDENTITY],
                vec![Quat::from_rotation_z(FRAC_PI_2), Quat::IDENTITY],
            ],
        }
    }

    #[test]
    fn lower_bound_handles_edges() {
        let times = [0.0, 0.5, 1.0, 2.0];
        assert_eq!(lower_bound_keyframe_index(&times, -1.0), Some(0));
        assert_eq!(lower_bound_keyframe_index(&times, 0.0), Some(0));
        assert_eq!(lower_bound_keyframe_index(&times, 0.75), Some(1));
        assert_eq!(lower_bound_keyframe_index(&times, 1.0), Some(2));
        assert_eq!(lower_bound_keyframe_index(&times, 99.0), Some(3));
        assert_eq!(lower_bound_keyframe_index(&[], 1.0), None);
    }

    #[test]
    fn child_pose_is_composed_with_parent() {
        let skeleton = two_joint_skeleton();
        let pose = evaluate_animation(&skeleton, 1);

        // Root rotated 90 degrees about Z and moved to +X; the child offset +Y
        // ends up along -X relative to the root.
        let child_position = pose[1].w_axis.truncate();
        assert_relative_eq!(child_position, Vec3::new(0.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(pose[0].w_axis.truncate(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn palette_applies_inverse_bind() {
        let skeleton = two_joint_skeleton();
        let skin = SkinData {
            skin_to_skeleton: vec![1],
            inverse_bind_transforms: vec![Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))],
        };
        let pose = evaluate_animation(&skeleton, 0);
        let palette = evaluate_matrix_palette(&pose, &skin);

        assert_eq!(palette.len(), 1);
        assert_relative_eq!(palette[0], Mat4::IDENTITY);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let skeleton = two_joint_skeleton();
        let skin = SkinData {
            skin_to_skeleton: vec![0, 1],
            inverse_bind_transforms: vec![Mat4::IDENTITY; 2],
        };
        let first = evaluate_matrix_palette(&evaluate_animation_at(&skeleton, 1.3), &skin);
        let second = evaluate_matrix_palette(&evaluate_animation_at(&skeleton, 1.3), &skin);
        let bits = |m: &[Mat4]| -> Vec<u32> {
            m.iter().flat_map(|m| m.to_cols_array()).map(f32::to_bits).collect()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn parents_must_precede_children() {
        let mut skeleton = two_joint_skeleton();
        skeleton.parent_indices = vec![Some(1), None];
        assert_eq!(
            validate_skeleton(&skeleton),
            Err(AnimationError::ParentOrder { joint: 0, parent: 1 })
        );
    }

    #[test]
    fn skin_joints_must_exist() {
        let skeleton = two_joint_skeleton();
        let skin = SkinData {
            skin_to_skeleton: vec![5],
            inverse_bind_transforms: vec![Mat4::IDENTITY],
        };
        assert!(matches!(
            validate_skin(&skin, &skeleton),
            Err(AnimationError::SkinJointOutOfRange { .. })
        ));
    }

    #[test]
    fn empty_skeleton_animation_is_identity() {
        let skeleton = AnimatedSkeleton {
            joint_paths: vec!["root".into()],
            parent_indices: vec![None],
            key_times: vec![],
            translations: vec![],
            rotations: vec![],
        };
        assert_eq!(evaluate_animation(&skeleton, 3), vec![Mat4::IDENTITY]);
    }
}
