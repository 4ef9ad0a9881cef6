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

use crate::math::{Mat4, Quat, Vec3};

/// A joint hierarchy with sampled local poses.
///
/// Joints are stored so that every parent precedes its children. Poses are
/// indexed `[keyframe][joint]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedSkeleton {
    /// Path of each joint, for debugging.
    pub joint_paths: Vec<String>,
    /// Parent of each joint, `None` for roots.
    pub parent_indices: Vec<Option<usize>>,
    /// Keyframe timestamps in seconds, ascending.
    pub key_times: Vec<f64>,
    /// Local translations per keyframe.
    pub translations: Vec<Vec<Vec3>>,
    /// Local rotations per keyframe.
    pub rotations: Vec<Vec<Quat>>,
}

impl AnimatedSkeleton {
    /// Number of joints.
    pub fn joint_count(&self) -> usize {
        self.parent_indices.len()
    }

    /// Number of keyframes.
    pub fn keyframe_count(&self) -> usize {
        self.key_times.len()
    }
}

/// Binds a mesh's skin joints to skeleton joints.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinData {
    /// For each skin joint, the index of the skeleton joint driving it.
    pub skin_to_skeleton: Vec<usize>,
    /// Inverse bind pose of each skin joint.
    pub inverse_bind_transforms: Vec<Mat4>,
}

impl SkinData {
    /// Number of palette entries the skin needs.
    pub fn joint_count(&self) -> usize {
        self.skin_to_skeleton.len()
    }
}

/// Keyframed node transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformAnimation {
    /// Timestamps in seconds, ascending.
    pub key_times: Vec<f64>,
    /// Transform at each timestamp.
    pub transforms: Vec<Mat4>,
}
