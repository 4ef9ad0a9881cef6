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

use crate::math::{Mat4, Quat};
use serde::{Deserialize, Serialize};

/// How a [`Heading`] combines with the tracked transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingType {
    /// The offset rotation replaces the tracked rotation.
    Absolute,
    /// The offset rotation is applied on top of the tracked rotation.
    Relative,
}

impl HeadingType {
    /// Value written into the `heading_type` uniform field.
    pub const fn as_gpu(self) -> i32 {
        match self {
            HeadingType::Absolute => 0,
            HeadingType::Relative => 1,
        }
    }
}

/// An orientation offset attached to an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    /// Combination rule.
    pub heading_type: HeadingType,
    /// The rotation to apply.
    pub offset_rotation: Quat,
}

impl Heading {
    /// A heading that overrides the tracked rotation.
    pub fn absolute(offset_rotation: Quat) -> Self {
        Self {
            heading_type: HeadingType::Absolute,
            offset_rotation,
        }
    }

    /// A heading applied on top of the tracked rotation.
    pub fn relative(offset_rotation: Quat) -> Self {
        Self {
            heading_type: HeadingType::Relative,
            offset_rotation,
        }
    }

    /// The heading as a rotation matrix.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_quat(self.offset_rotation)
    }

    /// Applies the heading to a world transform, producing the coordinate space transform.
    ///
    /// Absolute headings keep the translation and scale of `world` and swap its
    /// rotation; relative headings post-multiply the offset.
    pub fn apply(&self, world: &Mat4) -> Mat4 {
        match self.heading_type {
            HeadingType::Absolute => {
                let (scale, _, translation) = world.to_scale_rotation_translation();
                Mat4::from_scale_rotation_translation(scale, self.offset_rotation, translation)
            }
            HeadingType::Relative => *world * self.transform(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn absolute_heading_replaces_rotation_but_keeps_translation() {
        let world = Mat4::from_rotation_translation(
            Quat::from_rotation_y(FRAC_PI_2),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let heading = Heading::absolute(Quat::IDENTITY);
        let result = heading.apply(&world);

        assert_relative_eq!(result.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(result.x_axis.truncate(), Vec3::X, epsilon = 1e-6);
    }

    #[test]
    fn relative_heading_composes_rotations() {
        let world = Mat4::from_rotation_y(FRAC_PI_2);
        let heading = Heading::relative(Quat::from_rotation_y(FRAC_PI_2));
        let result = heading.apply(&world);

        let rotated = result.transform_vector3(Vec3::X);
        assert_relative_eq!(rotated, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn heading_type_gpu_values() {
        assert_eq!(HeadingType::Absolute.as_gpu(), 0);
        assert_eq!(HeadingType::Relative.as_gpu(), 1);
    }
}
