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

//! Mathematics helpers for the AR renderer.
//!
//! Linear algebra is provided by [`glam`]; this module re-exports the types used
//! throughout the workspace and adds the handful of transform utilities the
//! render modules share (translation extraction, normal matrices, cylinder
//! transforms for path segments and the colour temperature conversion used by
//! the light estimate).

pub use glam::{Mat3, Mat4, Quat, UVec2, Vec2, Vec3, Vec4};

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

/// Converts a [`Mat4`] into the column-major array layout expected by the shaders.
#[inline]
pub fn to_gpu_mat4(matrix: &Mat4) -> [[f32; 4]; 4] {
    matrix.to_cols_array_2d()
}

/// Converts a [`Mat3`] into the padded column layout expected by the shaders.
#[inline]
pub fn to_gpu_mat3(matrix: &Mat3) -> [[f32; 4]; 3] {
    [
        matrix.x_axis.extend(0.0).to_array(),
        matrix.y_axis.extend(0.0).to_array(),
        matrix.z_axis.extend(0.0).to_array(),
    ]
}

/// Returns the translation component of an affine transform.
#[inline]
pub fn translation_of(transform: &Mat4) -> Vec3 {
    transform.w_axis.truncate()
}

/// Euclidean distance between the translation components of two transforms.
#[inline]
pub fn distance_between(a: &Mat4, b: &Mat4) -> f32 {
    translation_of(a).distance(translation_of(b))
}

/// Computes the normal matrix (inverse transpose of the upper 3x3) of a model matrix.
///
/// Returns the identity when the model matrix is singular, which happens for
/// degenerate scale effects (a scale of zero on any axis).
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(*model);
    if upper.determinant().abs() <= EPSILON * EPSILON {
        return Mat3::IDENTITY;
    }
    upper.inverse().transpose()
}

/// Expands a [`Mat3`] into a [`Mat4`] with an identity translation row/column.
#[inline]
pub fn mat3_to_mat4(matrix: &Mat3) -> Mat4 {
    Mat4::from_mat3(*matrix)
}

/// Builds the transform of a unit cylinder (height 1 along +Y, centred at the
/// origin) so that it spans the segment `start..end` with the given radius.
///
/// The cylinder is translated to the segment midpoint, rotated so its Y axis
/// follows the segment direction, and scaled along Y to the segment length.
pub fn segment_transform(start: Vec3, end: Vec3, radius: f32) -> Mat4 {
    let delta = end - start;
    let length = delta.length();
    let midpoint = start + delta * 0.5;
    let rotation = if length <= EPSILON {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::Y, delta / length)
    };
    Mat4::from_scale_rotation_translation(Vec3::new(radius, length, radius), rotation, midpoint)
}

/// Converts a colour temperature in Kelvin into a normalised linear RGB colour.
///
/// Uses the piecewise approximation of the black-body curve commonly used for
/// light estimation. The input is clamped to `1000..=40000` Kelvin.
pub fn color_temperature_to_rgb(kelvin: f32) -> Vec3 {
    let temperature = kelvin.clamp(1000.0, 40000.0) / 100.0;

    let red = if temperature <= 66.0 {
        255.0
    } else {
        329.698_73 * (temperature - 60.0).powf(-0.133_204_76)
    };

    let green = if temperature <= 66.0 {
        99.470_8 * temperature.ln() - 161.119_57
    } else {
        288.122_16 * (temperature - 60.0).powf(-0.075_514_85)
    };

    let blue = if temperature >= 66.0 {
        255.0
    } else if temperature <= 19.0 {
        0.0
    } else {
        138.517_73 * (temperature - 10.0).ln() - 305.044_8
    };

    Vec3::new(red, green, blue).clamp(Vec3::ZERO, Vec3::splat(255.0)) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segment_transform_spans_segment() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(0.0, 0.0, 4.0);
        let transform = segment_transform(start, end, 0.1);

        // The top of the unit cylinder lands on `end`, the bottom on `start`.
        let top = transform.transform_point3(Vec3::new(0.0, 0.5, 0.0));
        let bottom = transform.transform_point3(Vec3::new(0.0, -0.5, 0.0));
        assert_relative_eq!(top, end, epsilon = 1e-5);
        assert_relative_eq!(bottom, start, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_segment_has_no_rotation() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let transform = segment_transform(p, p, 0.5);
        assert_relative_eq!(translation_of(&transform), p);
    }

    #[test]
    fn normal_matrix_of_singular_model_is_identity() {
        let model = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(normal_matrix(&model), Mat3::IDENTITY);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let normal = normal_matrix(&model);
        assert_relative_eq!(normal.x_axis.x, 0.5);
    }

    #[test]
    fn neutral_temperature_is_close_to_white() {
        let rgb = color_temperature_to_rgb(6500.0);
        assert_relative_eq!(rgb.x, 1.0, epsilon = 1e-3);
        assert!(rgb.y > 0.95 && rgb.z > 0.9);
    }

    #[test]
    fn warm_temperature_has_less_blue() {
        let warm = color_temperature_to_rgb(2700.0);
        let cold = color_temperature_to_rgb(9000.0);
        assert!(warm.z < cold.z);
        assert!(warm.x >= cold.x);
    }
}
