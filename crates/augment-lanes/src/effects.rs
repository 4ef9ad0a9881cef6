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

//! Time sampling of anchor effects into [`AnchorEffectsUniforms`].

use crate::animation::lower_bound_keyframe_index;
use augment_core::ar::{Effect, EffectKind, EffectValue};
use augment_core::math::{to_gpu_mat4, Mat4, Vec3};
use augment_core::renderer::AnchorEffectsUniforms;

/// Value of `effect` at `seconds`, linearly interpolated between keyframes.
pub fn sample_effect(effect: &Effect, seconds: f64) -> Option<EffectValue> {
    let keyframes = effect.keyframes();
    let times: Vec<f64> = keyframes.iter().map(|k| k.time).collect();
    let index = lower_bound_keyframe_index(&times, seconds)?;
    let current = keyframes[index];
    match keyframes.get(index + 1) {
        Some(next) if seconds > current.time && next.time > current.time => {
            let t = ((seconds - current.time) / (next.time - current.time)) as f32;
            Some(current.value.lerp(next.value, t.clamp(0.0, 1.0)))
        }
        _ => Some(current.value),
    }
}

/// Builds the effects block of one instance.
///
/// Every field is written: effects missing from the list fall back to
/// alpha 1, glow 0, white tint and identity scale.
pub fn evaluate_effects(effects: &[Effect], seconds: f64) -> AnchorEffectsUniforms {
    let mut alpha = 1.0;
    let mut glow = 0.0;
    let mut tint = Vec3::ONE;
    let mut scale = Mat4::IDENTITY;

    for effect in effects {
        let Some(value) = sample_effect(effect, seconds) else {
            continue;
        };
        match (effect.kind(), value) {
            (EffectKind::Alpha, EffectValue::Scalar(v)) => alpha = v,
            (EffectKind::Glow, EffectValue::Scalar(v)) => glow = v,
            (EffectKind::Tint, EffectValue::Vector(v)) => tint = v,
            (EffectKind::Scale, EffectValue::Vector(v)) => scale = Mat4::from_scale(v),
            (EffectKind::Scale, EffectValue::Scalar(v)) => scale = Mat4::from_scale(Vec3::splat(v)),
            (kind, value) => {
                log::trace!("Ignoring {value:?} for effect {kind:?}");
            }
        }
    }

    AnchorEffectsUniforms::new(alpha, glow, tint.to_array(), to_gpu_mat4(&scale))
}
