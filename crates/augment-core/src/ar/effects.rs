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

use crate::math::Vec3;

/// The visual property an [`Effect`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Opacity, scalar.
    Alpha,
    /// Emissive boost, scalar.
    Glow,
    /// Multiplicative color.
    Tint,
    /// Per-axis model scale.
    Scale,
}

/// A sampled effect value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectValue {
    /// A single float, for alpha and glow.
    Scalar(f32),
    /// A three component vector, for tint and scale.
    Vector(Vec3),
}

impl EffectValue {
    /// Linear interpolation; mismatched variants snap to `self`.
    pub fn lerp(self, other: EffectValue, t: f32) -> EffectValue {
        match (self, other) {
            (EffectValue::Scalar(a), EffectValue::Scalar(b)) => EffectValue::Scalar(a + (b - a) * t),
            (EffectValue::Vector(a), EffectValue::Vector(b)) => EffectValue::Vector(a.lerp(b, t)),
            _ => self,
        }
    }
}

/// One keyframe of an effect timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectKeyframe {
    /// Session time in seconds.
    pub time: f64,
    /// Value at that time.
    pub value: EffectValue,
}

/// A time-varying visual effect attached to an anchor.
///
/// Keyframes are kept sorted by time so lookups can binary search them.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    kind: EffectKind,
    keyframes: Vec<EffectKeyframe>,
}

impl Effect {
    /// An effect that holds one value forever.
    pub fn constant(kind: EffectKind, value: EffectValue) -> Self {
        Self {
            kind,
            keyframes: vec![EffectKeyframe { time: 0.0, value }],
        }
    }

    /// An effect interpolated between keyframes.
    pub fn animated(kind: EffectKind, mut keyframes: Vec<EffectKeyframe>) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { kind, keyframes }
    }

    /// The driven property.
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Keyframes in ascending time order.
    pub fn keyframes(&self) -> &[EffectKeyframe] {
        &self.keyframes
    }

    /// Keyframe timestamps in ascending order.
    pub fn key_times(&self) -> Vec<f64> {
        self.keyframes.iter().map(|k| k.time).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animated_effects_sort_keyframes() {
        let effect = Effect::animated(
            EffectKind::Alpha,
            vec![
                EffectKeyframe { time: 2.0, value: EffectValue::Scalar(0.0) },
                EffectKeyframe { time: 0.5, value: EffectValue::Scalar(1.0) },
            ],
        );
        assert_eq!(effect.key_times(), vec![0.5, 2.0]);
    }

    #[test]
    fn lerp_between_scalars() {
        let mid = EffectValue::Scalar(0.0).lerp(EffectValue::Scalar(1.0), 0.25);
        assert_eq!(mid, EffectValue::Scalar(0.25));
    }
}
