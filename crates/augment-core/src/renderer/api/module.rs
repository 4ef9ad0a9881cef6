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

//! Identity of the render modules.
//!
//! Modules are told apart by this closed enum rather than by their concrete
//! type; the tag is stamped on every draw call group a module builds.

use crate::ar::EntityKind;
use uuid::Uuid;

/// Namespace for the deterministic "general" model identifiers.
const GENERAL_NAMESPACE: Uuid = Uuid::from_u128(0x6a2f_41c3_9f0e_4c1d_b5a8_7e3d_2c91_0f54);

/// Every render or compute module the orchestrator can host.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleIdentifier {
    Precalculation,
    CameraPlane,
    SharedBuffers,
    Surfaces,
    Anchors,
    Trackers,
    Unanchored,
    Paths,
    TrackingPoints,
}

impl ModuleIdentifier {
    /// Human readable name, used in logs and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ModuleIdentifier::Precalculation => "PrecalculationModule",
            ModuleIdentifier::CameraPlane => "CameraPlaneRenderModule",
            ModuleIdentifier::SharedBuffers => "SharedBuffersRenderModule",
            ModuleIdentifier::Surfaces => "SurfacesRenderModule",
            ModuleIdentifier::Anchors => "AnchorsRenderModule",
            ModuleIdentifier::Trackers => "TrackersRenderModule",
            ModuleIdentifier::Unanchored => "UnanchoredRenderModule",
            ModuleIdentifier::Paths => "PathsRenderModule",
            ModuleIdentifier::TrackingPoints => "TrackingPointsRenderModule",
        }
    }

    /// Draw order. Lower layers run first; compute modules use negative layers.
    pub const fn render_layer(self) -> i32 {
        match self {
            ModuleIdentifier::Precalculation => -1,
            ModuleIdentifier::CameraPlane => 0,
            ModuleIdentifier::SharedBuffers => 1,
            ModuleIdentifier::Surfaces => 2,
            ModuleIdentifier::Anchors => 11,
            ModuleIdentifier::Trackers | ModuleIdentifier::Unanchored => 12,
            ModuleIdentifier::Paths => 13,
            ModuleIdentifier::TrackingPoints => i32::MAX,
        }
    }

    /// Maximum number of instances the module reserves per frame.
    pub const fn max_instance_count(self) -> usize {
        match self {
            ModuleIdentifier::Anchors => 256,
            ModuleIdentifier::Surfaces
            | ModuleIdentifier::Trackers
            | ModuleIdentifier::Unanchored => 64,
            ModuleIdentifier::Paths => 2048,
            ModuleIdentifier::TrackingPoints => 2048,
            ModuleIdentifier::Precalculation => 256 + 64 * 3 + 2048,
            ModuleIdentifier::CameraPlane | ModuleIdentifier::SharedBuffers => 1,
        }
    }

    /// The entity kinds the module renders.
    pub const fn accepted_kinds(self) -> &'static [EntityKind] {
        match self {
            ModuleIdentifier::Anchors => &[EntityKind::Augmented],
            ModuleIdentifier::Surfaces => &[EntityKind::Surface],
            ModuleIdentifier::Trackers => &[EntityKind::Tracker, EntityKind::Target],
            ModuleIdentifier::Unanchored => &[EntityKind::Unanchored],
            ModuleIdentifier::Paths => &[EntityKind::PathSegment],
            ModuleIdentifier::Precalculation
            | ModuleIdentifier::CameraPlane
            | ModuleIdentifier::SharedBuffers
            | ModuleIdentifier::TrackingPoints => &[],
        }
    }

    /// Returns `true` if entities of `kind` belong to this module.
    pub fn accepts(self, kind: EntityKind) -> bool {
        self.accepted_kinds().contains(&kind)
    }

    /// Identifier of the fallback model used for entities without their own.
    ///
    /// Stable across runs so group ordering is reproducible.
    pub fn general_uuid(self) -> Uuid {
        Uuid::new_v5(&GENERAL_NAMESPACE, self.name().as_bytes())
    }
}

impl std::fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_follow_draw_order() {
        assert!(ModuleIdentifier::Precalculation.render_layer() < 0);
        assert_eq!(ModuleIdentifier::CameraPlane.render_layer(), 0);
        assert_eq!(ModuleIdentifier::SharedBuffers.render_layer(), 1);
        assert_eq!(ModuleIdentifier::Surfaces.render_layer(), 2);
        assert_eq!(ModuleIdentifier::Anchors.render_layer(), 11);
        assert_eq!(ModuleIdentifier::Trackers.render_layer(), 12);
        assert_eq!(ModuleIdentifier::TrackingPoints.render_layer(), i32::MAX);
    }

    #[test]
    fn general_uuid_is_stable_and_distinct() {
        assert_eq!(
            ModuleIdentifier::Anchors.general_uuid(),
            ModuleIdentifier::Anchors.general_uuid()
        );
        assert_ne!(
            ModuleIdentifier::Anchors.general_uuid(),
            ModuleIdentifier::Surfaces.general_uuid()
        );
    }

    #[test]
    fn trackers_accept_targets() {
        assert!(ModuleIdentifier::Trackers.accepts(EntityKind::Tracker));
        assert!(ModuleIdentifier::Trackers.accepts(EntityKind::Target));
        assert!(!ModuleIdentifier::Anchors.accepts(EntityKind::Target));
    }
}
