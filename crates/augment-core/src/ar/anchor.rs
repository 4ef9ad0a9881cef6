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

use super::effects::Effect;
use super::heading::Heading;
use crate::math::{translation_of, Mat4, Vec3};
use uuid::Uuid;

/// State every kind of geometric entity carries.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorState {
    /// Model identity. `None` selects the module's general model.
    pub identifier: Option<Uuid>,
    /// World transform from the tracking session.
    pub transform: Mat4,
    /// Optional orientation offset.
    pub heading: Option<Heading>,
    /// Time-varying effects. Empty means defaults.
    pub effects: Vec<Effect>,
    /// Whether the entity is drawn into the shadow map.
    pub generates_shadows: bool,
}

impl AnchorState {
    /// A state at `transform` with no identity, heading or effects.
    pub fn new(transform: Mat4) -> Self {
        Self {
            identifier: None,
            transform,
            heading: None,
            effects: Vec::new(),
            generates_shadows: false,
        }
    }

    /// Sets the model identity.
    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Sets the heading.
    pub fn with_heading(mut self, heading: Heading) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Sets the effect list.
    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    /// Sets the shadow flag.
    pub fn with_shadows(mut self, generates_shadows: bool) -> Self {
        self.generates_shadows = generates_shadows;
        self
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        translation_of(&self.transform)
    }
}

/// A user-placed virtual object.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedAnchor {
    #[allow(missing_docs)]
    pub state: AnchorState,
}

/// A detected real-world plane.
#[derive(Debug, Clone, PartialEq)]
pub struct RealSurfaceAnchor {
    #[allow(missing_docs)]
    pub state: AnchorState,
    /// Size of the plane along its local axes.
    pub extent: Vec3,
}

/// An object tracking something that moves, optionally the camera itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerAnchor {
    #[allow(missing_docs)]
    pub state: AnchorState,
    /// When set, `state.transform` is relative to the camera.
    pub follows_camera: bool,
}

/// A marker that always turns to face the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct GazeTarget {
    #[allow(missing_docs)]
    pub state: AnchorState,
}

/// One point of a path. Consecutive points of the same path form segments.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegmentAnchor {
    #[allow(missing_docs)]
    pub state: AnchorState,
    /// The path this point belongs to.
    pub path_identifier: Uuid,
    /// Ordering of the point along its path.
    pub sequence: u32,
}

/// An object placed in world space without a tracked anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct UnanchoredObject {
    #[allow(missing_docs)]
    pub state: AnchorState,
}

/// The closed set of entity kinds, without payload.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Augmented,
    Surface,
    Tracker,
    Target,
    PathSegment,
    Unanchored,
}

impl EntityKind {
    /// Type tag passed to the model provider.
    pub const fn type_tag(self) -> &'static str {
        match self {
            EntityKind::Augmented => "AugmentedAnchor",
            EntityKind::Surface => "RealSurface",
            EntityKind::Tracker => "Tracker",
            EntityKind::Target => "GazeTarget",
            EntityKind::PathSegment => "PathSegment",
            EntityKind::Unanchored => "Unanchored",
        }
    }
}

/// Anything the AR session hands to the renderer for drawing.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum GeometricEntity {
    Augmented(AugmentedAnchor),
    Surface(RealSurfaceAnchor),
    Tracker(TrackerAnchor),
    Target(GazeTarget),
    PathSegment(PathSegmentAnchor),
    Unanchored(UnanchoredObject),
}

impl GeometricEntity {
    /// The variant without payload.
    pub fn kind(&self) -> EntityKind {
        match self {
            GeometricEntity::Augmented(_) => EntityKind::Augmented,
            GeometricEntity::Surface(_) => EntityKind::Surface,
            GeometricEntity::Tracker(_) => EntityKind::Tracker,
            GeometricEntity::Target(_) => EntityKind::Target,
            GeometricEntity::PathSegment(_) => EntityKind::PathSegment,
            GeometricEntity::Unanchored(_) => EntityKind::Unanchored,
        }
    }

    /// The shared state of the entity.
    pub fn state(&self) -> &AnchorState {
        match self {
            GeometricEntity::Augmented(a) => &a.state,
            GeometricEntity::Surface(a) => &a.state,
            GeometricEntity::Tracker(a) => &a.state,
            GeometricEntity::Target(a) => &a.state,
            GeometricEntity::PathSegment(a) => &a.state,
            GeometricEntity::Unanchored(a) => &a.state,
        }
    }

    /// The model identity, if any.
    pub fn identifier(&self) -> Option<Uuid> {
        self.state().identifier
    }

    /// Type tag passed to the model provider.
    pub fn type_tag(&self) -> &'static str {
        self.kind().type_tag()
    }

    /// Tracked world transform.
    pub fn transform(&self) -> &Mat4 {
        &self.state().transform
    }

    /// Tracked world-space position.
    pub fn position(&self) -> Vec3 {
        self.state().position()
    }

    /// Shortcut for an augmented anchor.
    pub fn augmented(state: AnchorState) -> Self {
        GeometricEntity::Augmented(AugmentedAnchor { state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_tag_follow_variant() {
        let entity = GeometricEntity::Surface(RealSurfaceAnchor {
            state: AnchorState::new(Mat4::IDENTITY),
            extent: Vec3::ONE,
        });
        assert_eq!(entity.kind(), EntityKind::Surface);
        assert_eq!(entity.type_tag(), "RealSurface");
        assert!(entity.identifier().is_none());
    }

    #[test]
    fn position_reads_translation() {
        let entity = GeometricEntity::augmented(AnchorState::new(Mat4::from_translation(
            Vec3::new(0.0, 1.0, -2.0),
        )));
        assert_eq!(entity.position(), Vec3::new(0.0, 1.0, -2.0));
    }
}
