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

//! Assignment of instance slots to entities.
//!
//! One frame of an instanced module lays its slots out group by group, in
//! the order the groups are stored in the pass. Inside a group every draw
//! call owns a contiguous run of one slot per entity:
//!
//! ```text
//! | group A: dc0 e0 e1 | dc1 e0 e1 | group B: dc0 e0 e1 e2 | ...
//! ```
//!
//! Entities are admitted in input order. Admission stops at the first
//! entity whose draw calls no longer fit under the cap; later entities are
//! dropped for the frame.

use crate::draw_call::DrawCallGroup;
use crate::transform::{entity_position, within_render_distance, ComposedTransform};
use augment_core::ar::{CameraProperties, EnvironmentProbe, EnvironmentProperties, GeometricEntity, ShadowProperties};
use augment_core::math::{to_gpu_mat3, to_gpu_mat4};
use augment_core::renderer::{AnchorInstanceUniforms, EnvironmentUniforms, ModuleIdentifier, GPU_IDENTITY};
use std::collections::HashMap;
use uuid::Uuid;

/// The entities drawn by one group this frame.
#[derive(Debug, Clone)]
pub struct PlannedGroup<'a> {
    #[allow(missing_docs)]
    pub uuid: Uuid,
    /// First slot of the group.
    pub base_slot: usize,
    /// Draw calls in the group.
    pub draw_call_count: usize,
    /// Admitted entities, in input order.
    pub entities: Vec<&'a GeometricEntity>,
}

impl PlannedGroup<'_> {
    /// Instances drawn by each draw call of the group.
    pub fn instance_count(&self) -> usize {
        self.entities.len()
    }

    /// First slot of draw call `draw_call`.
    pub fn draw_call_base(&self, draw_call: usize) -> usize {
        self.base_slot + draw_call * self.entities.len()
    }

    /// Slot of entity `entity` in draw call `draw_call`.
    pub fn slot(&self, draw_call: usize, entity: usize) -> usize {
        self.draw_call_base(draw_call) + entity
    }

    /// Slots used by the whole group.
    pub fn slot_count(&self) -> usize {
        self.draw_call_count * self.entities.len()
    }
}

/// The slot layout of one module for one frame.
#[derive(Debug, Clone, Default)]
pub struct InstancePlan<'a> {
    /// Groups with at least one admitted entity, in stored order.
    pub groups: Vec<PlannedGroup<'a>>,
    /// Slots used across all groups.
    pub slot_count: usize,
    /// Entities beyond the render distance.
    pub culled: usize,
    /// Entities dropped by the cap.
    pub dropped: usize,
}

/// Lays out this frame's slots for `module`.
///
/// `groups` are the module's groups in stored order. An entity draws with the
/// group of its own identifier when there is one, otherwise with the group of
/// the module's general model. Entities with neither are skipped.
pub fn plan_instances<'a>(
    module: ModuleIdentifier,
    groups: &[&DrawCallGroup],
    entities: &'a [GeometricEntity],
    camera: &CameraProperties,
    render_distance: f32,
    max_slots: usize,
) -> InstancePlan<'a> {
    let draw_calls: HashMap<Uuid, usize> = groups.iter().map(|g| (g.uuid, g.draw_calls.len())).collect();
    let general = module.general_uuid();

    let mut plan = InstancePlan::default();
    let mut buckets: HashMap<Uuid, Vec<&'a GeometricEntity>> = HashMap::new();
    let mut running = 0;

    let mut candidates = entities.iter().filter(|e| module.accepts(e.kind()));
    while let Some(entity) = candidates.next() {
        if !within_render_distance(entity_position(entity, camera), camera, render_distance) {
            plan.culled += 1;
            continue;
        }
        let uuid = match entity.identifier() {
            Some(id) if draw_calls.contains_key(&id) => id,
            _ => general,
        };
        let Some(&cost) = draw_calls.get(&uuid) else {
            continue;
        };
        if running + cost > max_slots {
            plan.dropped = 1 + candidates.count();
            break;
        }
        running += cost;
        buckets.entry(uuid).or_default().push(entity);
    }

    for group in groups {
        let Some(members) = buckets.remove(&group.uuid) else {
            continue;
        };
        let planned = PlannedGroup {
            uuid: group.uuid,
            base_slot: plan.slot_count,
            draw_call_count: group.draw_calls.len(),
            entities: members,
        };
        plan.slot_count += planned.slot_count();
        plan.groups.push(planned);
    }

    plan
}

/// Per-instance uniforms of a composed transform.
pub fn instance_uniforms(composed: &ComposedTransform) -> AnchorInstanceUniforms {
    let mut uniforms = AnchorInstanceUniforms::empty();
    uniforms.has_geometry = 1;
    if let Some(heading) = composed.heading {
        uniforms.has_heading = 1;
        uniforms.heading_type = heading.heading_type.as_gpu();
        uniforms.heading_transform = to_gpu_mat4(&heading.transform());
    } else {
        uniforms.heading_transform = GPU_IDENTITY;
    }
    uniforms.location_transform = to_gpu_mat4(&composed.location);
    uniforms.world_transform = to_gpu_mat4(&composed.world);
    uniforms.model_matrix = to_gpu_mat4(&composed.model);
    uniforms.normal_matrix = to_gpu_mat3(&composed.normal);
    uniforms
}

/// Lighting uniforms for one instance.
///
/// Without a light estimate the default ambient term is kept.
pub fn environment_uniforms(
    environment: &EnvironmentProperties,
    shadow: &ShadowProperties,
    probe: Option<&EnvironmentProbe>,
) -> EnvironmentUniforms {
    let mut uniforms = EnvironmentUniforms::default();
    if let Some(estimate) = &environment.light_estimate {
        uniforms.ambient_light_color = estimate.ambient_color().to_array();
        uniforms.ambient_light_intensity = estimate.normalized_intensity();
    }
    uniforms.directional_light_direction = environment.directional_light_direction.to_array();
    uniforms.directional_light_color = environment.directional_light_color.to_array();
    uniforms.has_environment_map = probe.map_or(0, |p| i32::from(p.texture.is_some()));
    uniforms.directional_light_mvp = to_gpu_mat4(&shadow.directional_light_mvp);
    uniforms.shadow_mvp_transform_matrix = to_gpu_mat4(&shadow.shadow_mvp_matrix);
    uniforms
}

#[cfg(test)]
mod tests {
    use super::*;
    use augment_core::ar::AnchorState;
    use augment_core::math::{Mat4, Vec3};

    fn anchor_at(x: f32, id: Option<Uuid>) -> GeometricEntity {
        let mut state = AnchorState::new(Mat4::from_translation(Vec3::new(x, 0.0, 0.0)));
        state.identifier = id;
        GeometricEntity::augmented(state)
    }

    fn group(uuid: Uuid, draw_calls: usize) -> DrawCallGroup {
        let mut group = DrawCallGroup::new(uuid, ModuleIdentifier::Anchors, Vec::new(), false);
        group.draw_calls = crate::draw_call::fake_draw_calls(draw_calls);
        group
    }

    #[test]
    fn groups_are_contiguous_in_stored_order() {
        let general = ModuleIdentifier::Anchors.general_uuid();
        let custom = Uuid::new_v4();
        let mut groups = vec![group(general, 1), group(custom, 2)];
        crate::draw_call::sort_draw_call_groups(&mut groups);
        let refs: Vec<_> = groups.iter().collect();

        let entities = vec![
            anchor_at(1.0, Some(custom)),
            anchor_at(2.0, None),
            anchor_at(3.0, Some(custom)),
            anchor_at(4.0, Some(Uuid::new_v4())),
        ];
        let plan = plan_instances(
            ModuleIdentifier::Anchors,
            &refs,
            &entities,
            &CameraProperties::default(),
            500.0,
            256,
        );

        assert_eq!(plan.slot_count, 2 * 2 + 2);
        let mut next = 0;
        for planned in &plan.groups {
            assert_eq!(planned.base_slot, next);
            next += planned.slot_count();
        }
        let custom_group = plan.groups.iter().find(|g| g.uuid == custom).map(|g| g.instance_count());
        assert_eq!(custom_group, Some(2));
    }

    #[test]
    fn cap_keeps_first_seen_entities() {
        let general = ModuleIdentifier::Anchors.general_uuid();
        let groups = [group(general, 1)];
        let refs: Vec<_> = groups.iter().collect();
        let entities: Vec<_> = (0..10).map(|i| anchor_at(i as f32, None)).collect();

        let plan = plan_instances(
            ModuleIdentifier::Anchors,
            &refs,
            &entities,
            &CameraProperties::default(),
            500.0,
            4,
        );

        assert_eq!(plan.slot_count, 4);
        assert_eq!(plan.dropped, 6);
        let kept: Vec<f32> = plan.groups[0].entities.iter().map(|e| e.position().x).collect();
        assert_eq!(kept, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn render_distance_is_strict() {
        let general = ModuleIdentifier::Anchors.general_uuid();
        let groups = [group(general, 1)];
        let refs: Vec<_> = groups.iter().collect();
        let entities = vec![anchor_at(9.999, None), anchor_at(10.0, None)];

        let plan = plan_instances(
            ModuleIdentifier::Anchors,
            &refs,
            &entities,
            &CameraProperties::default(),
            10.0,
            256,
        );

        assert_eq!(plan.slot_count, 1);
        assert_eq!(plan.culled, 1);
    }

    #[test]
    fn missing_light_estimate_keeps_default_ambient() {
        let uniforms = environment_uniforms(&EnvironmentProperties::default(), &ShadowProperties::default(), None);
        assert_eq!(
            uniforms.ambient_light_color,
            EnvironmentUniforms::default().ambient_light_color
        );
        assert_eq!(uniforms.has_environment_map, 0);
    }
}
