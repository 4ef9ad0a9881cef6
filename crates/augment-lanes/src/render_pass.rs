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

//! The render pass a frame is encoded into.
//!
//! A [`RenderPass`] owns the draw call groups of every module that renders
//! into it, plus the flags that tell modules which optional buffers the pass
//! reads. A depth-only shadow pass, for example, skips the environment and
//! effects bindings.

use crate::draw_call::{sort_draw_call_groups, DrawCallGroup};
use augment_core::renderer::{
    CullMode, DepthBias, ModuleIdentifier, RenderDestination, TextureFormat,
};

/// What a pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Color and depth of the composited frame.
    Main,
    /// Depth of shadow casters, seen from the key light.
    Shadow,
}

/// Predicate narrowing the groups drawn in a pass.
pub type GroupFilter = fn(&DrawCallGroup) -> bool;

fn casts_shadows(group: &DrawCallGroup) -> bool {
    group.generates_shadows
}

/// Attachment formats and fixed state of a pass, used when compiling pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassTemplate {
    #[allow(missing_docs)]
    pub kind: RenderPassKind,
    /// Debug label.
    pub label: String,
    /// Color attachment format, `None` for depth-only passes.
    pub color_format: Option<TextureFormat>,
    /// Depth attachment format.
    pub depth_format: TextureFormat,
    /// MSAA sample count.
    pub sample_count: u32,
    /// Cull mode applied to every draw call built for this pass.
    pub cull_mode: CullMode,
    /// Depth bias applied to every draw call built for this pass.
    pub depth_bias: Option<DepthBias>,
}

impl RenderPassTemplate {
    /// The main color pass rendering into `destination`.
    pub fn main(destination: &RenderDestination) -> Self {
        Self {
            kind: RenderPassKind::Main,
            label: "Main Render Pass".to_string(),
            color_format: Some(destination.color_format),
            depth_format: destination.depth_stencil_format,
            sample_count: destination.sample_count,
            cull_mode: CullMode::Back,
            depth_bias: None,
        }
    }

    /// The depth-only shadow pass.
    pub fn shadow() -> Self {
        Self {
            kind: RenderPassKind::Shadow,
            label: "Shadow Render Pass".to_string(),
            color_format: None,
            depth_format: TextureFormat::Depth32Float,
            sample_count: 1,
            cull_mode: CullMode::Front,
            depth_bias: Some(DepthBias {
                depth_bias: 0.015,
                slope_scale: 7.0,
                clamp: 0.02,
            }),
        }
    }
}

/// A pass and the draw call groups recorded into it.
#[derive(Debug, Clone)]
pub struct RenderPass {
    #[allow(missing_docs)]
    pub template: RenderPassTemplate,
    /// Groups of every module, in UUID string order.
    pub draw_call_groups: Vec<DrawCallGroup>,
    /// Bind the shared camera uniforms.
    pub uses_shared_buffer: bool,
    /// Bind environment lighting uniforms and textures.
    pub uses_environment: bool,
    /// Bind effects uniforms.
    pub uses_effects: bool,
    /// Bind the shadow map.
    pub uses_shadows: bool,
    /// Optional predicate applied on top of the module tag.
    pub group_filter: Option<GroupFilter>,
}

impl RenderPass {
    /// The main pass: every binding enabled.
    pub fn main(destination: &RenderDestination) -> Self {
        Self {
            template: RenderPassTemplate::main(destination),
            draw_call_groups: Vec::new(),
            uses_shared_buffer: true,
            uses_environment: true,
            uses_effects: true,
            uses_shadows: true,
            group_filter: None,
        }
    }

    /// The shadow pass: geometry and shared buffers only, shadow casters only.
    pub fn shadow() -> Self {
        Self {
            template: RenderPassTemplate::shadow(),
            draw_call_groups: Vec::new(),
            uses_shared_buffer: true,
            uses_environment: false,
            uses_effects: false,
            uses_shadows: false,
            group_filter: Some(casts_shadows),
        }
    }

    #[allow(missing_docs)]
    pub fn kind(&self) -> RenderPassKind {
        self.template.kind
    }

    /// Adds groups and restores the UUID order.
    pub fn add_groups(&mut self, groups: impl IntoIterator<Item = DrawCallGroup>) {
        self.draw_call_groups.extend(groups);
        sort_draw_call_groups(&mut self.draw_call_groups);
    }

    /// Removes every group owned by `module`.
    pub fn remove_groups(&mut self, module: ModuleIdentifier) {
        self.draw_call_groups.retain(|g| g.module != module);
    }

    /// Groups owned by `module` that pass the filter, in stored order.
    pub fn groups_for(&self, module: ModuleIdentifier) -> impl Iterator<Item = &DrawCallGroup> {
        let filter = self.group_filter;
        self.draw_call_groups
            .iter()
            .filter(move |g| g.module == module && filter.map_or(true, |f| f(g)))
    }

    /// Number of draw calls across all groups.
    pub fn draw_call_count(&self) -> usize {
        self.draw_call_groups.iter().map(|g| g.draw_calls.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn groups_stay_sorted_across_additions() {
        let mut pass = RenderPass::main(&RenderDestination::default());
        for _ in 0..4 {
            pass.add_groups([DrawCallGroup::new(
                Uuid::new_v4(),
                ModuleIdentifier::Anchors,
                Vec::new(),
                false,
            )]);
        }
        let keys: Vec<_> = pass.draw_call_groups.iter().map(|g| g.sort_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn shadow_pass_keeps_only_casters_of_the_module() {
        let mut pass = RenderPass::shadow();
        pass.add_groups([
            DrawCallGroup::new(Uuid::new_v4(), ModuleIdentifier::Anchors, Vec::new(), true),
            DrawCallGroup::new(Uuid::new_v4(), ModuleIdentifier::Anchors, Vec::new(), false),
            DrawCallGroup::new(Uuid::new_v4(), ModuleIdentifier::Surfaces, Vec::new(), true),
        ]);
        assert_eq!(pass.groups_for(ModuleIdentifier::Anchors).count(), 1);
        assert!(!pass.uses_environment);

        pass.remove_groups(ModuleIdentifier::Anchors);
        assert_eq!(pass.draw_call_groups.len(), 1);
    }
}
