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

//! Texture handles and formats.

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Pixel formats the renderer uses for attachments and camera images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit single channel, used for the camera luma plane.
    R8Unorm,
    /// 8-bit two channel, used for the camera chroma plane.
    Rg8Unorm,
    /// 8-bit BGRA in sRGB space.
    Bgra8UnormSrgb,
    /// 16-bit float RGBA.
    Rgba16Float,
    /// 32-bit depth, used by the shadow map.
    Depth32Float,
    /// 32-bit depth with 8-bit stencil.
    Depth32FloatStencil8,
}

impl TextureFormat {
    /// Returns `true` if this format carries depth.
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth32FloatStencil8
        )
    }
}
