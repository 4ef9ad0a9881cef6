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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::pipeline::ShaderLibraryId;
use std::fmt;

/// An error related to locating a shader function inside a compiled library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The library handle does not refer to a loaded library.
    LibraryNotFound {
        /// The ID of the missing library.
        id: ShaderLibraryId,
    },
    /// The named function is not present in the library.
    FunctionNotFound {
        /// The library that was searched.
        library: ShaderLibraryId,
        /// The function name that was not found.
        function: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LibraryNotFound { id } => {
                write!(f, "Shader library not found for ID: {id:?}")
            }
            ShaderError::FunctionNotFound { library, function } => {
                write!(f, "Shader function '{function}' not found in library {library:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation of a render, compute or depth-stencil state object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The backend failed to build the pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The color target format is not compatible with the pipeline or device.
    IncompatibleColorTarget(String),
    /// The depth/stencil format is not compatible with the pipeline or device.
    IncompatibleDepthStencilFormat(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::IncompatibleColorTarget(msg) => {
                write!(f, "Incompatible color target format: {msg}")
            }
            PipelineError::IncompatibleDepthStencilFormat(msg) => {
                write!(f, "Incompatible depth/stencil format: {msg}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation or use of a GPU resource (buffers, textures, etc.).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// The device could not satisfy an allocation request.
    AllocationFailed {
        /// The label of the resource being allocated.
        label: String,
        /// The requested size in bytes.
        size: u64,
    },
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::AllocationFailed { label, size } => {
                write!(f, "Failed to allocate {size} bytes for '{label}'")
            }
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn shader_errors_chain_through_resource_errors() {
        let err: ResourceError = ShaderError::FunctionNotFound {
            library: ShaderLibraryId(1),
            function: "anchorGeometryVertexTransform".to_string(),
        }
        .into();

        assert!(err.to_string().contains("anchorGeometryVertexTransform"));
        assert!(err.source().is_some());
    }

    #[test]
    fn out_of_bounds_has_no_source() {
        assert!(ResourceError::OutOfBounds.source().is_none());
    }
}
