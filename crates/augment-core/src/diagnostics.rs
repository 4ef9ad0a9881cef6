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

//! Structured diagnostics recorded by render modules.
//!
//! Modules never return errors across their boundary. Failures are appended
//! to an [`ErrorLog`] and the module degrades (empty draw list, zero
//! instances, disabled) so the frame loop keeps running. The host inspects the
//! log to decide whether to end the session.

use crate::renderer::ModuleIdentifier;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// How badly a failure affects rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Degraded capability; processing continues.
    Warning,
    /// One module skips the current frame.
    Recoverable,
    /// The module is disabled for the rest of the session.
    Serious,
}

/// What failed.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    ModelNotFound,
    MeshDataUnavailable,
    DeviceNotFound,
    PipelineInitializationFailed,
    BufferAllocationFailed,
    PaletteOverflow,
    RenderPassUnavailable,
    InvalidAssetData,
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModuleError {
    #[allow(missing_docs)]
    pub severity: ErrorSeverity,
    #[allow(missing_docs)]
    pub category: ErrorCategory,
    /// The module that recorded it.
    pub module: ModuleIdentifier,
    /// Free-form detail.
    pub message: String,
}

impl RenderModuleError {
    /// Creates a new error record.
    pub fn new(
        severity: ErrorSeverity,
        category: ErrorCategory,
        module: ModuleIdentifier,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            module,
            message: message.into(),
        }
    }

    /// A warning-level record.
    pub fn warning(category: ErrorCategory, module: ModuleIdentifier, message: impl Into<String>) -> Self {
        Self::new(ErrorSeverity::Warning, category, module, message)
    }

    /// A recoverable record.
    pub fn recoverable(
        category: ErrorCategory,
        module: ModuleIdentifier,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorSeverity::Recoverable, category, module, message)
    }

    /// A serious record.
    pub fn serious(category: ErrorCategory, module: ModuleIdentifier, message: impl Into<String>) -> Self {
        Self::new(ErrorSeverity::Serious, category, module, message)
    }
}

impl fmt::Display for RenderModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} {:?}: {}",
            self.severity, self.module, self.category, self.message
        )
    }
}

impl std::error::Error for RenderModuleError {}

/// A shared, append-only list of [`RenderModuleError`]s.
///
/// Cloning yields another handle to the same list, so asset callbacks running
/// on loader threads can record into the owning module's log.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<RenderModuleError>>>,
}

impl ErrorLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RenderModuleError>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an error and forwards it to the logger.
    pub fn record(&self, error: RenderModuleError) {
        match error.severity {
            ErrorSeverity::Serious => log::error!("{error}"),
            ErrorSeverity::Warning | ErrorSeverity::Recoverable => log::warn!("{error}"),
        }
        self.lock().push(error);
    }

    /// A copy of every recorded error.
    pub fn snapshot(&self) -> Vec<RenderModuleError> {
        self.lock().clone()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of errors matching both `severity` and `category`.
    pub fn count(&self, severity: ErrorSeverity, category: ErrorCategory) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.severity == severity && e.category == category)
            .count()
    }

    /// Returns `true` if any serious error was recorded.
    pub fn has_serious(&self) -> bool {
        self.lock().iter().any(|e| e.severity == ErrorSeverity::Serious)
    }

    /// Removes and returns every recorded error.
    pub fn drain(&self) -> Vec<RenderModuleError> {
        std::mem::take(&mut *self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let log = ErrorLog::new();
        let handle = log.clone();
        handle.record(RenderModuleError::warning(
            ErrorCategory::ModelNotFound,
            ModuleIdentifier::Anchors,
            "no model for anchor",
        ));

        assert_eq!(log.len(), 1);
        assert_eq!(log.count(ErrorSeverity::Warning, ErrorCategory::ModelNotFound), 1);
        assert!(!log.has_serious());
    }

    #[test]
    fn serious_errors_are_flagged() {
        let log = ErrorLog::new();
        log.record(RenderModuleError::serious(
            ErrorCategory::DeviceNotFound,
            ModuleIdentifier::Surfaces,
            "no device",
        ));
        assert!(log.has_serious());
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn display_names_module_and_category() {
        let error = RenderModuleError::recoverable(
            ErrorCategory::MeshDataUnavailable,
            ModuleIdentifier::Anchors,
            "mesh missing",
        );
        let text = error.to_string();
        assert!(text.contains("AnchorsRenderModule"));
        assert!(text.contains("MeshDataUnavailable"));
    }
}
