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

//! Model requests and completion coalescing.
//!
//! A module asks the provider for its general model plus one model per
//! distinct identifier. Requests complete in any order, on any thread; the
//! module's completion fires once, after the last one.

use augment_core::ar::GeometricEntity;
use augment_core::asset::{MeshAsset, ModelProvider};
use augment_core::diagnostics::{ErrorCategory, ErrorLog, RenderModuleError};
use augment_core::renderer::ModuleIdentifier;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Called once when every request of a module has resolved.
pub type LoadCompletion = Box<dyn FnOnce() + Send + 'static>;

/// Turns `count` completions into one call of the wrapped callback.
#[derive(Clone)]
pub struct CompletionCountdown {
    remaining: Arc<AtomicUsize>,
    completion: Arc<Mutex<Option<LoadCompletion>>>,
}

impl CompletionCountdown {
    /// Wraps `completion`. With a count of zero it runs immediately.
    pub fn new(count: usize, completion: LoadCompletion) -> Self {
        let countdown = Self {
            remaining: Arc::new(AtomicUsize::new(count)),
            completion: Arc::new(Mutex::new(Some(completion))),
        };
        if count == 0 {
            countdown.fire();
        }
        countdown
    }

    /// Records one finished request.
    pub fn complete_one(&self) {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.fire();
        }
    }

    /// Requests still outstanding.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    fn fire(&self) {
        let completion = self
            .completion
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(completion) = completion {
            completion();
        }
    }
}

/// Models resolved so far, keyed by model identity.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    assets: Arc<Mutex<HashMap<Uuid, MeshAsset>>>,
}

impl AssetCache {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, MeshAsset>> {
        self.assets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores an asset.
    pub fn insert(&self, uuid: Uuid, asset: MeshAsset) {
        self.lock().insert(uuid, asset);
    }

    /// Returns `true` if a model is cached for `uuid`.
    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.lock().contains_key(uuid)
    }

    /// A copy of every cached asset.
    pub fn snapshot(&self) -> HashMap<Uuid, MeshAsset> {
        self.lock().clone()
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Requests the general model of `module` and one model per distinct identifier.
///
/// Missing models are recorded as warnings. `completion` runs exactly once,
/// after every request has resolved.
pub fn request_models(
    module: ModuleIdentifier,
    entities: &[GeometricEntity],
    provider: &dyn ModelProvider,
    cache: &AssetCache,
    errors: &ErrorLog,
    completion: LoadCompletion,
) {
    let general_tag = module
        .accepted_kinds()
        .first()
        .map(|kind| kind.type_tag())
        .unwrap_or(module.name());

    let mut requests: Vec<(&'static str, Option<Uuid>)> = vec![(general_tag, None)];
    for entity in entities.iter().filter(|e| module.accepts(e.kind())) {
        if let Some(identifier) = entity.identifier() {
            if !requests.iter().any(|(_, id)| *id == Some(identifier)) {
                requests.push((entity.type_tag(), Some(identifier)));
            }
        }
    }

    log::debug!("{module} requesting {} models", requests.len());
    let countdown = CompletionCountdown::new(requests.len(), completion);

    for (type_tag, identifier) in requests {
        let countdown = countdown.clone();
        let cache = cache.clone();
        let errors = errors.clone();
        let uuid = identifier.unwrap_or_else(|| module.general_uuid());
        provider.load_asset(
            type_tag,
            identifier,
            Box::new(move |asset| {
                match asset {
                    Some(asset) => cache.insert(uuid, asset),
                    None => errors.record(RenderModuleError::warning(
                        ErrorCategory::ModelNotFound,
                        module,
                        match identifier {
                            Some(id) => format!("no {type_tag} model for {id}"),
                            None => format!("no general {type_tag} model"),
                        },
                    )),
                }
                countdown.complete_one();
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn countdown_fires_once_after_last_completion() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let countdown = CompletionCountdown::new(
            3,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        countdown.complete_one();
        countdown.complete_one();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        countdown.complete_one();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        countdown.complete_one();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn countdown_from_many_threads_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let countdown = CompletionCountdown::new(
            32,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let countdown = countdown.clone();
                std::thread::spawn(move || countdown.complete_one())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn zero_requests_complete_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let _countdown = CompletionCountdown::new(
            0,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
