//! Sharing loaded behaviors between state machines.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use horizon_interact_core::PerfSpan;
use horizon_interact_core::logging::{span_names, targets};
use parking_lot::RwLock;

use super::Behavior;
use crate::error::Result;
use crate::resource::ResourceManager;

static GLOBAL_CACHE: OnceLock<BehaviorCache> = OnceLock::new();

/// Loaded behaviors keyed by `(module, file)`.
///
/// Every state machine of a tool shares the same `Arc<Behavior>`. Only
/// successfully parsed behaviors are cached. Keys do not include the resource
/// manager, so one cache should be used with one set of modules.
#[derive(Default)]
pub struct BehaviorCache {
    entries: RwLock<HashMap<(String, String), Arc<Behavior>>>,
}

impl BehaviorCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static BehaviorCache {
        GLOBAL_CACHE.get_or_init(BehaviorCache::new)
    }

    /// Return the cached behavior or load and cache it.
    pub fn get_or_load(
        &self,
        resources: &ResourceManager,
        file: &str,
        module: &str,
    ) -> Result<Arc<Behavior>> {
        if let Some(behavior) = self.get(file, module) {
            tracing::trace!(target: targets::BEHAVIOR, module, file, "behavior cache hit");
            return Ok(behavior);
        }

        let _span = PerfSpan::for_resource(span_names::LOAD_BEHAVIOR, module, file);
        let text = resources.load_text(module, file)?;
        let behavior = Arc::new(Behavior::from_xml_str(file, &text)?);

        let mut entries = self.entries.write();
        // Another caller may have loaded the same resource meanwhile.
        let shared = entries
            .entry((module.to_string(), file.to_string()))
            .or_insert(behavior)
            .clone();
        Ok(shared)
    }

    /// The cached behavior, if any.
    pub fn get(&self, file: &str, module: &str) -> Option<Arc<Behavior>> {
        self.entries
            .read()
            .get(&(module.to_string(), file.to_string()))
            .cloned()
    }

    /// Forget one behavior, so the next load reads the resource again.
    pub fn invalidate(&self, file: &str, module: &str) -> bool {
        self.entries
            .write()
            .remove(&(module.to_string(), file.to_string()))
            .is_some()
    }

    /// Forget every behavior.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached behaviors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for BehaviorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorCache")
            .field("len", &self.len())
            .finish()
    }
}
