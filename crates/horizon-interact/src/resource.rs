//! Module-scoped resources for behaviors and event configurations.
//!
//! Behavior graphs and event configurations are addressed by a module name
//! plus a path inside that module, e.g. `("Interact", "ContourTool.xml")`.
//! A module is either a directory embedded at compile time with
//! `include_dir!` or a filesystem root registered at runtime.
//!
//! The process-wide [`ResourceManager::global`] instance comes with the
//! built-in [`BUILTIN_MODULE`] already registered; it embeds the default
//! tool behaviors shipped with this crate.
//!
//! ```
//! use horizon_interact::resource::{ResourceManager, BUILTIN_MODULE};
//!
//! let resources = ResourceManager::global();
//! assert!(resources.contains(BUILTIN_MODULE, "ContourTool.xml"));
//!
//! let text = resources.load_text(BUILTIN_MODULE, "ContourTool.xml").unwrap();
//! assert!(text.contains("<statemachine"));
//! ```
//!
//! Application modules can be embedded the same way:
//!
//! ```ignore
//! use include_dir::{include_dir, Dir};
//! use horizon_interact::resource::{EmbeddedDir, ResourceManager};
//!
//! static SEGMENTATION: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/interactions");
//!
//! ResourceManager::global().register_embedded("Segmentation", EmbeddedDir::new(&SEGMENTATION));
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use horizon_interact_core::logging::targets;
use include_dir::{Dir, DirEntry, include_dir};
use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Name of the module holding the behaviors and configurations shipped with this crate.
pub const BUILTIN_MODULE: &str = "Interact";

static BUILTIN_RESOURCES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/resources");

static GLOBAL_MANAGER: OnceLock<ResourceManager> = OnceLock::new();

/// A wrapper around a directory embedded with `include_dir!`.
#[derive(Clone, Copy)]
pub struct EmbeddedDir {
    dir: &'static Dir<'static>,
}

impl EmbeddedDir {
    /// Wrap an embedded directory.
    pub const fn new(dir: &'static Dir<'static>) -> Self {
        Self { dir }
    }

    /// Get a file's contents as UTF-8 text.
    ///
    /// Returns `None` if the file doesn't exist or isn't valid UTF-8.
    pub fn get_text(&self, path: &str) -> Option<&'static str> {
        self.dir.get_file(path).and_then(|f| f.contents_utf8())
    }

    /// Check whether a file exists.
    pub fn contains(&self, path: &str) -> bool {
        self.dir.get_file(path).is_some()
    }

    /// All file paths in the directory, recursively.
    pub fn list_files(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        collect_files(self.dir, &mut paths);
        paths
    }
}

fn collect_files(dir: &'static Dir<'static>, paths: &mut Vec<&'static str>) {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(subdir) => collect_files(subdir, paths),
            DirEntry::File(file) => {
                if let Some(path) = file.path().to_str() {
                    paths.push(path);
                }
            }
        }
    }
}

impl std::fmt::Debug for EmbeddedDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedDir")
            .field("file_count", &self.list_files().len())
            .finish()
    }
}

/// Resolves `(module, path)` pairs to resource text.
///
/// Embedded modules are consulted first; a filesystem root registered under the
/// same module name serves as fallback.
pub struct ResourceManager {
    embedded: RwLock<HashMap<String, EmbeddedDir>>,
    filesystem_roots: RwLock<HashMap<String, PathBuf>>,
}

impl ResourceManager {
    /// Create an empty resource manager (without the built-in module).
    pub fn new() -> Self {
        Self {
            embedded: RwLock::new(HashMap::new()),
            filesystem_roots: RwLock::new(HashMap::new()),
        }
    }

    /// Create a resource manager with the built-in module registered.
    pub fn with_builtin() -> Self {
        let manager = Self::new();
        manager.register_embedded(BUILTIN_MODULE, EmbeddedDir::new(&BUILTIN_RESOURCES));
        manager
    }

    /// The process-wide resource manager.
    pub fn global() -> &'static ResourceManager {
        GLOBAL_MANAGER.get_or_init(ResourceManager::with_builtin)
    }

    /// Register an embedded directory as a module.
    pub fn register_embedded(&self, module: &str, dir: EmbeddedDir) {
        tracing::debug!(target: targets::RESOURCE, module, "registered embedded module");
        self.embedded.write().insert(module.to_string(), dir);
    }

    /// Unregister an embedded module.
    pub fn unregister_embedded(&self, module: &str) -> bool {
        self.embedded.write().remove(module).is_some()
    }

    /// Register a filesystem directory as a module.
    pub fn register_filesystem_root(&self, module: &str, root: impl Into<PathBuf>) {
        let root = root.into();
        tracing::debug!(target: targets::RESOURCE, module, root = %root.display(), "registered filesystem module");
        self.filesystem_roots.write().insert(module.to_string(), root);
    }

    /// Unregister a filesystem module.
    pub fn unregister_filesystem_root(&self, module: &str) -> bool {
        self.filesystem_roots.write().remove(module).is_some()
    }

    /// Check whether a resource exists.
    pub fn contains(&self, module: &str, path: &str) -> bool {
        if self
            .embedded
            .read()
            .get(module)
            .is_some_and(|dir| dir.contains(path))
        {
            return true;
        }
        self.filesystem_roots
            .read()
            .get(module)
            .is_some_and(|root| root.join(path).is_file())
    }

    /// Load a resource as text.
    ///
    /// Returns [`Error::ResourceNotFound`] if neither an embedded module nor a
    /// filesystem root provides the file.
    pub fn load_text(&self, module: &str, path: &str) -> Result<Cow<'static, str>> {
        if let Some(dir) = self.embedded.read().get(module) {
            if let Some(text) = dir.get_text(path) {
                tracing::trace!(target: targets::RESOURCE, module, path, "resolved embedded resource");
                return Ok(Cow::Borrowed(text));
            }
        }

        let root = self.filesystem_roots.read().get(module).cloned();
        if let Some(root) = root {
            let full_path = root.join(path);
            return match std::fs::read_to_string(&full_path) {
                Ok(text) => {
                    tracing::trace!(target: targets::RESOURCE, module, path, "resolved filesystem resource");
                    Ok(Cow::Owned(text))
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(Error::resource_not_found(module, path))
                }
                Err(e) => Err(Error::io(full_path, e)),
            };
        }

        Err(Error::resource_not_found(module, path))
    }

    /// List every embedded file path of a module.
    pub fn list(&self, module: &str) -> Vec<&'static str> {
        self.embedded
            .read()
            .get(module)
            .map(|dir| dir.list_files())
            .unwrap_or_default()
    }

    /// All registered module names, sorted.
    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .embedded
            .read()
            .keys()
            .chain(self.filesystem_roots.read().keys())
            .cloned()
            .collect();
        modules.sort();
        modules.dedup();
        modules
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("modules", &self.modules())
            .finish()
    }
}
