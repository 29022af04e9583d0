//! Logging facilities for Horizon Interact.
//!
//! Horizon Interact uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the application installs a subscriber:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_interact::state_machine=debug")
//!         .init();
//! }
//! ```
//!
//! Every subsystem logs under one of the [`targets`], so interaction
//! diagnostics can be enabled for a single layer (for example only the
//! dispatcher) without drowning in per-event traces from the others.

/// Span names used throughout Horizon Interact for tracing.
pub mod span_names {
    /// Behavior graph loading.
    pub const LOAD_BEHAVIOR: &str = "horizon_interact::load_behavior";
    /// Event configuration loading.
    pub const LOAD_CONFIG: &str = "horizon_interact::load_config";
}

/// Target names for log filtering.
pub mod targets {
    /// Core data holders.
    pub const CORE: &str = "horizon_interact_core";
    /// Data nodes and storage.
    pub const NODE: &str = "horizon_interact_core::node";
    /// Signal/slot notifications.
    pub const SIGNAL: &str = "horizon_interact_core::signal";
    /// Resource lookup.
    pub const RESOURCE: &str = "horizon_interact::resource";
    /// Event configuration parsing and variant mapping.
    pub const CONFIG: &str = "horizon_interact::config";
    /// Behavior graph loading.
    pub const BEHAVIOR: &str = "horizon_interact::behavior";
    /// Event state machine dispatch.
    pub const STATE_MACHINE: &str = "horizon_interact::state_machine";
    /// Multi-interactor dispatch.
    pub const DISPATCHER: &str = "horizon_interact::dispatcher";
    /// Performance spans.
    pub const PERF: &str = "horizon_interact::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time resource loading.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }

    /// Create a span that also records the resource being loaded.
    pub fn for_resource(name: &'static str, module: &str, path: &str) -> Self {
        let span = tracing::info_span!(
            target: targets::PERF,
            "perf",
            operation = name,
            module,
            path
        );
        Self {
            span: span.entered(),
        }
    }
}
