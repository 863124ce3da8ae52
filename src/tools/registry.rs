//! Tool registry: immutable catalog snapshots behind an atomic swap.
//!
//! Readers load the current `Arc<RegistrySnapshot>` without locking and keep
//! it for the duration of their call. A rebuild constructs a fresh snapshot
//! off to the side and publishes it with a single pointer swap, so a reader
//! sees either the whole old catalog or the whole new one.

use crate::tools::builtins::builtin_descriptors;
use crate::tools::descriptor::{PluginManifest, ToolDescriptor};
use crate::types::Result;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable name → descriptor mapping. Keys are lower-cased names.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    entries: HashMap<String, ToolDescriptor>,
}

impl RegistrySnapshot {
    /// Build a snapshot from plugin manifests plus the given built-ins.
    ///
    /// Manifests sharing a key collapse to the last one. Names differing only
    /// by case are one entry, decided by list position: the later manifest
    /// wins. Built-ins are inserted after plugins and win.
    pub fn build(manifests: &[PluginManifest], builtins: Vec<ToolDescriptor>) -> Self {
        let mut last_by_key: HashMap<&str, usize> = HashMap::with_capacity(manifests.len());
        for (index, manifest) in manifests.iter().enumerate() {
            last_by_key.insert(manifest.key.as_str(), index);
        }

        let mut entries = HashMap::with_capacity(last_by_key.len() + builtins.len());
        let plugin_descriptors = manifests
            .iter()
            .enumerate()
            .filter(|(index, manifest)| last_by_key.get(manifest.key.as_str()) == Some(index))
            .map(|(_, manifest)| manifest.to_descriptor());
        for descriptor in plugin_descriptors.chain(builtins) {
            entries.insert(descriptor.name.to_lowercase(), descriptor);
        }

        Self { entries }
    }

    /// Snapshot containing only the built-in catalog.
    pub fn builtins_only() -> Self {
        Self::build(&[], builtin_descriptors())
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.entries.get(&name.to_lowercase())
    }

    /// All descriptors, sorted by name.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        let mut entries: Vec<&ToolDescriptor> = self.entries.values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Descriptors whose type matches one of `types` (case-insensitive).
    /// An empty filter returns everything.
    pub fn filter(&self, types: &[String]) -> Vec<&ToolDescriptor> {
        if types.is_empty() {
            return self.descriptors();
        }
        self.descriptors()
            .into_iter()
            .filter(|d| types.iter().any(|t| t.eq_ignore_ascii_case(&d.tool_type)))
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Manifest source
// =============================================================================

/// Supplies the externally registered plugin manifests for a resync.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn manifests(&self) -> Result<Vec<PluginManifest>>;
}

/// In-memory manifest source.
#[derive(Debug, Clone, Default)]
pub struct StaticManifests(pub Vec<PluginManifest>);

#[async_trait]
impl ManifestSource for StaticManifests {
    async fn manifests(&self) -> Result<Vec<PluginManifest>> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Hot-swappable tool registry shared by all invocations.
pub struct ToolRegistry {
    current: ArcSwap<RegistrySnapshot>,
}

impl ToolRegistry {
    pub fn new(initial: RegistrySnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Registry holding only the built-in catalog.
    pub fn with_builtins() -> Self {
        Self::new(RegistrySnapshot::builtins_only())
    }

    /// The snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Replace the visible snapshot in one atomic swap.
    pub fn publish(&self, snapshot: RegistrySnapshot) {
        let count = snapshot.len();
        let previous = self.current.swap(Arc::new(snapshot));
        tracing::info!(
            tools = count,
            previous_tools = previous.len(),
            "Published tool registry snapshot"
        );
    }

    /// Case-insensitive lookup against the current snapshot.
    pub fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        self.current.load().lookup(name).cloned()
    }

    /// Type-filtered view of the current snapshot.
    pub fn filter(&self, types: &[String]) -> Vec<ToolDescriptor> {
        self.current
            .load()
            .filter(types)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Pull fresh manifests, rebuild, publish. Returns the new tool count.
    pub async fn resync(&self, source: &dyn ManifestSource) -> Result<usize> {
        let manifests = source.manifests().await?;
        tracing::debug!(manifests = manifests.len(), "Rebuilding tool registry");
        let snapshot = RegistrySnapshot::build(&manifests, builtin_descriptors());
        let count = snapshot.len();
        self.publish(snapshot);
        Ok(count)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.current.load().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
