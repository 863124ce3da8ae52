//! Tool infrastructure: descriptors, built-in tools and the registry.
//!
//! The registry owns tool *metadata*. Built-in behaviour lives in the
//! dispatcher; every other tool resolves to an automation engine plugin.

pub mod builtins;
pub mod descriptor;
pub mod registry;

pub use builtins::{builtin_descriptors, BuiltinTool, BUILTINS};
pub use descriptor::{PluginManifest, ToolDescriptor, BUILTIN_TOOL_TYPE};
pub use registry::{ManifestSource, RegistrySnapshot, StaticManifests, ToolRegistry};
