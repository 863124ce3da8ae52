//! # Rulebridge - Tool-Invocation Bridge
//!
//! Exposes a catalog of remote-callable tools to an agent or API client and
//! translates JSON tool calls into rules for a browser-automation engine:
//! - Tool registry published as atomically swapped immutable snapshots
//! - Argument codec turning JSON parameters into templated rule arguments
//! - Dispatcher routing built-in tools and generic rule execution
//! - Session store tracking engine-issued driver sessions
//! - DOM retrieval and LLM-assisted locator resolution
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────────────────────────────┐
//!  {name, arguments} → │             Dispatcher               │
//!                      │  ┌──────────┐  ┌──────────────────┐  │
//!                      │  │ Registry │  │  Argument codec  │  │
//!                      │  │ snapshot │  │ → RuleModel      │  │
//!                      │  └──────────┘  └──────────────────┘  │
//!                      │  built-ins: find_tool, get_tools,    │
//!                      │  get_instructions, get_application_  │
//!                      │  dom, resolve_locator, start_session │
//!                      │  default:   start_rule ──────────────┼──→ automation engine
//!                      │  ┌──────────────┐                    │
//!                      │  │ SessionStore │ ← engine sessions  │
//!                      │  └──────────────┘                    │
//!                      └──────────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod dispatch;
pub mod dom;
pub mod engine;
pub mod locator;
pub mod policy;
pub mod rules;
pub mod session;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use dispatch::{Dispatcher, InvocationRequest};
pub use types::{Config, Error, Result};
