// src/core/mod.rs

// The `core` module holds the scanning engine. Nothing in here touches the
// command line or the global subscriber; the binary wires those in.

/// Validated per-scan settings and their defaults.
pub mod config;

/// Configuration and per-source I/O error types.
pub mod error;

/// Typed scan events and the sink they are reported through.
pub mod events;

/// Static signature tables used by the built-in plugins.
pub mod knowledge_base;

/// Targets, fetch outcomes and result lines.
pub mod models;

pub mod pipeline;

/// Test and analysis plugins, plus the registry that orders them.
pub mod plugins;

/// The scan coordinator, its workers, the fetcher and the result writer.
pub mod scanner;

#[cfg(test)]
pub(crate) mod test_utils;
