//! Update checking layer
//!
//! This module decides whether a registry check is due, fetches the latest
//! published version and compares it against the installed one.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Checker   │────▶│    Gate     │────▶│    Cache    │
//! │(orchestrate)│     │ (interval)  │     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ├───────────────────────────┐
//!        ▼                           ▼
//! ┌─────────────┐             ┌─────────────┐
//! │  Registry   │             │   Compare   │
//! │   (fetch)   │             │(version cmp)│
//! └─────────────┘             └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Cache record storage (temp-dir JSON files or in-memory)
//! - [`checker`]: Orchestrates gate, fetch and comparison
//! - [`clock`]: Injectable wall clock
//! - [`compare`]: Numeric-aware version comparison
//! - [`error`]: Error types for cache, registry and check operations
//! - [`gate`]: Interval gating on top of the cache
//! - [`registry`]: Registry trait for fetching the latest version
//! - [`registries`]: Concrete registry implementations (npm)

pub mod cache;
pub mod checker;
pub mod clock;
pub mod compare;
pub mod error;
pub mod gate;
pub mod registries;
pub mod registry;
