//! Configuration module for catalog crawling
//!
//! This module provides the `Settings` struct, its type-safe builder and the
//! settings file loader.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod loader;
pub mod types;

// Re-exports for public API
pub use builder::{SettingsBuilder, WithDataPath};
pub use loader::{PathContext, load_settings, resolve_settings_path, validate_settings};
pub use types::{PathKind, Settings};
