// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling rule patterns (globs and extension lists).
//! - Deciding which directories are ignored at registration time.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about rules or commands; it only turns filesystem
//! changes into `RuntimeEvent`s.

pub mod ignore;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use ignore::IgnoreFilter;
pub use patterns::{matches, Pattern, PatternSet};
pub use watcher::{collect_watch_dirs, spawn_watcher, WatcherHandle, WatcherState};
