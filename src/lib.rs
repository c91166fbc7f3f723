//! myglot - top-like monitor for MySQL performance_schema counters.
//!
//! This library provides the pieces behind the `myglot` binary:
//! - `collector` - row sources (MySQL, mock), server variables, instrument setup
//! - `model` - per-view counter rows
//! - `normalize` - file path to logical object name mapping
//! - `delta` - baseline/latest snapshots and relative results
//! - `view` - the selectable metric screens
//! - `tui` - scheduler, input handling and render surfaces

pub mod collector;
pub mod config;
pub mod delta;
pub mod fmt;
pub mod model;
pub mod normalize;
pub mod tui;
pub mod view;

/// Crate version, shown in the title bar and `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
