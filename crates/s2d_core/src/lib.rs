//! Smart2D Core - backend logic for the Smart2D rigging tools
//!
//! This crate contains all business logic with zero UI dependencies.
//! The host application (a scene editor) plugs in through the traits in
//! [`scene`]; everything else is plain Rust:
//!
//! - [`orchestrator`] runs AI tween jobs (export, interpolate, decode, publish)
//! - [`rig`] synthesizes smart bone action constraints
//! - [`strokes`] performs classic eased stroke tweening

pub mod config;
pub mod decode;
pub mod export;
pub mod interpolate;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod publish;
pub mod rig;
pub mod scene;
pub mod strokes;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
