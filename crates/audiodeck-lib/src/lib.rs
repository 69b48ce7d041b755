//! audiodeck-lib — Page controller engine.
//!
//! Resource fetching, panel rendering, archive export, HTML output, the HTTP
//! surface, native playback, and pair preparation.
//! Depends on audiodeck-core for pure types.

pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod html;
pub mod player;
pub mod prepare;
pub mod render;
pub mod server;

// Re-export audiodeck-core for convenience
pub use audiodeck_core;
