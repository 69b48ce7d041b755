//! audiodeck-core — Pure types for the audiodeck page controller.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod page;
pub mod playback;
pub mod progress;
pub mod text_prep;
pub mod types;
pub mod wav;
