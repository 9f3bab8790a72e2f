//! TERRAPLAY - satellite globe year player library
//!
//! Re-exports all modules for use by the binary target.

// Playback engine (sequencer, ticks, events)
pub mod core;

// Viewer state and texture assets
pub mod viewer;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod server;

// Re-export commonly used types
pub use app::GlobeApp;
pub use crate::core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use crate::core::sequencer::{FrameDuration, FrameSequencer, PlaybackRange, SequencerError};
pub use viewer::{SpectrumCatalog, TextureCatalog, ViewerError, ViewerState};
