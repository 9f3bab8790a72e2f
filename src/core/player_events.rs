//! Playback and navigation events published on the [`EventBus`](super::EventBus).

use std::path::PathBuf;

/// Sequencer emitted a year
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameEvent {
    pub year: i32,
}

/// Sequencer walked past the end year
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackCompleteEvent;

/// Playback cancelled by user action (no completion)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackStoppedEvent;

/// Displayed year changed (playback, stepping or spectrum switch)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YearChangedEvent {
    pub spectrum: String,
    pub year: i32,
}

/// A texture was handed to the globe
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureAppliedEvent {
    pub path: PathBuf,
    pub fallback: bool,
}
