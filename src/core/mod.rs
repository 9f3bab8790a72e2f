//! Playback engine - sequencer, tick scheduling, events
//!
//! These modules are independent of the viewer and of any rendering backend.

pub mod event_bus;
pub mod player_events;
pub mod sequencer;
pub mod ticker;

pub use event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use sequencer::{
    FrameDuration, FrameSequencer, PlaybackRange, PlaybackState, SequencerError, TickOutcome,
};
pub use ticker::{RefreshClock, TickHandle, TickQueue, TickSource};
