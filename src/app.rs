//! Globe viewer controller.
//!
//! **Architecture**: `GlobeApp` is the single owner of viewer state, texture
//! assets and the frame sequencer. The sequencer's callbacks only publish
//! `FrameEvent`/`PlaybackCompleteEvent` on the event bus; `update()` drains
//! the bus and applies them, so no callback ever borrows the controller.
//!
//! # Update loop
//!
//! ```text
//! refresh loop ──now──▶ update(now) ──▶ sequencer.refresh(now) ──▶ callbacks emit
//!                               └──────▶ process_events() ──▶ ViewerState + TextureSink
//! ```
//!
//! # Navigation vs playback
//!
//! Stepping, spectrum switches and predictions stop a running animation
//! silently: no completion event, controls re-enabled at the call site.

use crate::core::player_events::{
    FrameEvent, PlaybackCompleteEvent, PlaybackStoppedEvent, TextureAppliedEvent,
    YearChangedEvent,
};
use crate::core::{
    EventBus, FrameDuration, FrameSequencer, PlaybackRange, TickOutcome, TickQueue,
    downcast_event,
};
use crate::server::{ApiCommand, ViewerSnapshot};
use crate::viewer::{
    PreloadReport, SpectrumCatalog, TextureCatalog, TextureRef, TextureSink, ViewerError,
    ViewerState,
};
use log::{debug, info};
use std::collections::HashSet;

pub struct GlobeApp {
    state: ViewerState,
    textures: TextureCatalog,
    preloaded: HashSet<String>,
    sequencer: FrameSequencer,
    event_bus: EventBus,
    sink: Box<dyn TextureSink>,
    current_texture: Option<TextureRef>,
}

impl GlobeApp {
    pub fn new(
        catalog: SpectrumCatalog,
        textures: TextureCatalog,
        frame_duration: FrameDuration,
        sink: Box<dyn TextureSink>,
    ) -> Self {
        Self {
            state: ViewerState::new(catalog),
            textures,
            preloaded: HashSet::new(),
            sequencer: FrameSequencer::new(TickQueue::new(), frame_duration),
            event_bus: EventBus::new(),
            sink,
            current_texture: None,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn current_texture(&self) -> Option<&TextureRef> {
        self.current_texture.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_running()
    }

    /// Preload the selected spectrum, unlock controls and show its texture.
    pub fn load_assets(&mut self) -> PreloadReport {
        let report = self.preload_current();
        self.state.set_assets_ready(true);
        self.apply_current_texture();
        report
    }

    fn preload_current(&mut self) -> PreloadReport {
        let spectrum = self.state.spectrum().clone();
        let report = self.textures.preload(&spectrum);
        self.preloaded.insert(spectrum.name);
        report
    }

    /// Play the From/To selection. An inverted selection is rejected untouched.
    pub fn play(&mut self) -> Result<(), ViewerError> {
        let (start, end) = self.state.range_selection();
        let range = PlaybackRange::new(start, end)?;

        let frames = self.event_bus.emitter();
        let done = self.event_bus.emitter();
        self.state.set_animating(true);
        info!("Playing {} {}..={}", self.state.spectrum_name(), start, end);
        self.sequencer.start_range(
            range,
            move |year| frames.emit(FrameEvent { year }),
            move || done.emit(PlaybackCompleteEvent),
        );
        // Start frame was emitted synchronously
        self.process_events();
        Ok(())
    }

    /// Set the From/To selection, then play it.
    pub fn play_range(&mut self, start: i32, end: i32) -> Result<(), ViewerError> {
        self.state.set_range_selection(start, end)?;
        self.play()
    }

    /// Cancel playback without completion. No-op when idle.
    pub fn stop(&mut self) {
        if self.sequencer.is_running() {
            self.sequencer.stop();
            self.state.set_animating(false);
            self.event_bus.emit(PlaybackStoppedEvent);
            debug!("Playback stopped at {}", self.state.year());
        }
    }

    /// One refresh: fire due ticks at `now` (ms) and apply resulting events.
    pub fn update(&mut self, now: f64) -> TickOutcome {
        let outcome = self.sequencer.refresh(now);
        self.process_events();
        outcome
    }

    fn process_events(&mut self) {
        for event in self.event_bus.poll() {
            if let Some(frame) = downcast_event::<FrameEvent>(&event) {
                if self.state.set_playback_year(frame.year) {
                    self.apply_current_texture();
                }
            } else if downcast_event::<PlaybackCompleteEvent>(&event).is_some() {
                self.state.set_animating(false);
                info!("Playback finished at {}", self.state.year());
            }
        }
    }

    pub fn prev_year(&mut self) {
        self.stop();
        if self.state.prev_year() {
            self.apply_current_texture();
        }
    }

    pub fn next_year(&mut self) {
        self.stop();
        if self.state.next_year() {
            self.apply_current_texture();
        }
    }

    pub fn set_range_selection(&mut self, start: i32, end: i32) -> Result<(), ViewerError> {
        self.state.set_range_selection(start, end)
    }

    pub fn select_spectrum(&mut self, name: &str) -> Result<(), ViewerError> {
        if self.state.catalog().get(name).is_none() {
            return Err(ViewerError::UnknownSpectrum(name.to_string()));
        }
        self.stop();
        self.state.select_spectrum(name)?;
        if !self.preloaded.contains(name) {
            self.preload_current();
        }
        self.apply_current_texture();
        Ok(())
    }

    /// Show the externally generated prediction image labelled with `year`.
    pub fn show_prediction(&mut self, year: i32) -> Result<(), ViewerError> {
        self.state.show_prediction(year)?;
        self.stop();
        info!("Displaying prediction for year {}", year);
        self.apply_current_texture();
        Ok(())
    }

    fn apply_current_texture(&mut self) {
        let spectrum = self.state.spectrum_name().to_string();
        let year = self.state.year();
        self.event_bus.emit(YearChangedEvent {
            spectrum: spectrum.clone(),
            year,
        });

        let texture = if self.state.is_prediction() {
            self.textures.prediction()
        } else {
            self.textures.lookup(&spectrum, year)
        };
        // Missing texture keeps whatever the globe shows now
        let Some(texture) = texture else {
            return;
        };
        self.sink.apply(&texture);
        self.event_bus.emit(TextureAppliedEvent {
            path: texture.path.clone(),
            fallback: texture.fallback,
        });
        self.current_texture = Some(texture);
    }

    /// Execute a remote-control command from the API server.
    pub fn handle_command(&mut self, command: ApiCommand) -> Result<(), ViewerError> {
        debug!("API command: {:?}", command);
        match command {
            ApiCommand::Play { range: Some((start, end)) } => self.play_range(start, end),
            ApiCommand::Play { range: None } => self.play(),
            ApiCommand::Stop => {
                self.stop();
                Ok(())
            }
            ApiCommand::PrevYear => {
                self.prev_year();
                Ok(())
            }
            ApiCommand::NextYear => {
                self.next_year();
                Ok(())
            }
            ApiCommand::SelectSpectrum(name) => self.select_spectrum(&name),
            ApiCommand::Predict(year) => self.show_prediction(year),
        }
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let (range_start, range_end) = self.state.range_selection();
        ViewerSnapshot {
            spectrum: self.state.spectrum_name().to_string(),
            year: self.state.year(),
            year_label: self.state.year_label(),
            playing: self.is_playing(),
            prediction: self.state.is_prediction(),
            range_start,
            range_end,
            controls: self.state.controls(),
            texture: self.current_texture.as_ref().map(|t| t.path.display().to_string()),
            spectra: self.state.catalog().names().map(str::to_string).collect(),
        }
    }
}
