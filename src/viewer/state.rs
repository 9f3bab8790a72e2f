//! Viewer UI state: selected spectrum, displayed year, range selection, controls.
//!
//! **Used by**: `GlobeApp` (single owner). Playback writes the displayed year
//! through [`ViewerState::set_playback_year`]; everything else is user input.

use super::ViewerError;
use super::spectrum::{Spectrum, SpectrumCatalog};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Years accepted by the prediction input
pub const PREDICTION_YEARS: RangeInclusive<i32> = 2025..=3000;

/// Viewport width breakpoints (px) and the globe radius for each class
const MOBILE_BREAKPOINT: u32 = 480;
const TABLET_BREAKPOINT: u32 = 1024;
const MOBILE_RADIUS: f32 = 1.4;
const TABLET_RADIUS: f32 = 1.8;
const DESKTOP_RADIUS: f32 = 2.0;

/// Enabled state of the navigation controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub prev: bool,
    pub next: bool,
    pub play: bool,
    pub range_select: bool,
}

#[derive(Debug, Clone)]
pub struct ViewerState {
    catalog: SpectrumCatalog,
    spectrum: String,
    year: i32,
    /// Last displayed year per spectrum, restored on switch
    remembered: HashMap<String, i32>,
    range_start: i32,
    range_end: i32,
    animating: bool,
    prediction: bool,
    assets_ready: bool,
}

impl ViewerState {
    /// Start on the first spectrum of the catalog at its first year.
    pub fn new(catalog: SpectrumCatalog) -> Self {
        let first = catalog.first().clone();
        Self {
            catalog,
            spectrum: first.name.clone(),
            year: first.min_year,
            remembered: HashMap::new(),
            range_start: first.min_year,
            range_end: first.max_year,
            animating: false,
            prediction: false,
            assets_ready: false,
        }
    }

    pub fn catalog(&self) -> &SpectrumCatalog {
        &self.catalog
    }

    pub fn spectrum(&self) -> &Spectrum {
        self.catalog
            .get(&self.spectrum)
            .unwrap_or_else(|| self.catalog.first())
    }

    pub fn spectrum_name(&self) -> &str {
        &self.spectrum
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_prediction(&self) -> bool {
        self.prediction
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
    }

    pub fn assets_ready(&self) -> bool {
        self.assets_ready
    }

    pub fn set_assets_ready(&mut self, ready: bool) {
        self.assets_ready = ready;
    }

    /// Options offered by the From/To selectors
    pub fn year_options(&self) -> RangeInclusive<i32> {
        self.spectrum().years()
    }

    /// Current From/To selection (may be inverted; play rejects that)
    pub fn range_selection(&self) -> (i32, i32) {
        (self.range_start, self.range_end)
    }

    pub fn set_range_selection(&mut self, start: i32, end: i32) -> Result<(), ViewerError> {
        let spectrum = self.spectrum();
        for year in [start, end] {
            if !spectrum.contains(year) {
                return Err(ViewerError::YearOutOfRange {
                    spectrum: spectrum.name.clone(),
                    year,
                    min: spectrum.min_year,
                    max: spectrum.max_year,
                });
            }
        }
        self.range_start = start;
        self.range_end = end;
        Ok(())
    }

    /// Step back one year. Returns true if the displayed year changed.
    pub fn prev_year(&mut self) -> bool {
        if self.leave_prediction() {
            return true;
        }
        if self.year > self.spectrum().min_year {
            self.year -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one year. Returns true if the displayed year changed.
    pub fn next_year(&mut self) -> bool {
        if self.leave_prediction() {
            return true;
        }
        if self.year < self.spectrum().max_year {
            self.year += 1;
            true
        } else {
            false
        }
    }

    /// Prediction years lie outside the spectrum; stepping returns to its nearest year.
    fn leave_prediction(&mut self) -> bool {
        if !self.prediction {
            return false;
        }
        self.prediction = false;
        self.year = self.spectrum().clamp(self.year);
        true
    }

    /// Switch spectrum, restoring the year last shown for it.
    pub fn select_spectrum(&mut self, name: &str) -> Result<(), ViewerError> {
        let Some(next) = self.catalog.get(name).cloned() else {
            return Err(ViewerError::UnknownSpectrum(name.to_string()));
        };

        if !self.prediction {
            self.remembered.insert(self.spectrum.clone(), self.year);
        }
        self.prediction = false;
        self.year = self
            .remembered
            .get(&next.name)
            .copied()
            .map(|y| next.clamp(y))
            .unwrap_or(next.min_year);
        self.range_start = next.min_year;
        self.range_end = next.max_year;
        debug!("Spectrum {} -> {} at year {}", self.spectrum, next.name, self.year);
        self.spectrum = next.name;
        Ok(())
    }

    /// Apply a year emitted by playback. Returns true if it differs from the shown one.
    pub fn set_playback_year(&mut self, year: i32) -> bool {
        let year = self.spectrum().clamp(year);
        let changed = self.prediction || self.year != year;
        self.prediction = false;
        self.year = year;
        changed
    }

    /// Show the predicted texture for `year`.
    pub fn show_prediction(&mut self, year: i32) -> Result<(), ViewerError> {
        if !PREDICTION_YEARS.contains(&year) {
            return Err(ViewerError::InvalidPredictionYear(year));
        }
        if !self.prediction {
            self.remembered.insert(self.spectrum.clone(), self.year);
        }
        self.year = year;
        self.prediction = true;
        Ok(())
    }

    pub fn controls(&self) -> Controls {
        if self.animating || !self.assets_ready {
            return Controls {
                prev: false,
                next: false,
                play: false,
                range_select: self.assets_ready,
            };
        }
        let spectrum = self.spectrum();
        Controls {
            prev: self.prediction || self.year > spectrum.min_year,
            next: self.prediction || self.year < spectrum.max_year,
            play: true,
            range_select: true,
        }
    }

    /// Text for the year display
    pub fn year_label(&self) -> String {
        if !self.assets_ready {
            "...".to_string()
        } else if self.prediction {
            format!("{} (Prediction)", self.year)
        } else {
            self.year.to_string()
        }
    }
}

/// Globe radius for a viewport width in pixels
pub fn sphere_radius(viewport_width: u32) -> f32 {
    if viewport_width <= MOBILE_BREAKPOINT {
        MOBILE_RADIUS
    } else if viewport_width <= TABLET_BREAKPOINT {
        TABLET_RADIUS
    } else {
        DESKTOP_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_state() -> ViewerState {
        let mut state = ViewerState::new(SpectrumCatalog::default());
        state.set_assets_ready(true);
        state
    }

    #[test]
    fn test_initial_state() {
        let state = ViewerState::new(SpectrumCatalog::default());
        assert_eq!(state.spectrum_name(), "modis");
        assert_eq!(state.year(), 2000);
        assert_eq!(state.range_selection(), (2000, 2025));
        assert_eq!(state.year_label(), "...");
        assert!(!state.controls().play);
    }

    #[test]
    fn test_stepping_respects_bounds() {
        let mut state = ready_state();
        assert!(!state.prev_year());
        assert_eq!(state.year(), 2000);
        assert!(!state.controls().prev);
        assert!(state.controls().next);

        for _ in 0..30 {
            state.next_year();
        }
        assert_eq!(state.year(), 2025);
        assert!(!state.next_year());
        assert!(!state.controls().next);
        assert!(state.controls().prev);
    }

    #[test]
    fn test_spectrum_switch_remembers_year() {
        let mut state = ready_state();
        state.next_year();
        state.next_year();
        assert_eq!(state.year(), 2002);

        state.select_spectrum("ceres").unwrap();
        assert_eq!(state.year(), 2025);
        assert_eq!(state.year_options(), 2025..=2025);
        let controls = state.controls();
        assert!(!controls.prev && !controls.next);

        state.select_spectrum("modis").unwrap();
        assert_eq!(state.year(), 2002);
        assert_eq!(state.range_selection(), (2000, 2025));

        assert_eq!(
            state.select_spectrum("landsat"),
            Err(ViewerError::UnknownSpectrum("landsat".into()))
        );
        assert_eq!(state.spectrum_name(), "modis");
    }

    #[test]
    fn test_range_selection_validation() {
        let mut state = ready_state();
        state.set_range_selection(2010, 2005).unwrap();
        assert_eq!(state.range_selection(), (2010, 2005));
        assert!(matches!(
            state.set_range_selection(1999, 2005),
            Err(ViewerError::YearOutOfRange { year: 1999, .. })
        ));
        // Rejected selection leaves the previous one
        assert_eq!(state.range_selection(), (2010, 2005));
    }

    #[test]
    fn test_prediction() {
        let mut state = ready_state();
        assert_eq!(state.show_prediction(2024), Err(ViewerError::InvalidPredictionYear(2024)));
        assert_eq!(state.show_prediction(3001), Err(ViewerError::InvalidPredictionYear(3001)));

        state.show_prediction(2100).unwrap();
        assert_eq!(state.year_label(), "2100 (Prediction)");
        assert!(state.is_prediction());

        // Stepping leaves the prediction at the nearest spectrum year
        assert!(state.prev_year());
        assert!(!state.is_prediction());
        assert_eq!(state.year(), 2025);
        assert_eq!(state.year_label(), "2025");
    }

    #[test]
    fn test_playback_year_change_detection() {
        let mut state = ready_state();
        assert!(!state.set_playback_year(2000));
        assert!(state.set_playback_year(2001));
        state.show_prediction(2500).unwrap();
        assert!(state.set_playback_year(2001));
        assert!(!state.is_prediction());
    }

    #[test]
    fn test_controls_locked_while_animating() {
        let mut state = ready_state();
        state.next_year();
        state.set_animating(true);
        let c = state.controls();
        assert!(!c.prev && !c.next && !c.play);
        assert!(c.range_select);

        state.set_animating(false);
        assert!(state.controls().play);
    }

    #[test]
    fn test_sphere_radius_breakpoints() {
        assert_eq!(sphere_radius(320), 1.4);
        assert_eq!(sphere_radius(480), 1.4);
        assert_eq!(sphere_radius(800), 1.8);
        assert_eq!(sphere_radius(1024), 1.8);
        assert_eq!(sphere_radius(1920), 2.0);
    }
}
