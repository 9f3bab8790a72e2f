//! Viewer-side collaborators: spectrum catalog, UI state and texture assets.

pub mod spectrum;
pub mod state;
pub mod textures;

pub use spectrum::{Spectrum, SpectrumCatalog};
pub use state::{Controls, PREDICTION_YEARS, ViewerState, sphere_radius};
pub use textures::{LogSink, PreloadReport, TextureCatalog, TextureRef, TextureSink};

use crate::core::SequencerError;
use thiserror::Error;

/// Errors surfaced to the user by viewer operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("Unknown spectrum '{0}'")]
    UnknownSpectrum(String),
    #[error("Year {year} is outside '{spectrum}' ({min}..={max})")]
    YearOutOfRange {
        spectrum: String,
        year: i32,
        min: i32,
        max: i32,
    },
    #[error("Prediction year must be between 2025 and 3000, got {0}")]
    InvalidPredictionYear(i32),
    #[error("Spectrum catalog is empty")]
    EmptyCatalog,
    #[error("Spectrum '{name}' has min year {min} after max year {max}")]
    InvertedSpectrum { name: String, min: i32, max: i32 },
    #[error("Spectrum '{0}' is listed twice")]
    DuplicateSpectrum(String),
    #[error(transparent)]
    Playback(#[from] SequencerError),
}
