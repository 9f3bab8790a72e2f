//! Spectrum catalog - which instruments exist and which years they cover.

use super::ViewerError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// One data source whose year-indexed images are mapped onto the globe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spectrum {
    pub name: String,
    pub min_year: i32,
    pub max_year: i32,
}

impl Spectrum {
    pub fn new(name: impl Into<String>, min_year: i32, max_year: i32) -> Self {
        Self {
            name: name.into(),
            min_year,
            max_year,
        }
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.min_year..=self.max_year
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years().contains(&year)
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.min_year, self.max_year)
    }
}

/// Ordered list of spectra. Order is the selector order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumCatalog {
    spectra: Vec<Spectrum>,
}

impl Default for SpectrumCatalog {
    fn default() -> Self {
        Self {
            spectra: vec![
                Spectrum::new("modis", 2000, 2025),
                Spectrum::new("aster", 2025, 2025),
                Spectrum::new("ceres", 2025, 2025),
                Spectrum::new("misr", 2025, 2025),
                Spectrum::new("mopitt", 2025, 2025),
            ],
        }
    }
}

impl SpectrumCatalog {
    /// Build from a list, rejecting empty lists, inverted year bounds and duplicates.
    pub fn new(spectra: Vec<Spectrum>) -> Result<Self, ViewerError> {
        if spectra.is_empty() {
            return Err(ViewerError::EmptyCatalog);
        }
        for (i, s) in spectra.iter().enumerate() {
            if s.min_year > s.max_year {
                return Err(ViewerError::InvertedSpectrum {
                    name: s.name.clone(),
                    min: s.min_year,
                    max: s.max_year,
                });
            }
            if spectra[..i].iter().any(|other| other.name == s.name) {
                return Err(ViewerError::DuplicateSpectrum(s.name.clone()));
            }
        }
        Ok(Self { spectra })
    }

    pub fn get(&self, name: &str) -> Option<&Spectrum> {
        self.spectra.iter().find(|s| s.name == name)
    }

    pub fn first(&self) -> &Spectrum {
        // Non-empty by construction
        &self.spectra[0]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.spectra.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spectrum> {
        self.spectra.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = SpectrumCatalog::default();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["modis", "aster", "ceres", "misr", "mopitt"]
        );
        let modis = catalog.get("modis").unwrap();
        assert_eq!(modis.years().count(), 26);
        assert!(catalog.get("landsat").is_none());
    }

    #[test]
    fn test_rejects_bad_catalogs() {
        assert_eq!(SpectrumCatalog::new(vec![]), Err(ViewerError::EmptyCatalog));
        assert!(matches!(
            SpectrumCatalog::new(vec![Spectrum::new("x", 2010, 2000)]),
            Err(ViewerError::InvertedSpectrum { .. })
        ));
        assert_eq!(
            SpectrumCatalog::new(vec![Spectrum::new("a", 1, 2), Spectrum::new("a", 3, 4)]),
            Err(ViewerError::DuplicateSpectrum("a".into()))
        );
    }

    #[test]
    fn test_clamp_and_contains() {
        let s = Spectrum::new("modis", 2000, 2025);
        assert_eq!(s.clamp(1990), 2000);
        assert_eq!(s.clamp(2030), 2025);
        assert!(s.contains(2000) && s.contains(2025));
        assert!(!s.contains(2026));
    }
}
