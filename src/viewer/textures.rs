//! Year-to-texture lookup backed by preloaded image assets.
//!
//! # Layout
//!
//! ```text
//! <assets>/imgs/{spectrum}-{year}.jpg       per-year textures
//! <assets>/imgs/texture-not-found.jpg       fallback
//! <assets>/outputs/prediction_future.jpg    written by the prediction service
//! ```
//!
//! Preloading reads image headers only (`image::image_dimensions`), so it is
//! cheap even for 4096x2048 textures. The decoded pixels belong to the
//! rendering collaborator behind [`TextureSink`].

use super::spectrum::Spectrum;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const FALLBACK_TEXTURE: &str = "imgs/texture-not-found.jpg";
pub const PREDICTION_TEXTURE: &str = "outputs/prediction_future.jpg";
const FALLBACK_ASSET_ID: &str = "fallback-texture";
const PREDICTION_ASSET_ID: &str = "prediction-texture";

/// A texture ready to be handed to the globe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureRef {
    pub asset_id: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// True when this is the fallback standing in for a missing year
    pub fallback: bool,
}

/// Result of preloading one spectrum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    pub spectrum: String,
    pub loaded: usize,
    pub missing: Vec<i32>,
    pub fallback_available: bool,
}

/// Asset id of a spectrum/year texture
pub fn asset_id(spectrum: &str, year: i32) -> String {
    format!("{}-{}-texture", spectrum, year)
}

/// Receives textures to put on the globe (the 3D engine side).
pub trait TextureSink {
    fn apply(&mut self, texture: &TextureRef);
}

/// Sink that only logs - used by the headless runner.
#[derive(Debug, Default)]
pub struct LogSink;

impl TextureSink for LogSink {
    fn apply(&mut self, texture: &TextureRef) {
        if texture.fallback {
            warn!("Globe texture: {} (fallback)", texture.path.display());
        } else {
            info!(
                "Globe texture: {} ({}x{})",
                texture.path.display(),
                texture.width,
                texture.height
            );
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextureCatalog {
    root: PathBuf,
    loaded: HashMap<String, TextureRef>,
    fallback: Option<TextureRef>,
}

impl TextureCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: HashMap::new(),
            fallback: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn texture_path(&self, spectrum: &str, year: i32) -> PathBuf {
        self.root.join("imgs").join(format!("{}-{}.jpg", spectrum, year))
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.root.join(FALLBACK_TEXTURE)
    }

    pub fn prediction_path(&self) -> PathBuf {
        self.root.join(PREDICTION_TEXTURE)
    }

    /// Read image headers for every year of `spectrum` plus the fallback.
    pub fn preload(&mut self, spectrum: &Spectrum) -> PreloadReport {
        info!(
            "Preloading '{}' textures {}..={} from {}",
            spectrum.name,
            spectrum.min_year,
            spectrum.max_year,
            self.root.display()
        );

        if self.fallback.is_none() {
            self.fallback = probe(&self.fallback_path()).map(|(width, height)| TextureRef {
                asset_id: FALLBACK_ASSET_ID.to_string(),
                path: self.fallback_path(),
                width,
                height,
                fallback: true,
            });
            if self.fallback.is_none() {
                warn!("Fallback texture missing: {}", self.fallback_path().display());
            }
        }

        let mut loaded = 0;
        let mut missing = Vec::new();
        for year in spectrum.years() {
            let path = self.texture_path(&spectrum.name, year);
            match probe(&path) {
                Some((width, height)) => {
                    let id = asset_id(&spectrum.name, year);
                    self.loaded.insert(
                        id.clone(),
                        TextureRef {
                            asset_id: id,
                            path,
                            width,
                            height,
                            fallback: false,
                        },
                    );
                    loaded += 1;
                }
                None => missing.push(year),
            }
        }

        if missing.is_empty() {
            info!("All {} '{}' textures loaded", loaded, spectrum.name);
        } else {
            warn!(
                "'{}': {} textures loaded, {} missing ({:?})",
                spectrum.name,
                loaded,
                missing.len(),
                missing
            );
        }

        PreloadReport {
            spectrum: spectrum.name.clone(),
            loaded,
            missing,
            fallback_available: self.fallback.is_some(),
        }
    }

    /// Texture for a year, the fallback if that year is missing, `None` if both are.
    pub fn lookup(&self, spectrum: &str, year: i32) -> Option<TextureRef> {
        let id = asset_id(spectrum, year);
        if let Some(texture) = self.loaded.get(&id) {
            return Some(texture.clone());
        }
        match &self.fallback {
            Some(fallback) => {
                debug!("No texture #{}, using fallback", id);
                Some(fallback.clone())
            }
            None => {
                error!("Neither asset #{} nor the fallback was found", id);
                None
            }
        }
    }

    /// The prediction image, probed on every call since it is produced externally.
    pub fn prediction(&self) -> Option<TextureRef> {
        let path = self.prediction_path();
        match probe(&path) {
            Some((width, height)) => Some(TextureRef {
                asset_id: PREDICTION_ASSET_ID.to_string(),
                path,
                width,
                height,
                fallback: false,
            }),
            None => {
                error!(
                    "Could not load '{}'. Has the prediction been generated?",
                    path.display()
                );
                None
            }
        }
    }
}

fn probe(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dims) => Some(dims),
        Err(e) => {
            debug!("Texture probe failed for {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Write a tiny JPEG at `root/rel`
    pub(crate) fn write_texture(root: &Path, rel: &str, width: u32, height: u32) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbImage::new(width, height).save(&path).unwrap();
    }

    pub(crate) fn temp_assets(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("terraplay_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Sink recording every applied path
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub applied: std::rc::Rc<std::cell::RefCell<Vec<TextureRef>>>,
    }

    impl TextureSink for RecordingSink {
        fn apply(&mut self, texture: &TextureRef) {
            self.applied.borrow_mut().push(texture.clone());
        }
    }

    #[test]
    fn test_paths_and_ids() {
        let catalog = TextureCatalog::new("/assets");
        assert_eq!(
            catalog.texture_path("modis", 2003),
            PathBuf::from("/assets/imgs/modis-2003.jpg")
        );
        assert_eq!(asset_id("modis", 2003), "modis-2003-texture");
        assert_eq!(
            catalog.prediction_path(),
            PathBuf::from("/assets/outputs/prediction_future.jpg")
        );
    }

    #[test]
    fn test_preload_and_lookup() {
        let root = temp_assets("preload");
        write_texture(&root, "imgs/modis-2000.jpg", 8, 4);
        write_texture(&root, "imgs/modis-2002.jpg", 8, 4);
        write_texture(&root, FALLBACK_TEXTURE, 2, 2);

        let mut catalog = TextureCatalog::new(&root);
        let report = catalog.preload(&Spectrum::new("modis", 2000, 2002));
        assert_eq!(report.loaded, 2);
        assert_eq!(report.missing, vec![2001]);
        assert!(report.fallback_available);

        let hit = catalog.lookup("modis", 2000).unwrap();
        assert!(!hit.fallback);
        assert_eq!((hit.width, hit.height), (8, 4));

        let miss = catalog.lookup("modis", 2001).unwrap();
        assert!(miss.fallback);
        assert_eq!(miss.path, root.join(FALLBACK_TEXTURE));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_lookup_without_fallback() {
        let root = temp_assets("nofallback");
        let mut catalog = TextureCatalog::new(&root);
        let report = catalog.preload(&Spectrum::new("aster", 2025, 2025));
        assert_eq!(report.missing, vec![2025]);
        assert!(!report.fallback_available);
        assert!(catalog.lookup("aster", 2025).is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_prediction_probe() {
        let root = temp_assets("prediction");
        let catalog = TextureCatalog::new(&root);
        assert!(catalog.prediction().is_none());

        write_texture(&root, PREDICTION_TEXTURE, 16, 8);
        let prediction = catalog.prediction().unwrap();
        assert_eq!((prediction.width, prediction.height), (16, 8));
        let _ = std::fs::remove_dir_all(&root);
    }
}
