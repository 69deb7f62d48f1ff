//! Page-level settings and output destinations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{EngineError, Result};

/// Noise filter strength: 0 disables, 1-7 enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NoiseFilter(u8);

impl NoiseFilter {
    pub const DISABLED: NoiseFilter = NoiseFilter(0);
    pub const MAX_LEVEL: u8 = 7;

    pub fn new(level: u8) -> Result<Self> {
        if level > Self::MAX_LEVEL {
            return Err(EngineError::InvalidNoiseFilter(level));
        }
        Ok(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn is_enabled(self) -> bool {
        self.0 != 0
    }
}

impl TryFrom<u8> for NoiseFilter {
    type Error = EngineError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<NoiseFilter> for u8 {
    fn from(filter: NoiseFilter) -> u8 {
        filter.0
    }
}

/// Toggles applied to each page before the processing phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    /// Rotate the page upright before processing
    pub orientation_correction: bool,

    /// Crop page borders
    pub cropping: bool,

    /// Straighten skewed scans
    pub deskewing: bool,

    /// Extended Arabic handwriting processing
    pub handwriting_processing: bool,

    pub noise_filter: NoiseFilter,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            orientation_correction: false,
            cropping: false,
            deskewing: false,
            handwriting_processing: true,
            noise_filter: NoiseFilter::DISABLED,
        }
    }
}

/// Output files written by the engine for one page.
///
/// Any destination left unset suppresses that output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Scaled copy of the page with noise filtered and orientation corrected
    pub cleaned_image: Option<PathBuf>,

    /// Recognized text, UTF-8
    pub utf8_text: Option<PathBuf>,

    /// Recognized text, UTF-16
    pub utf16_text: Option<PathBuf>,
}

impl OutputPaths {
    pub fn cleaned_only(path: impl Into<PathBuf>) -> Self {
        Self {
            cleaned_image: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cleaned_image.is_none() && self.utf8_text.is_none() && self.utf16_text.is_none()
    }

    /// Registered paths in write order: cleaned image, UTF-8, UTF-16
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.cleaned_image
            .iter()
            .chain(self.utf8_text.iter())
            .chain(self.utf16_text.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_filter_range() {
        assert!(!NoiseFilter::new(0).unwrap().is_enabled());
        assert_eq!(NoiseFilter::new(7).unwrap().level(), 7);
        assert!(matches!(
            NoiseFilter::new(8),
            Err(EngineError::InvalidNoiseFilter(8))
        ));
    }

    #[test]
    fn test_default_page_options() {
        let options = PageOptions::default();
        assert!(!options.orientation_correction);
        assert!(!options.cropping);
        assert!(!options.deskewing);
        assert!(options.handwriting_processing);
        assert_eq!(options.noise_filter, NoiseFilter::DISABLED);
    }

    #[test]
    fn test_page_options_reject_bad_noise_level() {
        let parsed: std::result::Result<PageOptions, _> =
            serde_json::from_str(r#"{"noise_filter": 12}"#);
        assert!(parsed.is_err());

        let parsed: PageOptions = serde_json::from_str(r#"{"noise_filter": 3}"#).unwrap();
        assert_eq!(parsed.noise_filter.level(), 3);
        assert!(parsed.handwriting_processing);
    }

    #[test]
    fn test_output_paths_order() {
        let outputs = OutputPaths {
            cleaned_image: Some("a-cln.tif".into()),
            utf8_text: None,
            utf16_text: Some("a.utf16".into()),
        };
        let paths: Vec<_> = outputs.iter().collect();
        assert_eq!(paths, vec![&PathBuf::from("a-cln.tif"), &PathBuf::from("a.utf16")]);
        assert!(OutputPaths::default().is_empty());
    }
}
