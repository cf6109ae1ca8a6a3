use serde::{Deserialize, Serialize};

use crate::error::ImagingError;

/// JPEG quality used when a profile does not specify one.
pub const DEFAULT_QUALITY: u8 = 75;

/// Encoding of the letterboxed output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    /// Lossless; the profile's quality is ignored.
    Png,
}

/// Target geometry and encoding for one resize run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeProfile {
    pub width: u32,
    pub height: u32,
    /// Encoder quality, 1..=100.
    pub quality: u8,
    /// Accept sources whose width >= height.
    pub include_landscape: bool,
    /// Accept sources whose height > width.
    pub include_portrait: bool,
    /// Colour of the letterbox / pillarbox bars.
    pub background: [u8; 3],
    pub format: OutputFormat,
}

impl ResizeProfile {
    /// A JPEG profile that accepts every orientation on a black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            quality: DEFAULT_QUALITY,
            include_landscape: true,
            include_portrait: true,
            background: [0, 0, 0],
            format: OutputFormat::Jpeg,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_orientations(mut self, landscape: bool, portrait: bool) -> Self {
        self.include_landscape = landscape;
        self.include_portrait = portrait;
        self
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ImagingError> {
        if self.width == 0 || self.height == 0 {
            return Err(ImagingError::InvalidProfile(format!(
                "target size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ImagingError::InvalidProfile(format!(
                "quality {} must be between 1 and 100",
                self.quality
            )));
        }
        Ok(())
    }
}
