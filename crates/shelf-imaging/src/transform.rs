use std::fmt;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};
use tracing::trace;

use crate::calculations::{centered_offset, fit_within, SourceOrientation};
use crate::error::ImagingError;
use crate::profile::{OutputFormat, ResizeProfile};

/// Why a decodable image was deliberately left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The profile does not accept sources with this orientation.
    OrientationExcluded(SourceOrientation),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OrientationExcluded(SourceOrientation::Landscape) => {
                f.write_str("landscape images are excluded by the profile")
            }
            SkipReason::OrientationExcluded(SourceOrientation::Portrait) => {
                f.write_str("portrait images are excluded by the profile")
            }
        }
    }
}

/// Result of transforming one image.
///
/// `Skip` is a filter decision and not an error; `Fail` carries a
/// human-readable reason for operators.
#[derive(Debug)]
pub enum TransformOutcome {
    Processed(Vec<u8>),
    Skip(SkipReason),
    Fail(String),
}

/// Letterbox `source` into the profile's target box and re-encode it.
///
/// `file_name` is only used in failure messages.
pub fn transform(source: &[u8], file_name: &str, profile: &ResizeProfile) -> TransformOutcome {
    if let Err(e) = profile.validate() {
        return TransformOutcome::Fail(e.to_string());
    }

    let image = match decode_upright(source, file_name) {
        Ok(image) => image,
        Err(e) => return TransformOutcome::Fail(e.to_string()),
    };

    let orientation = SourceOrientation::classify(image.width(), image.height());
    let accepted = match orientation {
        SourceOrientation::Landscape => profile.include_landscape,
        SourceOrientation::Portrait => profile.include_portrait,
    };
    if !accepted {
        return TransformOutcome::Skip(SkipReason::OrientationExcluded(orientation));
    }

    let canvas = letterbox(&image, profile);
    match encode(&canvas, profile, file_name) {
        Ok(bytes) => TransformOutcome::Processed(bytes),
        Err(e) => TransformOutcome::Fail(e.to_string()),
    }
}

/// Decode and apply the embedded orientation tag so pixels are upright.
fn decode_upright(source: &[u8], file_name: &str) -> Result<DynamicImage, ImagingError> {
    let decode_err = |source| ImagingError::Decode {
        file_name: file_name.to_owned(),
        source,
    };

    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?;
    let mut decoder = reader.into_decoder().map_err(decode_err)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);
    trace!(file_name, width = image.width(), height = image.height(), "decoded");
    Ok(image)
}

fn letterbox(image: &DynamicImage, profile: &ResizeProfile) -> RgbImage {
    let target = (profile.width, profile.height);
    let fitted = fit_within((image.width(), image.height()), target);
    let resized = imageops::resize(&image.to_rgb8(), fitted.0, fitted.1, FilterType::Lanczos3);

    let mut canvas = RgbImage::from_pixel(target.0, target.1, Rgb(profile.background));
    let (x, y) = centered_offset(target, fitted);
    imageops::overlay(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

fn encode(canvas: &RgbImage, profile: &ResizeProfile, file_name: &str) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    let result = match profile.format {
        OutputFormat::Jpeg => {
            canvas.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, profile.quality))
        }
        OutputFormat::Png => canvas.write_with_encoder(PngEncoder::new(&mut buf)),
    };
    result.map_err(|source| ImagingError::Encode {
        file_name: file_name.to_owned(),
        source,
    })?;
    Ok(buf)
}
