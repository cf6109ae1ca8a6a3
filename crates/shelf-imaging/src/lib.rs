//! Letterbox transform for a single image buffer.
//!
//! [`transform`] decodes one image, rotates it upright according to its
//! embedded orientation tag, fits it inside the target box of a
//! [`ResizeProfile`], centres it on a solid canvas and re-encodes it.
//! Nothing here touches the filesystem or the network, so callers are free
//! to run it on a blocking thread of their choosing.
//!
//! ```rust,no_run
//! use shelf_imaging::{transform, ResizeProfile, TransformOutcome};
//!
//! let profile = ResizeProfile::new(1920, 1080);
//! # let bytes: Vec<u8> = Vec::new();
//! match transform(&bytes, "IMG_0001.jpg", &profile) {
//!     TransformOutcome::Processed(out) => println!("{} bytes", out.len()),
//!     TransformOutcome::Skip(reason) => println!("skipped: {reason}"),
//!     TransformOutcome::Fail(reason) => eprintln!("failed: {reason}"),
//! }
//! ```

pub mod calculations;
mod error;
mod profile;
mod transform;

pub use calculations::{centered_offset, fit_within, SourceOrientation};
pub use error::ImagingError;
pub use profile::{OutputFormat, ResizeProfile, DEFAULT_QUALITY};
pub use transform::{transform, SkipReason, TransformOutcome};
