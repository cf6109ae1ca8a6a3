use thiserror::Error;

/// Errors raised while turning a source buffer into a letterboxed image.
#[derive(Debug, Error)]
pub enum ImagingError {
    /// The buffer is not an image we can read (corrupt or unsupported format).
    #[error("cannot decode {file_name}: {source}")]
    Decode {
        file_name: String,
        #[source]
        source: image::ImageError,
    },

    /// The letterboxed canvas could not be encoded.
    #[error("cannot encode {file_name}: {source}")]
    Encode {
        file_name: String,
        #[source]
        source: image::ImageError,
    },

    /// The profile asks for something we cannot produce.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}
