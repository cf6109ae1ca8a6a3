//! Pure dimension arithmetic for the letterbox transform.
//!
//! Nothing in here needs pixels, so every rule of the layout is testable
//! with plain integers.

/// Orientation class of an upright source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrientation {
    /// Width >= height. Square sources land here.
    Landscape,
    Portrait,
}

impl SourceOrientation {
    pub fn classify(width: u32, height: u32) -> Self {
        if width >= height {
            SourceOrientation::Landscape
        } else {
            SourceOrientation::Portrait
        }
    }
}

/// Largest size with the source's aspect ratio that fits inside `target`.
///
/// The dimension that would overflow the target box is pinned to the target
/// and the other one is scaled down (floored). Both results are clamped to
/// `1..=target` so degenerate sources still produce a pasteable image.
///
/// ```
/// # use shelf_imaging::fit_within;
/// // 4000x3000 into a 1920x1080 box is height-bound.
/// assert_eq!(fit_within((4000, 3000), (1920, 1080)), (1440, 1080));
/// // 6000x2000 panorama is width-bound.
/// assert_eq!(fit_within((6000, 2000), (1920, 1080)), (1920, 640));
/// ```
pub fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (u64::from(source.0.max(1)), u64::from(source.1.max(1)));
    let (tgt_w, tgt_h) = (u64::from(target.0), u64::from(target.1));

    // src_w / src_h > tgt_w / tgt_h, compared without floats.
    let (w, h) = if src_w * tgt_h > tgt_w * src_h {
        (tgt_w, tgt_w * src_h / src_w)
    } else {
        (tgt_h * src_w / src_h, tgt_h)
    };

    (clamp_dim(w, target.0), clamp_dim(h, target.1))
}

/// Top-left offset that centres `inner` inside `outer`.
pub fn centered_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

fn clamp_dim(value: u64, max: u32) -> u32 {
    u32::try_from(value).unwrap_or(max).clamp(1, max.max(1))
}
