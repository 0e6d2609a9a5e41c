pub(crate) mod fit;
pub(crate) mod zoom;

/// Resampling filter shared by fitting and zooming. Never nearest-neighbour.
pub(crate) const RESAMPLE_FILTER: image::imageops::FilterType =
    image::imageops::FilterType::Lanczos3;
