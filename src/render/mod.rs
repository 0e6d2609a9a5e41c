//! Clip timing, banner compositing and the render driver.

/// Banner placement and blending onto frames.
pub mod composite;
/// Frame loop, output paths and the [`crate::ReelPipeline`] entry point.
pub mod pipeline;
/// Effective duration and frame schedule.
pub mod timing;
