// Render module - spectrum raster output
//
// Architecture:
// - RasterSurface: caller-owned RGB grid, point plotting, bulk stream output
// - SpectrumRenderer: real/imaginary/magnitude traces per bin column
// - plot_winding: optional phasor background composited under the spectrum

pub mod spectrum;
pub mod surface;
pub mod winding;

pub use spectrum::{channel_color, RenderStats, SpectrumRenderer, DEFAULT_AMPLIFICATION};
pub use surface::{Pixel, RasterSurface, PIXEL_BYTES};
pub use winding::plot_winding;
