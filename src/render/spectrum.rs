// Spectrum module - plots real, imaginary and magnitude traces
//
// Each channel is normalized by its own largest absolute value over the whole
// coefficient set, so zooming never changes the vertical scale. A channel
// whose maximum is zero is skipped entirely.

use serde::Serialize;

use super::surface::{Pixel, RasterSurface};
use crate::analysis::{CoefficientArray, SpectrumChannel};

/// Default visual gain applied after normalization
pub const DEFAULT_AMPLIFICATION: f64 = 0.9;

/// Plot color for a channel
pub fn channel_color(channel: SpectrumChannel) -> Pixel {
    match channel {
        SpectrumChannel::Real => Pixel::RED,
        SpectrumChannel::Imaginary => Pixel::GREEN,
        SpectrumChannel::Magnitude => Pixel::WHITE,
    }
}

/// What a render pass put on the surface
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderStats {
    pub bins_plotted: usize,
    pub points_plotted: usize,
    pub points_dropped: usize,
    pub skipped_channels: Vec<SpectrumChannel>,
}

/// Maps a coefficient array onto a raster
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumRenderer {
    amplification: f64,
    zoom: Option<(f64, f64)>,
}

impl Default for SpectrumRenderer {
    fn default() -> Self {
        Self {
            amplification: DEFAULT_AMPLIFICATION,
            zoom: None,
        }
    }
}

impl SpectrumRenderer {
    pub fn new(amplification: f64) -> Self {
        Self {
            amplification,
            zoom: None,
        }
    }

    /// Only plot bins whose frequency lies inside `[min_freq, max_freq]`
    pub fn with_zoom(mut self, min_freq: f64, max_freq: f64) -> Self {
        self.zoom = Some((min_freq, max_freq));
        self
    }

    /// Draw three points per bin column onto `surface`
    ///
    /// Bin `i` of the visible range lands in column `i * width / visible`.
    pub fn render(&self, coefficients: &CoefficientArray, surface: &mut RasterSurface) -> RenderStats {
        let bins = match self.zoom {
            Some((lo, hi)) => coefficients.sweep().bins_within(lo, hi),
            None => 0..coefficients.len(),
        };
        let visible = bins.len();
        let width = surface.width() as usize;

        let mut stats = RenderStats {
            bins_plotted: visible,
            ..RenderStats::default()
        };

        let scales: Vec<(SpectrumChannel, Option<f64>)> = SpectrumChannel::ALL
            .iter()
            .map(|&channel| {
                let peak = coefficients.channel_peak(channel);
                (channel, (peak > 0.0).then(|| self.amplification / peak))
            })
            .collect();

        for (channel, scale) in &scales {
            if scale.is_none() {
                tracing::debug!(
                    "[SpectrumRenderer] {:?} channel is all zero, nothing to plot",
                    channel
                );
                stats.skipped_channels.push(*channel);
            }
        }

        for (i, k) in bins.clone().enumerate() {
            let column = (i * width / visible) as u32;
            let value = coefficients.values()[k];
            for &(channel, scale) in &scales {
                let Some(scale) = scale else {
                    continue;
                };
                // Rows grow downward; positive values plot upward.
                let y = -channel.extract(value) * scale;
                if surface.plot_point(column, y, channel_color(channel)) {
                    stats.points_plotted += 1;
                } else {
                    stats.points_dropped += 1;
                }
            }
        }

        tracing::info!(
            "[SpectrumRenderer] Plotted bins {:?} into {}x{} ({} points, {} dropped)",
            bins,
            surface.width(),
            surface.height(),
            stats.points_plotted,
            stats.points_dropped
        );

        stats
    }
}
