// Winding module - phasor background plot
//
// Wraps the signal around the origin at one frequency: every sample becomes
// the point `radius * e^(-2πi·f·t)` with `radius = 0.5 + 0.5 * sample`. A
// frequency present in the signal makes the trace lopsided. Each hit adds a
// little brightness, so dense regions glow.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use super::surface::RasterSurface;
use crate::analysis::Signal;

/// Brightness added per plotted sample
pub const WINDING_BRIGHTNESS_STEP: u16 = 2;

/// Plot the winding of `signal` at `freq` onto `surface`
///
/// The horizontal axis is divided by the aspect ratio so the trace stays
/// circular on non-square surfaces; the vertical axis is flipped so positive
/// imaginary parts plot upward. Returns the number of samples that landed.
pub fn plot_winding(surface: &mut RasterSurface, signal: &Signal<'_>, freq: f64) -> usize {
    let aspect = surface.width() as f64 / surface.height() as f64;
    let mut hits = 0;

    for (n, &sample) in signal.samples().iter().enumerate() {
        let radius = 0.5 + 0.5 * sample;
        let point = Complex64::new(0.0, -2.0 * PI * freq * signal.time(n)).exp() * radius;

        let x = RasterSurface::axis_position(point.re / aspect, surface.width());
        let y = RasterSurface::axis_position(-point.im, surface.height());
        if let (Some(x), Some(y)) = (x, y) {
            if surface.brighten(x, y, WINDING_BRIGHTNESS_STEP) {
                hits += 1;
            }
        }
    }

    tracing::info!(
        "[Winding] Wound {} samples at {:.3} Hz ({} on surface)",
        signal.len(),
        freq,
        hits
    );
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::Pixel;

    #[test]
    fn test_silence_traces_half_radius_circle() {
        let samples = vec![0.0; 4];
        let signal = Signal::new(&samples, 4);
        let mut surface = RasterSurface::new(20, 20).unwrap();

        // One full turn per second, sampled at quarter turns.
        let hits = plot_winding(&mut surface, &signal, 1.0);
        assert_eq!(hits, 4);

        // t=0 -> (0.5, 0) -> column 15, row 10.
        assert_eq!(surface.get(15, 10), Some(Pixel::rgb(2, 2, 2)));
        // t=0.25 -> (0, -0.5) -> flipped to +0.5 -> row 15.
        assert_eq!(surface.get(10, 15), Some(Pixel::rgb(2, 2, 2)));
    }

    #[test]
    fn test_repeated_hits_accumulate() {
        let samples = vec![1.0; 3];
        let signal = Signal::new(&samples, 10);
        let mut surface = RasterSurface::new(10, 10).unwrap();

        // Zero frequency keeps every sample on the same point.
        plot_winding(&mut surface, &signal, 0.0);
        // radius 1.0 -> x = 5 + 5 = 10, off the right edge.
        assert!(surface.pixels().iter().all(Pixel::is_black));

        let samples = vec![0.0; 3];
        let signal = Signal::new(&samples, 10);
        plot_winding(&mut surface, &signal, 0.0);
        assert_eq!(surface.get(7, 5), Some(Pixel::rgb(6, 6, 6)));
    }

    #[test]
    fn test_aspect_ratio_squeezes_horizontal_axis() {
        let samples = vec![0.0];
        let signal = Signal::new(&samples, 1);
        let mut surface = RasterSurface::new(40, 20).unwrap();
        plot_winding(&mut surface, &signal, 0.0);
        // 0.5 / 2.0 * 20 + 20 = 25
        assert_eq!(surface.get(25, 10), Some(Pixel::rgb(2, 2, 2)));
    }
}
