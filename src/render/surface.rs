// Surface module - RGB raster with point plotting and bulk output
//
// Pixels are three native-endian u16 channels, stored row-major. The raw
// byte view is exactly what goes to the output stream.

use std::io::Write;

use bytemuck::{Pod, Zeroable};

use crate::error::StorageError;

/// One raster pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Pixel {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::rgb(0, 0, 0);
    pub const WHITE: Pixel = Pixel::rgb(u16::MAX, u16::MAX, u16::MAX);
    pub const RED: Pixel = Pixel::rgb(u16::MAX, 0, 0);
    pub const GREEN: Pixel = Pixel::rgb(0, u16::MAX, 0);

    pub const fn rgb(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

/// Bytes per pixel in the output stream
pub const PIXEL_BYTES: usize = std::mem::size_of::<Pixel>();

/// Caller-owned width × height pixel grid
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl RasterSurface {
    /// All-black surface
    ///
    /// # Errors
    /// `StorageError::AllocationFailed` if the pixel buffer cannot be allocated.
    pub fn new(width: u32, height: u32) -> Result<Self, StorageError> {
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| StorageError::AllocationFailed {
                what: "raster".to_string(),
                requested: usize::MAX,
            })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| StorageError::AllocationFailed {
                what: "raster".to_string(),
                requested: count,
            })?;
        pixels.resize(count, Pixel::BLACK);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        self.index(x as i64, y as i64).map(|i| self.pixels[i])
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Map a normalized coordinate to a pixel offset on one axis
    ///
    /// `-1.0` is the low edge, `0.0` the center; the product is truncated
    /// toward zero before the center offset is added.
    pub fn axis_position(value: f64, extent: u32) -> Option<i64> {
        if !value.is_finite() {
            return None;
        }
        let half = (extent >> 1) as i64;
        Some((value * half as f64) as i64 + half)
    }

    /// Set the pixel at column `x` and normalized row `y` (down is positive)
    ///
    /// Returns `false` when the point falls off the surface.
    pub fn plot_point(&mut self, x: u32, y: f64, color: Pixel) -> bool {
        let Some(row) = Self::axis_position(y, self.height) else {
            return false;
        };
        match self.index(x as i64, row) {
            Some(i) => {
                self.pixels[i] = color;
                true
            }
            None => false,
        }
    }

    /// Add `amount` to every channel of the pixel at `(x, y)`, saturating
    pub fn brighten(&mut self, x: i64, y: i64, amount: u16) -> bool {
        match self.index(x, y) {
            Some(i) => {
                let pixel = &mut self.pixels[i];
                pixel.r = pixel.r.saturating_add(amount);
                pixel.g = pixel.g.saturating_add(amount);
                pixel.b = pixel.b.saturating_add(amount);
                true
            }
            None => false,
        }
    }

    /// Copy every non-black pixel of `top` over this surface
    ///
    /// # Panics
    /// Panics if the two surfaces differ in size.
    pub fn overlay(&mut self, top: &RasterSurface) {
        assert_eq!(
            (self.width, self.height),
            (top.width, top.height),
            "overlay requires equal surface sizes"
        );
        for (dst, src) in self.pixels.iter_mut().zip(&top.pixels) {
            if !src.is_black() {
                *dst = *src;
            }
        }
    }

    /// Raw row-major pixel records
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Write the whole raster in one pass
    ///
    /// # Errors
    /// `StorageError::ShortWrite` if the sink does not accept every byte.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), StorageError> {
        let bytes = self.as_bytes();
        let short = |err: std::io::Error| StorageError::ShortWrite {
            expected: bytes.len(),
            reason: err.to_string(),
        };
        out.write_all(bytes).map_err(short)?;
        out.flush().map_err(short)?;
        tracing::debug!(
            "[RasterSurface] Wrote {}x{} raster ({} bytes)",
            self.width,
            self.height,
            bytes.len()
        );
        Ok(())
    }
}
