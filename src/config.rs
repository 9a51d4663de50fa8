//! Configuration management for sweep runs
//!
//! This module provides configuration loading from JSON files and the
//! structural validation that must pass before any samples are touched.
//! Every field has a default, so a config file only needs the values it
//! wants to change; the command line layers on top of whatever the file sets.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::analysis::{FrequencySweep, Normalization, QuadratureKind};
use crate::audio::tones::ToneSpec;
use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub sweep: SweepConfig,
    pub transform: TransformConfig,
    pub signal: SignalConfig,
    pub synthesis: SynthesisConfig,
}

/// Raster width × height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl FromStr for Resolution {
    type Err = ConfigError;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x720`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidResolution {
            input: input.to_string(),
        };
        let (width, height) = input
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width: u32 = width.parse().map_err(|_| invalid())?;
        let height: u32 = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Frequency sub-window used to restrict plotting or reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min_freq: f64,
    pub max_freq: f64,
}

impl ZoomRange {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_freq.is_finite() || !self.max_freq.is_finite() {
            return Err(ConfigError::InvalidZoom {
                reason: "bounds must be finite".to_string(),
            });
        }
        if self.min_freq > self.max_freq {
            return Err(ConfigError::InvalidZoom {
                reason: format!(
                    "min_freq {} exceeds max_freq {}",
                    self.min_freq, self.max_freq
                ),
            });
        }
        Ok(())
    }
}

/// Raster output parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Visual gain applied after each channel is normalized to [-1, 1]
    pub amplification: f64,
    /// Restrict the plot to bins inside this window
    pub zoom: Option<ZoomRange>,
    /// Draw the phasor winding of the signal at this frequency underneath
    pub winding_freq: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            amplification: 0.9,
            zoom: None,
            winding_freq: None,
        }
    }
}

impl RenderConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.width = resolution.width;
        self.height = resolution.height;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidResolution {
                input: format!("{}x{}", self.width, self.height),
            });
        }
        if !self.amplification.is_finite() || self.amplification <= 0.0 {
            return Err(ConfigError::InvalidRender {
                reason: format!(
                    "amplification must be positive (got {})",
                    self.amplification
                ),
            });
        }
        if let Some(freq) = self.winding_freq {
            if !freq.is_finite() {
                return Err(ConfigError::InvalidRender {
                    reason: "winding frequency must be finite".to_string(),
                });
            }
        }
        if let Some(zoom) = &self.zoom {
            zoom.validate()?;
        }
        Ok(())
    }
}

/// Swept frequency range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub min_freq: f64,
    /// Defaults to twice the highest synthesized tone, or Nyquist for file input
    pub max_freq: Option<f64>,
    /// Defaults to twice the raster width
    pub num_freqs: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_freq: 0.0,
            max_freq: None,
            num_freqs: None,
        }
    }
}

impl SweepConfig {
    /// Resolve defaults and build the sweep
    pub fn resolve(
        &self,
        width: u32,
        fallback_max_freq: f64,
    ) -> Result<FrequencySweep, ConfigError> {
        let num_freqs = self.num_freqs.unwrap_or(width as usize * 2);
        let max_freq = self.max_freq.unwrap_or(fallback_max_freq);
        FrequencySweep::new(self.min_freq, max_freq, num_freqs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_freq.is_finite() {
            return Err(ConfigError::InvalidSweep {
                reason: "min_freq must be finite".to_string(),
            });
        }
        if let Some(max_freq) = self.max_freq {
            if !max_freq.is_finite() || max_freq < self.min_freq {
                return Err(ConfigError::InvalidSweep {
                    reason: format!(
                        "max_freq {} must be finite and >= min_freq {}",
                        max_freq, self.min_freq
                    ),
                });
            }
        }
        if let Some(num_freqs) = self.num_freqs {
            if num_freqs < 2 {
                return Err(ConfigError::InvalidSweep {
                    reason: format!("at least 2 frequency bins required (got {})", num_freqs),
                });
            }
        }
        Ok(())
    }
}

/// Transform engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Number of worker threads
    pub threads: usize,
    pub quadrature: QuadratureKind,
    /// Points evaluated per worker per bin; `None` evaluates every sample
    pub depth: Option<usize>,
    pub normalization: Normalization,
    /// Emit a progress line every this many bins
    pub progress_stride: usize,
    pub report_progress: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            quadrature: QuadratureKind::Trapezoidal,
            depth: Some(8192),
            normalization: Normalization::Integral,
            progress_stride: 5,
            report_progress: true,
        }
    }
}

impl TransformConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreadCount {
                threads: self.threads,
            });
        }
        if let Some(0) = self.depth {
            return Err(ConfigError::InvalidDepth { depth: 0 });
        }
        if self.progress_stride == 0 {
            return Err(ConfigError::InvalidRender {
                reason: "transform progress stride must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Where the samples come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Raw native-endian f64 file, or a `.wav` file; synthesized when absent
    pub input: Option<PathBuf>,
    /// Sample rate for raw and synthesized input (WAV files carry their own)
    pub sample_rate: u32,
    /// Length of the synthesized signal in seconds
    pub duration_s: f64,
    pub tones: Vec<ToneSpec>,
    /// Peak amplitude of uniform white noise mixed into synthesized input
    pub noise_amplitude: f64,
    pub noise_seed: u64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            input: None,
            sample_rate: 48_000,
            duration_s: 10.0,
            tones: vec![
                ToneSpec::new(7.0),
                ToneSpec::new(17.0),
                ToneSpec::new(27.5),
            ],
            noise_amplitude: 0.0,
            noise_seed: 0x5A5A_FFF0,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if self.input.is_some() {
            return Ok(());
        }
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            return Err(ConfigError::InvalidSignal {
                reason: format!("duration must be positive (got {})", self.duration_s),
            });
        }
        if (self.duration_s * self.sample_rate as f64) < 1.0 {
            return Err(ConfigError::InvalidSignal {
                reason: "duration is shorter than one sample".to_string(),
            });
        }
        if self.tones.is_empty() {
            return Err(ConfigError::InvalidSignal {
                reason: "at least one tone is required for synthesized input".to_string(),
            });
        }
        if let Some(tone) = self.tones.iter().find(|tone| !tone.is_finite()) {
            return Err(ConfigError::InvalidSignal {
                reason: format!("tone values must be finite (got {:?})", tone),
            });
        }
        if !self.noise_amplitude.is_finite() || self.noise_amplitude < 0.0 {
            return Err(ConfigError::InvalidSignal {
                reason: format!(
                    "noise amplitude must be >= 0 (got {})",
                    self.noise_amplitude
                ),
            });
        }
        Ok(())
    }

    /// Upper sweep bound when none is configured
    pub fn default_max_freq(&self, sample_rate: u32) -> f64 {
        if self.input.is_some() {
            return sample_rate as f64 / 2.0;
        }
        let highest = self
            .tones
            .iter()
            .map(|tone| tone.frequency_hz)
            .fold(0.0, f64::max);
        highest * 2.0
    }
}

/// Reconstruction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Write the reconstruction here; skipped when absent
    pub output: Option<PathBuf>,
    /// Only sum the bins inside the render zoom window
    pub zoom_only: bool,
    /// Emit a progress line every this many samples
    pub progress_stride: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            output: None,
            zoom_only: false,
            progress_stride: 4096,
        }
    }
}

impl SynthesisConfig {
    /// Default reconstruction path when one is requested without a name
    pub const DEFAULT_OUTPUT: &'static str = "reconstructed.f64";

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_stride == 0 {
            return Err(ConfigError::InvalidRender {
                reason: "synthesis progress stride must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration (missing fields take defaults)
    /// * `Err(ConfigError)` - File unreadable or not valid JSON for the schema
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let contents = fs::read_to_string(&path).map_err(|err| ConfigError::ReadFailed {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let config = serde_json::from_str(&contents).map_err(|err| ConfigError::ParseFailed {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        log::info!("[Config] Loaded configuration from {}", display);
        Ok(config)
    }

    /// Structural validation of every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate()?;
        self.sweep.validate()?;
        self.transform.validate()?;
        self.signal.validate()?;
        self.synthesis.validate()?;
        Ok(())
    }
}
