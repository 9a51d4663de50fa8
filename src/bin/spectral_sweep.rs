use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use spectral_sweep::analysis::{Normalization, QuadratureKind};
use spectral_sweep::audio::ToneSpec;
use spectral_sweep::config::{AppConfig, Resolution, SynthesisConfig, ZoomRange};
use spectral_sweep::{init_logging, run_pipeline};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "spectral_sweep",
    about = "Swept-frequency spectral analysis; writes a WxH RGB16 raster to stdout"
)]
struct Cli {
    /// Raster resolution as WIDTHxHEIGHT, e.g. 1280x720
    resolution: Resolution,

    /// Worker thread count
    threads: Option<usize>,

    /// JSON configuration file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw native-endian f64 sample file, or a .wav file
    #[arg(long, env = "SPECTRAL_SWEEP_INPUT")]
    input: Option<PathBuf>,

    /// Write the reconstructed samples (raw f64) to this file
    #[arg(long, env = "SPECTRAL_SWEEP_OUTPUT")]
    output: Option<PathBuf>,

    /// Write the reconstruction even without --output (to reconstructed.f64)
    #[arg(long)]
    reconstruct: bool,

    #[arg(long)]
    min_freq: Option<f64>,

    #[arg(long)]
    max_freq: Option<f64>,

    /// Number of frequency bins (default: twice the raster width)
    #[arg(long)]
    num_freqs: Option<usize>,

    /// Lower bound of the plotted frequency window
    #[arg(long, requires = "zoom_max")]
    zoom_min: Option<f64>,

    /// Upper bound of the plotted frequency window
    #[arg(long, requires = "zoom_min")]
    zoom_max: Option<f64>,

    /// Restrict the reconstruction to the zoom window as well
    #[arg(long)]
    zoom_synthesis: bool,

    #[arg(long, value_enum)]
    quadrature: Option<QuadratureArg>,

    /// Points per worker per bin
    #[arg(long, conflicts_with = "full_depth")]
    depth: Option<usize>,

    /// Evaluate every sample of every assignment
    #[arg(long)]
    full_depth: bool,

    #[arg(long, value_enum)]
    normalization: Option<NormalizationArg>,

    /// Sample rate of raw or synthesized input
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Length of synthesized input in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Synthesized tone frequency in Hz (repeatable; replaces the defaults)
    #[arg(long = "tone")]
    tones: Vec<f64>,

    /// Uniform noise amplitude mixed into synthesized input
    #[arg(long)]
    noise: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Visual gain after per-channel normalization
    #[arg(long)]
    amplification: Option<f64>,

    /// Draw the signal's winding at this frequency behind the spectrum
    #[arg(long)]
    winding_freq: Option<f64>,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Suppress progress lines
    #[arg(long)]
    quiet: bool,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<Level>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QuadratureArg {
    PointSum,
    Trapezoidal,
}

impl From<QuadratureArg> for QuadratureKind {
    fn from(arg: QuadratureArg) -> Self {
        match arg {
            QuadratureArg::PointSum => QuadratureKind::PointSum,
            QuadratureArg::Trapezoidal => QuadratureKind::Trapezoidal,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NormalizationArg {
    Integral,
    Unscaled,
}

impl From<NormalizationArg> for Normalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::Integral => Normalization::Integral,
            NormalizationArg::Unscaled => Normalization::Unscaled,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default_level = if cli.quiet { Level::WARN } else { Level::INFO };
    init_logging(cli.log_level.unwrap_or(default_level));

    let config = build_config(&cli)?;
    config
        .validate()
        .context("invalid configuration (usage: spectral_sweep WIDTHxHEIGHT [THREADS])")?;

    let output = run_pipeline(&config).context("spectral sweep failed")?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    output
        .raster
        .write_to(&mut stdout)
        .context("writing raster to stdout")?;
    stdout.flush().context("flushing stdout")?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&output.report)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(ExitCode::from(0))
}

/// Config file (or defaults) with the command line layered on top
fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    config.render.set_resolution(cli.resolution);
    if let Some(threads) = cli.threads {
        config.transform.threads = threads;
    }

    if let Some(input) = &cli.input {
        config.signal.input = Some(input.clone());
    }
    if let Some(output) = &cli.output {
        config.synthesis.output = Some(output.clone());
    } else if cli.reconstruct && config.synthesis.output.is_none() {
        config.synthesis.output = Some(PathBuf::from(SynthesisConfig::DEFAULT_OUTPUT));
    }

    if let Some(min_freq) = cli.min_freq {
        config.sweep.min_freq = min_freq;
    }
    if cli.max_freq.is_some() {
        config.sweep.max_freq = cli.max_freq;
    }
    if cli.num_freqs.is_some() {
        config.sweep.num_freqs = cli.num_freqs;
    }
    if let (Some(min_freq), Some(max_freq)) = (cli.zoom_min, cli.zoom_max) {
        config.render.zoom = Some(ZoomRange { min_freq, max_freq });
    }
    if cli.zoom_synthesis {
        config.synthesis.zoom_only = true;
    }

    if let Some(kind) = cli.quadrature {
        config.transform.quadrature = kind.into();
    }
    if cli.full_depth {
        config.transform.depth = None;
    } else if cli.depth.is_some() {
        config.transform.depth = cli.depth;
    }
    if let Some(normalization) = cli.normalization {
        config.transform.normalization = normalization.into();
    }
    if cli.quiet {
        config.transform.report_progress = false;
    }

    if let Some(sample_rate) = cli.sample_rate {
        config.signal.sample_rate = sample_rate;
    }
    if let Some(duration) = cli.duration {
        config.signal.duration_s = duration;
    }
    if !cli.tones.is_empty() {
        config.signal.tones = cli.tones.iter().copied().map(ToneSpec::new).collect();
    }
    if let Some(noise) = cli.noise {
        config.signal.noise_amplitude = noise;
    }
    if let Some(seed) = cli.seed {
        config.signal.noise_seed = seed;
    }

    if let Some(amplification) = cli.amplification {
        config.render.amplification = amplification;
    }
    if cli.winding_freq.is_some() {
        config.render.winding_freq = cli.winding_freq;
    }

    Ok(config)
}
