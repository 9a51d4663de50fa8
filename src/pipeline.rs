//! End-to-end analysis run
//!
//! Loads or synthesizes the input, runs the parallel transform, renders the
//! spectrum raster and optionally writes the reconstruction. Every resource
//! acquired here (mapped input, mapped output) is released before returning,
//! on success and on failure alike.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::analysis::{
    CoefficientArray, FrequencySweep, InverseSynthesizer, Normalization, QuadratureKind,
    SpectrumPeak, TransformEngine, WorkerReport,
};
use crate::audio::{read_wav, SampleBuffer, ToneMix};
use crate::config::AppConfig;
use crate::error::{
    log_config_error, log_storage_error, log_transform_error, ConfigError, PipelineError,
};
use crate::render::{plot_winding, RasterSurface, RenderStats, SpectrumRenderer};

/// Summary of one run, serialized for `--report`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: String,
    pub sample_rate: u32,
    pub num_samples: usize,
    pub duration_s: f64,
    pub sweep: FrequencySweep,
    pub threads: usize,
    pub quadrature: QuadratureKind,
    pub depth: Option<usize>,
    pub normalization: Normalization,
    pub workers: Vec<WorkerReport>,
    pub transform_ms: f64,
    pub peak: Option<SpectrumPeak>,
    pub render: RenderStats,
    pub winding_hits: Option<usize>,
    pub reconstruction: Option<String>,
    pub synthesis_ms: Option<f64>,
}

/// Everything a run produces
#[derive(Debug)]
pub struct PipelineOutput {
    pub raster: RasterSurface,
    pub coefficients: CoefficientArray,
    pub report: RunReport,
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Acquire the input samples described by the signal section
fn load_input(config: &AppConfig) -> Result<(SampleBuffer, String), PipelineError> {
    let signal = &config.signal;
    let buffer = match &signal.input {
        Some(path) if is_wav(path) => read_wav(path)?,
        Some(path) => SampleBuffer::open_raw(path, signal.sample_rate)?,
        None => ToneMix::new(signal.tones.clone())
            .with_noise(signal.noise_amplitude, signal.noise_seed)
            .synthesize(signal.sample_rate, signal.duration_s)?,
    };
    let label = match &signal.input {
        Some(path) => path.display().to_string(),
        None => "synthesized".to_string(),
    };
    Ok((buffer, label))
}

/// Whether two paths name the same file
///
/// Paths that do not resolve yet (an output that is about to be created)
/// are compared as written.
fn same_file(a: &Path, b: &Path) -> bool {
    let resolve = |path: &Path| fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));
    resolve(a) == resolve(b)
}

fn log_failure(err: &PipelineError, context: &str) {
    match err {
        PipelineError::Config(err) => log_config_error(err, context),
        PipelineError::Transform(err) => log_transform_error(err, context),
        PipelineError::Storage(err) => log_storage_error(err, context),
    }
}

/// Run the full analysis described by `config`
///
/// # Errors
/// Any configuration, transform or storage failure, already logged with its
/// code before it is returned.
pub fn run_pipeline(config: &AppConfig) -> Result<PipelineOutput, PipelineError> {
    run_stages(config).inspect_err(|err| log_failure(err, "run_pipeline"))
}

fn run_stages(config: &AppConfig) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;

    if let (Some(input), Some(output)) = (&config.signal.input, &config.synthesis.output) {
        if same_file(input, output) {
            return Err(ConfigError::InvalidSignal {
                reason: format!(
                    "reconstruction output {} would overwrite the input",
                    output.display()
                ),
            }
            .into());
        }
    }

    let (input, input_label) = load_input(config)?;
    let sample_rate = input.sample_rate();
    let sweep = config
        .sweep
        .resolve(config.render.width, config.signal.default_max_freq(sample_rate))?;

    tracing::info!(
        "[Pipeline] Input {}: {} samples at {} Hz ({:.3} s)",
        input_label,
        input.len(),
        sample_rate,
        input.duration().as_secs_f64()
    );

    let engine = TransformEngine::new(sweep, &config.transform)?;
    let transformed = engine.run(input.signal())?;
    let coefficients = transformed.coefficients;

    let peak = coefficients.peak();
    match &peak {
        Some(peak) => tracing::info!(
            "[Pipeline] Peak at bin {} ({:.3} Hz), magnitude {:.6}",
            peak.bin,
            peak.frequency_hz,
            peak.magnitude
        ),
        None => tracing::warn!("[Pipeline] Spectrum is all zero"),
    }

    // Background first, spectrum composited on top.
    let render = &config.render;
    let mut raster = RasterSurface::new(render.width, render.height)?;
    let winding_hits = render
        .winding_freq
        .map(|freq| plot_winding(&mut raster, &input.signal(), freq));

    let mut renderer = SpectrumRenderer::new(render.amplification);
    if let Some(zoom) = &render.zoom {
        renderer = renderer.with_zoom(zoom.min_freq, zoom.max_freq);
    }
    let mut spectrum = RasterSurface::new(render.width, render.height)?;
    let render_stats = renderer.render(&coefficients, &mut spectrum);
    raster.overlay(&spectrum);

    let mut synthesis_ms = None;
    if let Some(path) = &config.synthesis.output {
        let started = Instant::now();
        let mut output = SampleBuffer::create_raw(path, input.len(), sample_rate)?;

        let mut synthesizer = InverseSynthesizer::new(
            config.synthesis.progress_stride,
            config.transform.report_progress,
        );
        if let (true, Some(zoom)) = (config.synthesis.zoom_only, &render.zoom) {
            synthesizer = synthesizer.with_zoom(zoom.min_freq, zoom.max_freq);
        }
        synthesizer.synthesize_into(&coefficients, output.samples_mut()?, sample_rate);
        output.release()?;

        let elapsed = started.elapsed().as_secs_f64() * 1_000.0;
        tracing::info!(
            "[Pipeline] Wrote reconstruction to {} in {:.1} ms",
            path.display(),
            elapsed
        );
        synthesis_ms = Some(elapsed);
    }

    let report = RunReport {
        input: input_label,
        sample_rate,
        num_samples: input.len(),
        duration_s: input.duration().as_secs_f64(),
        sweep,
        threads: engine.threads(),
        quadrature: engine.quadrature(),
        depth: config.transform.depth,
        normalization: config.transform.normalization,
        workers: transformed.workers,
        transform_ms: transformed.elapsed.as_secs_f64() * 1_000.0,
        peak,
        render: render_stats,
        winding_hits,
        reconstruction: config
            .synthesis
            .output
            .as_ref()
            .map(|path| path.display().to_string()),
        synthesis_ms,
    };

    input.release()?;

    Ok(PipelineOutput {
        raster,
        coefficients,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneSpec;
    use crate::config::ZoomRange;
    use crate::error::StorageError;

    fn small_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.render.width = 64;
        config.render.height = 48;
        config.signal.sample_rate = 1_000;
        config.signal.duration_s = 2.0;
        config.signal.tones = vec![ToneSpec::new(20.0)];
        config.transform.threads = 3;
        config.transform.depth = None;
        config.transform.report_progress = false;
        config
    }

    #[test]
    fn test_synthesized_run_finds_tone() {
        let output = run_pipeline(&small_config()).unwrap();

        // Default sweep: 0..40 Hz over 2 * width bins.
        assert_eq!(output.report.sweep.len(), 128);
        assert_eq!(output.report.sweep.max_freq(), 40.0);
        assert_eq!(output.report.num_samples, 2_000);
        assert_eq!(output.report.workers.len(), 3);

        let peak = output.report.peak.unwrap();
        assert!((peak.frequency_hz - 20.0).abs() <= output.report.sweep.bin_width());
        assert_eq!(output.raster.as_bytes().len(), 64 * 48 * 6);
        assert!(output.report.render.points_plotted > 0);
    }

    #[test]
    fn test_reconstruction_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rebuilt.f64");
        let mut config = small_config();
        config.synthesis.output = Some(path.clone());

        let output = run_pipeline(&config).unwrap();
        assert!(output.report.synthesis_ms.is_some());
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 2_000 * 8);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_winding_background_is_composited() {
        let mut config = small_config();
        config.render.winding_freq = Some(20.0);
        let output = run_pipeline(&config).unwrap();
        assert!(output.report.winding_hits.unwrap() > 0);
    }

    #[test]
    fn test_zoomed_render_uses_window() {
        let mut config = small_config();
        config.render.zoom = Some(ZoomRange {
            min_freq: 10.0,
            max_freq: 30.0,
        });
        let output = run_pipeline(&config).unwrap();
        let bins = output.report.render.bins_plotted;
        assert!(bins > 0 && bins < output.report.sweep.len());
    }

    #[test]
    fn test_missing_input_is_storage_error() {
        let mut config = small_config();
        config.signal.input = Some("/no/such/samples.f64".into());
        let err = run_pipeline(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Storage(StorageError::OpenFailed { .. })
        ));
    }

    fn assert_alias_rejected(input: &Path, output: &Path) {
        let original = std::fs::read(input).unwrap();
        let mut config = small_config();
        config.signal.input = Some(input.to_path_buf());
        config.synthesis.output = Some(output.to_path_buf());
        assert!(matches!(
            run_pipeline(&config),
            Err(PipelineError::Config(ConfigError::InvalidSignal { .. }))
        ));
        assert_eq!(std::fs::read(input).unwrap(), original);
    }

    #[test]
    fn test_output_may_not_alias_input_through_parent_segment() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.f64");
        let bytes: Vec<u8> = [0.25f64, -0.5, 1.0].iter().flat_map(|s| s.to_ne_bytes()).collect();
        std::fs::write(&input, bytes).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert_alias_rejected(&input, &dir.path().join("sub").join("..").join("in.f64"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_may_not_alias_input_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.f64");
        std::fs::write(&input, 0.5f64.to_ne_bytes()).unwrap();
        let link = dir.path().join("link.f64");
        std::os::unix::fs::symlink(&input, &link).unwrap();

        assert_alias_rejected(&input, &link);
    }

    #[test]
    fn test_output_may_not_alias_input() {
        let mut config = small_config();
        config.signal.input = Some("same.f64".into());
        config.synthesis.output = Some("same.f64".into());
        assert!(matches!(
            run_pipeline(&config),
            Err(PipelineError::Config(ConfigError::InvalidSignal { .. }))
        ));
    }
}
