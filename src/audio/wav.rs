// Wav module - WAV decoding into a mono f64 sample buffer

use std::path::Path;

use super::buffer::SampleBuffer;
use crate::error::StorageError;

fn decode_error(path: &Path, reason: impl ToString) -> StorageError {
    StorageError::DecodeFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read a WAV file, mixing multichannel audio down to mono
///
/// Integer formats are scaled to [-1, 1]; the file's own sample rate is kept.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, StorageError> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path).map_err(|err| match err {
        hound::Error::IoError(io) => StorageError::OpenFailed {
            path: path.display().to_string(),
            reason: io.to_string(),
        },
        other => decode_error(path, other),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(decode_error(path, "zero channels"));
    }
    if spec.sample_rate == 0 {
        return Err(decode_error(path, "zero sample rate"));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from).map_err(|err| decode_error(path, err)))
            .collect::<Result<Vec<f64>, _>>()?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !(1..=32).contains(&bits) {
                return Err(decode_error(
                    path,
                    format!("unsupported bits_per_sample={}", bits),
                ));
            }
            let full_scale = (1u64 << (bits - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|v| v as f64 / full_scale)
                        .map_err(|err| decode_error(path, err))
                })
                .collect::<Result<Vec<f64>, _>>()?
        }
    };

    let channels = spec.channels as usize;
    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
            .collect()
    };

    log::info!(
        "[Wav] Decoded {} mono samples at {} Hz from {} ({} channels)",
        mono.len(),
        spec.sample_rate,
        path.display(),
        spec.channels
    );

    Ok(SampleBuffer::from_vec(mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in frames {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_reads_mono_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, 16_384, -16_384]);

        let buffer = read_wav(&path).unwrap();
        assert_eq!(buffer.sample_rate(), 8_000);
        assert_eq!(buffer.samples(), &[0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_stereo_is_mixed_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[16_384, 0, -16_384, -16_384]);

        let buffer = read_wav(&path).unwrap();
        assert_eq!(buffer.samples(), &[0.25, -0.5]);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = read_wav("/no/such/file.wav").unwrap_err();
        assert!(matches!(err, StorageError::OpenFailed { .. }));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not RIFF").unwrap();
        let err = read_wav(&path).unwrap_err();
        assert!(matches!(err, StorageError::DecodeFailed { .. }));
    }
}
