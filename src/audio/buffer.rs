// Buffer module - sample storage with an optional memory-mapped backing file
//
// A SampleBuffer owns its samples in one of three ways:
// - Owned: a heap vector (synthesized or decoded input)
// - Mapped: a read-only map of a raw native-endian f64 file
// - MappedMut: a writable map of a freshly created output file
//
// Writable maps flush to their file on release. Release happens either
// explicitly through `release()` (errors surface) or on drop (errors logged),
// so the mapping is synced and unmapped on every exit path.

use std::fs::{File, OpenOptions};
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::time::Duration;

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::analysis::Signal;
use crate::error::{log_storage_error, StorageError};

const SAMPLE_BYTES: usize = size_of::<f64>();

enum Backing {
    Owned(Vec<f64>),
    Mapped { map: Mmap, len: usize },
    MappedMut { map: MmapMut },
}

/// Fixed-length run of `f64` samples at a known sample rate
pub struct SampleBuffer {
    backing: Backing,
    sample_rate: u32,
    path: Option<PathBuf>,
    flush_on_release: bool,
    released: bool,
}

impl std::fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.backing {
            Backing::Owned(_) => "owned",
            Backing::Mapped { .. } => "mapped",
            Backing::MappedMut { .. } => "mapped-mut",
        };
        f.debug_struct("SampleBuffer")
            .field("backing", &kind)
            .field("len", &self.len())
            .field("sample_rate", &self.sample_rate)
            .field("path", &self.path)
            .field("flush_on_release", &self.flush_on_release)
            .finish()
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

impl SampleBuffer {
    /// Heap buffer of `num_samples` zeros
    ///
    /// # Errors
    /// `StorageError::AllocationFailed` if the allocation is refused.
    pub fn zeroed(num_samples: usize, sample_rate: u32) -> Result<Self, StorageError> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(num_samples)
            .map_err(|_| StorageError::AllocationFailed {
                what: "sample buffer".to_string(),
                requested: num_samples,
            })?;
        samples.resize(num_samples, 0.0);
        Ok(Self::from_vec(samples, sample_rate))
    }

    /// Wrap samples that are already in memory
    pub fn from_vec(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            backing: Backing::Owned(samples),
            sample_rate,
            path: None,
            flush_on_release: false,
            released: false,
        }
    }

    /// Map a raw native-endian `f64` file read-only
    ///
    /// Trailing bytes that do not make up a whole sample are ignored.
    pub fn open_raw<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| StorageError::OpenFailed {
            path: path_string(path),
            reason: err.to_string(),
        })?;
        let bytes = file
            .metadata()
            .map_err(|err| StorageError::OpenFailed {
                path: path_string(path),
                reason: format!("stat: {}", err),
            })?
            .len() as usize;
        let len = bytes / SAMPLE_BYTES;

        if len == 0 {
            log::warn!("[SampleBuffer] {} holds no whole samples", path.display());
            let mut buffer = Self::from_vec(Vec::new(), sample_rate);
            buffer.path = Some(path.to_path_buf());
            return Ok(buffer);
        }

        // SAFETY: the file is opened read-only and only read through the map;
        // truncating it underneath us from another process would fault.
        let map = unsafe { MmapOptions::new().len(len * SAMPLE_BYTES).map(&file) }.map_err(
            |err| StorageError::MapFailed {
                path: path_string(path),
                reason: err.to_string(),
            },
        )?;
        bytemuck::try_cast_slice::<u8, f64>(&map[..]).map_err(|_| StorageError::Misaligned {
            path: path_string(path),
        })?;

        log::info!(
            "[SampleBuffer] Mapped {} samples from {}",
            len,
            path.display()
        );

        Ok(Self {
            backing: Backing::Mapped { map, len },
            sample_rate,
            path: Some(path.to_path_buf()),
            flush_on_release: false,
            released: false,
        })
    }

    /// Create (or truncate) `path`, size it for `num_samples` and map it writable
    ///
    /// The file starts zero-filled; writes through `samples_mut` land in the
    /// file and are flushed on release.
    pub fn create_raw<P: AsRef<Path>>(
        path: P,
        num_samples: usize,
        sample_rate: u32,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|err| StorageError::OpenFailed {
                path: path_string(path),
                reason: err.to_string(),
            })?;

        let bytes = num_samples
            .checked_mul(SAMPLE_BYTES)
            .ok_or_else(|| StorageError::AllocationFailed {
                what: "output sample file".to_string(),
                requested: num_samples,
            })?;
        file.set_len(bytes as u64)
            .map_err(|err| StorageError::ResizeFailed {
                path: path_string(path),
                reason: err.to_string(),
            })?;

        if num_samples == 0 {
            let mut buffer = Self::from_vec(Vec::new(), sample_rate);
            buffer.path = Some(path.to_path_buf());
            return Ok(buffer);
        }

        // SAFETY: the file was just created by us and is sized to the map.
        let map = unsafe { MmapOptions::new().len(bytes).map_mut(&file) }.map_err(|err| {
            StorageError::MapFailed {
                path: path_string(path),
                reason: err.to_string(),
            }
        })?;

        log::info!(
            "[SampleBuffer] Mapped {} output samples to {}",
            num_samples,
            path.display()
        );

        Ok(Self {
            backing: Backing::MappedMut { map },
            sample_rate,
            path: Some(path.to_path_buf()),
            flush_on_release: true,
            released: false,
        })
    }

    pub fn samples(&self) -> &[f64] {
        match &self.backing {
            Backing::Owned(samples) => samples,
            // Alignment was checked when the map was created.
            Backing::Mapped { map, len } => {
                bytemuck::try_cast_slice(&map[..len * SAMPLE_BYTES]).unwrap_or(&[])
            }
            Backing::MappedMut { map } => bytemuck::try_cast_slice(&map[..]).unwrap_or(&[]),
        }
    }

    /// Writable view of the samples
    ///
    /// # Errors
    /// `StorageError::ReadOnly` for a read-only mapped input file,
    /// `StorageError::Misaligned` if the writable map cannot be viewed as `f64`.
    pub fn samples_mut(&mut self) -> Result<&mut [f64], StorageError> {
        let path = self
            .path
            .as_deref()
            .map(path_string)
            .unwrap_or_default();
        match &mut self.backing {
            Backing::Owned(samples) => Ok(samples),
            Backing::Mapped { .. } => Err(StorageError::ReadOnly),
            Backing::MappedMut { map } => {
                bytemuck::try_cast_slice_mut(&mut map[..])
                    .map_err(|_| StorageError::Misaligned { path })
            }
        }
    }

    /// Borrow the buffer as transform input
    pub fn signal(&self) -> Signal<'_> {
        Signal::new(self.samples(), self.sample_rate)
    }

    pub fn len(&self) -> usize {
        match &self.backing {
            Backing::Owned(samples) => samples.len(),
            Backing::Mapped { len, .. } => *len,
            Backing::MappedMut { map } => map.len() / SAMPLE_BYTES,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.len() as f64 / self.sample_rate.max(1) as f64)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether writes must reach a backing file when the buffer is released
    pub fn flush_on_release(&self) -> bool {
        self.flush_on_release
    }

    fn flush_backing(&mut self) -> Result<(), StorageError> {
        if !self.flush_on_release {
            return Ok(());
        }
        if let Backing::MappedMut { map } = &self.backing {
            map.flush().map_err(|err| StorageError::FlushFailed {
                path: self.path.as_deref().map(path_string).unwrap_or_default(),
                reason: err.to_string(),
            })?;
            log::debug!("[SampleBuffer] Flushed {} bytes", map.len());
        }
        Ok(())
    }

    /// Sync any backing file and unmap
    pub fn release(mut self) -> Result<(), StorageError> {
        let result = self.flush_backing();
        self.released = true;
        result
    }
}

impl Drop for SampleBuffer {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.flush_backing() {
            log_storage_error(&err, "SampleBuffer::drop");
        }
    }
}
