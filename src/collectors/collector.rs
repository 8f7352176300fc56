use crate::collectors::meminfo::{FieldError, FileError, MeminfoReader};
use crate::models::{ChangeResult, MemSnapshot};
use crate::tracker::SnapshotTracker;
use humansize::{format_size, BINARY};
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("source unavailable")]
    SourceUnavailable(#[from] FileError),

    #[error("failed to read {path}")]
    SourceReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("field {label} missing from {path}")]
    FieldMissing { path: PathBuf, label: String },

    #[error("field {label} in {path} is malformed: {line:?}")]
    MalformedField {
        path: PathBuf,
        label: String,
        line: String,
    },
}

impl SampleError {
    fn from_field(path: &Path, err: FieldError) -> Self {
        match err {
            FieldError::NotFound(label) => SampleError::FieldMissing {
                path: path.to_path_buf(),
                label,
            },
            FieldError::Malformed { label, line } => SampleError::MalformedField {
                path: path.to_path_buf(),
                label,
                line,
            },
            FieldError::ReadError(source) => SampleError::SourceReadFailure {
                path: path.to_path_buf(),
                source,
            },
            FieldError::Closed => SampleError::SourceReadFailure {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotConnected, "source is closed"),
            },
        }
    }
}

/// Drives one reader and one tracker; call [`Sampler::sample`] once per tick.
#[derive(Debug)]
pub struct Sampler {
    path: PathBuf,
    reader: Option<MeminfoReader>,
    tracker: SnapshotTracker,
}

impl Sampler {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SampleError> {
        let reader = MeminfoReader::open(path.as_ref())?;
        info!("Sampling memory statistics from {}", reader.path().display());
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            reader: Some(reader),
            tracker: SnapshotTracker::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the source and folds it into the tracker.
    ///
    /// On error the last accepted snapshot is left untouched. A read failure
    /// drops the reader so the next call reopens the source.
    pub fn sample(&mut self) -> Result<ChangeResult, SampleError> {
        let start = Instant::now();

        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => {
                debug!("Reopening {}", self.path.display());
                MeminfoReader::open(&self.path)?
            }
        };
        let reader = self.reader.insert(reader);

        let raw = match reader.read_all_fields() {
            Ok(raw) => raw,
            Err(e) => {
                if matches!(e, FieldError::ReadError(_) | FieldError::Closed) {
                    self.close();
                }
                return Err(SampleError::from_field(&self.path, e));
            }
        };

        let result = self
            .tracker
            .update(&raw)
            .map_err(|e| SampleError::from_field(&self.path, e))?;

        debug!(
            "sample took: {} us, mem used {} of {}, swap used {} of {}",
            start.elapsed().as_micros(),
            format_size(result.snapshot.mem_used.saturating_mul(1024), BINARY),
            format_size(result.snapshot.mem_total.saturating_mul(1024), BINARY),
            format_size(result.snapshot.swap_used.saturating_mul(1024), BINARY),
            format_size(result.snapshot.swap_total.saturating_mul(1024), BINARY),
        );
        Ok(result)
    }

    pub fn current_snapshot(&self) -> Option<MemSnapshot> {
        self.tracker.last().copied()
    }

    pub fn close(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.close();
        }
    }
}
