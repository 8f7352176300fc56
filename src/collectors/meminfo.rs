use indexmap::IndexMap;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Seek};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Labels read on every sampling pass, in the order they appear in `/proc/meminfo`.
pub const MEMINFO_LABELS: [&str; 6] = [
    "MemTotal",
    "MemFree",
    "Buffers",
    "Cached",
    "SwapTotal",
    "SwapFree",
];

/// Label -> kilobytes, in source order.
pub type RawFields = IndexMap<String, u64>;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("the file {0} does not exist")]
    NotFound(PathBuf),

    #[error("you do not have permissions to read {0}")]
    PermissionDenied(PathBuf),

    #[error("cannot open {path}: error {errno}")]
    Other {
        path: PathBuf,
        errno: i32,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
            _ => FileError::Other {
                path: path.to_path_buf(),
                errno: err.raw_os_error().unwrap_or(0),
                source: err,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("field {0} not found before end of input")]
    NotFound(String),

    #[error("field {label} has no numeric value: {line:?}")]
    Malformed { label: String, line: String },

    #[error("read error")]
    ReadError(#[from] io::Error),

    #[error("source is closed")]
    Closed,
}

/// Runs `op` until it returns something other than `ErrorKind::Interrupted`.
fn retry_interrupted<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match op() {
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                debug!("Interrupted, retrying");
                continue;
            }
            other => return other,
        }
    }
}

/// Line-oriented access to a `<Label>: <value> kB` statistics source.
///
/// The file is opened once and rewound at the start of every pass, so a
/// virtual file such as `/proc/meminfo` is regenerated by the kernel on
/// each read.
#[derive(Debug)]
pub struct MeminfoReader {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    line: Vec<u8>,
}

impl MeminfoReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        debug!("Opening {}", path.display());
        let file = retry_interrupted(|| File::open(path)).map_err(|e| FileError::from_io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(BufReader::new(file)),
            line: Vec::with_capacity(256),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed {}", self.path.display());
        }
    }

    /// Seeks back to the start of the source, discarding buffered data.
    pub fn rewind(&mut self) -> Result<(), FieldError> {
        let reader = self.reader.as_mut().ok_or(FieldError::Closed)?;
        retry_interrupted(|| reader.rewind())?;
        Ok(())
    }

    /// Scans forward from the current position for the first line containing
    /// `label` and returns its second whitespace-delimited token.
    pub fn scan_field(&mut self, label: &str) -> Result<u64, FieldError> {
        let reader = self.reader.as_mut().ok_or(FieldError::Closed)?;
        loop {
            self.line.clear();
            let read = retry_interrupted(|| reader.read_until(b'\n', &mut self.line))?;
            if read == 0 {
                return Err(FieldError::NotFound(label.to_string()));
            }
            // Lines are not required to be UTF-8; only the label and value matter.
            let line = String::from_utf8_lossy(&self.line);
            if !line.contains(label) {
                continue;
            }
            return line
                .split_whitespace()
                .nth(1)
                .and_then(|token| token.parse::<u64>().ok())
                .ok_or_else(|| FieldError::Malformed {
                    label: label.to_string(),
                    line: line.trim_end().to_string(),
                });
        }
    }

    /// Rewinds, then looks up a single field.
    pub fn read_field(&mut self, label: &str) -> Result<u64, FieldError> {
        self.rewind()?;
        self.scan_field(label)
    }

    /// One full pass over the source collecting every label in [`MEMINFO_LABELS`].
    ///
    /// Fields are looked up scanning forward; a label that is not found before
    /// end of input triggers one full re-scan from the top before giving up.
    pub fn read_all_fields(&mut self) -> Result<RawFields, FieldError> {
        let start = Instant::now();
        self.rewind()?;

        let mut fields = RawFields::with_capacity(MEMINFO_LABELS.len());
        for label in MEMINFO_LABELS {
            let value = match self.scan_field(label) {
                Err(FieldError::NotFound(_)) => {
                    debug!("{label} not found scanning forward, re-scanning {}", self.path.display());
                    self.read_field(label)?
                }
                other => other?,
            };
            fields.insert(label.to_string(), value);
        }

        debug!("read_all_fields took: {} us", start.elapsed().as_micros());
        Ok(fields)
    }
}

impl Drop for MeminfoReader {
    fn drop(&mut self) {
        self.close();
    }
}
