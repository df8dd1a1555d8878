use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{IoSink, IoSource};

/// A serial device node (or capture file) opened for streaming.
///
/// The port must already be configured (baud rate, raw mode) by whoever
/// owns it; this type only moves bytes.
#[derive(Debug)]
pub struct DeviceFile {
    file: File,
    path: PathBuf,
}

impl DeviceFile {
    /// Open `path` for reading and writing.
    ///
    /// Accepts character devices and regular files. Directories, sockets and
    /// FIFOs are rejected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let metadata = std::fs::metadata(&path).map_err(|e| TransportError::Open {
            path: path.clone(),
            source: e,
        })?;
        if !is_streamable(&metadata) {
            return Err(TransportError::NotADevice { path });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        info!(?path, "opened device file");
        Ok(Self { file, path })
    }

    /// Split into independent write and read halves.
    pub fn split(self) -> Result<(IoSink<File>, IoSource<File>)> {
        let reader = self.file.try_clone()?;
        debug!(path = ?self.path, "split device file");
        Ok((IoSink::new(self.file), IoSource::new(reader)))
    }

    /// The path this device was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn is_streamable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;

    let file_type = metadata.file_type();
    file_type.is_char_device() || file_type.is_file()
}

#[cfg(not(unix))]
fn is_streamable(metadata: &std::fs::Metadata) -> bool {
    metadata.is_file()
}
