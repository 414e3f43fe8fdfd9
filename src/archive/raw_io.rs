//! Raw I/O mapper: read-only memory mapping of
//! input files, with zero-copy views into the mapped region.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::driver::error::SlbtError;

/// A mapped region. A zero-size input yields an empty view rather than a
/// mapped region, since `mmap` itself rejects zero-length mappings.
pub enum RawMap {
    Empty,
    ReadOnly(Mmap),
}

impl RawMap {
    /// Map `path` read-only. Opens with close-on-exec semantics (the
    /// default for freshly opened descriptors on process-spawn-free
    /// paths, since we never inherit file descriptors across `exec`
    /// without explicit inheritance), stats, maps private, then closes
    /// the descriptor — the mapping keeps the pages resident.
    pub fn open_read(path: &Path) -> Result<RawMap, SlbtError> {
        let file =
            File::open(path).map_err(|e| SlbtError::system("archive::raw_io::open_read", e))?;
        Self::map_read_fd(&file)
    }

    /// Map an already-open descriptor read-only. The caller retains
    /// ownership of `file`; it is not closed by this call.
    pub fn map_read_fd(file: &File) -> Result<RawMap, SlbtError> {
        let len = file
            .metadata()
            .map_err(|e| SlbtError::system("archive::raw_io::map_read_fd", e))?
            .len();
        if len == 0 {
            return Ok(RawMap::Empty);
        }
        let mmap = unsafe { Mmap::map(file) }
            .map_err(|e| SlbtError::system("archive::raw_io::map_read_fd", e))?;
        Ok(RawMap::ReadOnly(mmap))
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            RawMap::Empty => &[],
            RawMap::ReadOnly(m) => m,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Unmap happens implicitly on drop of the underlying `Mmap`; a
// caller-provided descriptor (passed to `map_read_fd`) is never closed by
// this module since the caller retained ownership of it.
