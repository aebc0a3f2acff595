//! Backing storage for opened archives.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::Result;

/// Bytes backing an archive: a memory-mapped file for archives opened from
/// disk, or an owned buffer for in-memory parsing. Lazy entry reads slice
/// this region; the mapping stays open for the archive's lifetime.
pub(crate) enum ArchiveData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl ArchiveData {
    pub(crate) fn map(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(mmap))
    }
}

impl Deref for ArchiveData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(vec) => vec,
        }
    }
}
