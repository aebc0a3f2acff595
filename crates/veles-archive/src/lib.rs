//! BSA and BA2 archive reading and rewriting.
//!
//! Bethesda games ship their assets in two container families: the
//! folder-based BSA format (versions 103, 104 and 105) and the flat-table
//! BA2 format introduced with Fallout 4. This crate parses both, hands out
//! lazy per-file data (decompressing zlib or LZ4 payloads as declared), and
//! re-serializes archives in canonical layout.
//!
//! # Example
//!
//! ```no_run
//! use veles_archive::Archive;
//!
//! match Archive::open("Skyrim - Textures.bsa")? {
//!     Archive::Bsa(bsa) => {
//!         for folder in bsa.folders() {
//!             println!("{:?}: {} files", folder.name, folder.files.len());
//!         }
//!     }
//!     Archive::Ba2(ba2) => {
//!         for file in ba2.files() {
//!             println!("{}", file.name);
//!         }
//!     }
//! }
//! # Ok::<(), veles_archive::Error>(())
//! ```

mod ba2;
mod bsa;
mod error;
mod storage;

pub mod hash;

pub use ba2::{Ba2, Ba2File, Ba2FileRecord, Ba2Header};
pub use bsa::{archive_flags, Bsa, BsaFile, BsaFolder, BsaHeader, BsaVersion};
pub use bsa::{SIZE_CHECKED, SIZE_COMPRESSION_TOGGLE};
pub use error::{Error, Result};

/// The container family a byte stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Bsa,
    Ba2,
}

impl ArchiveKind {
    /// Sniff the archive kind from the first four bytes. Returns `None` for
    /// anything that is neither BSA nor BA2: no parser applies.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..4)? {
            m if m == BsaHeader::MAGIC => Some(Self::Bsa),
            m if m == Ba2Header::MAGIC => Some(Self::Ba2),
            _ => None,
        }
    }
}

/// An opened archive of either family.
#[derive(Debug)]
pub enum Archive {
    Bsa(Bsa),
    Ba2(Ba2),
}

impl Archive {
    /// Open an archive, dispatching on the magic-number sniff.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut magic = [0u8; 4];
        {
            use std::io::Read;
            let mut file = std::fs::File::open(path)?;
            file.read_exact(&mut magic)?;
        }
        match ArchiveKind::sniff(&magic) {
            Some(ArchiveKind::Bsa) => Ok(Self::Bsa(Bsa::open(path)?)),
            Some(ArchiveKind::Ba2) => Ok(Self::Ba2(Ba2::open(path)?)),
            None => Err(Error::UnrecognizedMagic(magic)),
        }
    }

    /// Parse an in-memory archive, dispatching on the magic-number sniff.
    pub fn from_vec(bytes: Vec<u8>, name: impl Into<String>) -> Result<Self> {
        match ArchiveKind::sniff(&bytes) {
            Some(ArchiveKind::Bsa) => Ok(Self::Bsa(Bsa::from_vec(bytes, name)?)),
            Some(ArchiveKind::Ba2) => Ok(Self::Ba2(Ba2::from_vec(bytes, name)?)),
            None => {
                let mut magic = [0u8; 4];
                let len = bytes.len().min(4);
                magic[..len].copy_from_slice(&bytes[..len]);
                Err(Error::UnrecognizedMagic(magic))
            }
        }
    }

    /// Archive file name.
    pub fn name(&self) -> &str {
        match self {
            Self::Bsa(bsa) => bsa.name(),
            Self::Ba2(ba2) => ba2.name(),
        }
    }

    /// Serialize back to canonical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Bsa(bsa) => bsa.to_bytes(),
            Self::Ba2(ba2) => ba2.to_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_selects_a_parser() {
        assert_eq!(ArchiveKind::sniff(b"BSA\0rest"), Some(ArchiveKind::Bsa));
        assert_eq!(ArchiveKind::sniff(b"BTDXrest"), Some(ArchiveKind::Ba2));
        assert_eq!(ArchiveKind::sniff(b"PK\x03\x04"), None);
        assert_eq!(ArchiveKind::sniff(b"BS"), None);
    }

    #[test]
    fn unrecognized_magic_yields_no_parser() {
        match Archive::from_vec(b"ELFF....".to_vec(), "weird.bin") {
            Err(Error::UnrecognizedMagic(magic)) => assert_eq!(&magic, b"ELFF"),
            other => panic!("expected magic error, got {:?}", other.map(|_| ())),
        }
    }
}
