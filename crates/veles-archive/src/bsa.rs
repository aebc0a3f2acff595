//! BSA archive reader and writer.
//!
//! BSA is the folder-based archive used by versions 103 (Oblivion), 104
//! (Fallout 3 / Skyrim LE) and 105 (Skyrim SE). The directory is a table of
//! folder records followed by per-folder file-record blocks and an optional
//! file-name table; file data sits behind the directory and may be
//! zlib-compressed (v103/v104) or LZ4-frame-compressed (v105).

use veles_common::{compress, ByteCursor, ByteWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::hash;
use crate::storage::ArchiveData;
use crate::{Error, Result};

/// BSA archive flag bits.
pub mod archive_flags {
    /// Folder names are present in the directory.
    pub const INCLUDE_DIRECTORY_NAMES: u32 = 1 << 0;
    /// A file-name table follows the directory.
    pub const INCLUDE_FILE_NAMES: u32 = 1 << 1;
    /// File data is compressed unless an entry toggles it off.
    pub const COMPRESSED: u32 = 1 << 2;
    /// Each data block starts with the entry's full path.
    pub const EMBEDDED_FILE_NAMES: u32 = 1 << 8;
}

/// Bit 30 of a file record's size flips the entry's compression state
/// relative to the archive-wide flag.
pub const SIZE_COMPRESSION_TOGGLE: u32 = 1 << 30;
/// Bit 31 is a runtime marker and carries no size information.
pub const SIZE_CHECKED: u32 = 1 << 31;

const SIZE_MASK: u32 = !(SIZE_COMPRESSION_TOGGLE | SIZE_CHECKED);
const HEADER_SIZE: u32 = 36;

/// BSA header (without the 4-byte magic).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BsaHeader {
    /// Format version: 103, 104 or 105.
    pub version: u32,
    /// Offset of the folder-record table (always 36).
    pub folder_offset: u32,
    /// Archive flag bits, see [`archive_flags`].
    pub archive_flags: u32,
    /// Number of folder records.
    pub folder_count: u32,
    /// Total number of file records across all folders.
    pub file_count: u32,
    /// Total length of all folder names including their null terminators.
    pub total_foldername_len: u32,
    /// Total length of all file names including their null terminators.
    pub total_filename_len: u32,
    /// Content type bits (meshes, textures, ...), preserved verbatim.
    pub file_flags: u16,
    /// Header padding.
    pub padding: u16,
}

impl BsaHeader {
    /// BSA magic bytes.
    pub const MAGIC: [u8; 4] = *b"BSA\0";

    pub fn directory_names(&self) -> bool {
        self.archive_flags & archive_flags::INCLUDE_DIRECTORY_NAMES != 0
    }

    pub fn file_names(&self) -> bool {
        self.archive_flags & archive_flags::INCLUDE_FILE_NAMES != 0
    }

    pub fn compressed(&self) -> bool {
        self.archive_flags & archive_flags::COMPRESSED != 0
    }

    pub fn embedded_names(&self) -> bool {
        self.archive_flags & archive_flags::EMBEDDED_FILE_NAMES != 0
    }
}

/// Supported BSA versions. The folder-record offset field widens from 32 to
/// 64 bits in v105, which also switches the compression scheme to LZ4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsaVersion {
    V103,
    V104,
    V105,
}

impl BsaVersion {
    fn from_u32(value: u32) -> Result<Self> {
        match value {
            103 => Ok(Self::V103),
            104 => Ok(Self::V104),
            105 => Ok(Self::V105),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    fn as_u32(self) -> u32 {
        match self {
            Self::V103 => 103,
            Self::V104 => 104,
            Self::V105 => 105,
        }
    }

    fn folder_record_size(self) -> u32 {
        match self {
            Self::V103 | Self::V104 => 16,
            Self::V105 => 24,
        }
    }
}

/// A file record within a folder.
#[derive(Debug, Clone)]
pub struct BsaFile {
    /// Name hash.
    pub hash: u64,
    /// Name resolved from the name table, if the archive carries one.
    pub name: Option<String>,
    /// Raw size field including the toggle and marker bits.
    pub size: u32,
    /// Absolute offset of the data block.
    pub offset: u32,
}

impl BsaFile {
    /// Stored byte length of the data block.
    pub fn data_len(&self) -> u32 {
        self.size & SIZE_MASK
    }

    /// Whether bit 30 flips this entry's compression state.
    pub fn compression_toggled(&self) -> bool {
        self.size & SIZE_COMPRESSION_TOGGLE != 0
    }
}

/// A folder record with its file records.
#[derive(Debug, Clone)]
pub struct BsaFolder {
    /// Name hash.
    pub hash: u64,
    /// Folder name, if the archive includes directory names.
    pub name: Option<String>,
    /// Files in directory order.
    pub files: Vec<BsaFile>,
}

/// An opened BSA archive. The directory is parsed eagerly; file data is read
/// lazily from the backing storage.
pub struct Bsa {
    data: ArchiveData,
    name: String,
    header: BsaHeader,
    version: BsaVersion,
    folders: Vec<BsaFolder>,
}

impl Bsa {
    /// Open and parse a BSA archive from disk.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = ArchiveData::map(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Self::from_data(data, name)
    }

    /// Parse a BSA archive held in memory.
    pub fn from_vec(bytes: Vec<u8>, name: impl Into<String>) -> Result<Self> {
        Self::from_data(ArchiveData::Owned(bytes), name.into())
    }

    fn from_data(data: ArchiveData, name: String) -> Result<Self> {
        let (header, version, folders) = Self::parse(&data)?;
        Ok(Self {
            data,
            name,
            header,
            version,
            folders,
        })
    }

    /// Archive file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed header.
    pub fn header(&self) -> &BsaHeader {
        &self.header
    }

    /// Format version.
    pub fn version(&self) -> BsaVersion {
        self.version
    }

    /// Folders in directory order.
    pub fn folders(&self) -> &[BsaFolder] {
        &self.folders
    }

    /// Total number of file entries.
    pub fn file_count(&self) -> usize {
        self.folders.iter().map(|f| f.files.len()).sum()
    }

    fn parse(data: &[u8]) -> Result<(BsaHeader, BsaVersion, Vec<BsaFolder>)> {
        let mut cur = ByteCursor::new(data);
        cur.expect_magic(&BsaHeader::MAGIC)?;
        let header: BsaHeader = cur.read_struct()?;
        let version = BsaVersion::from_u32(header.version)?;

        let folder_count = header.folder_count as usize;
        let mut folders = Vec::with_capacity(folder_count);
        let mut counts = Vec::with_capacity(folder_count);
        for _ in 0..folder_count {
            let hash = cur.read_u64()?;
            counts.push(cur.read_u32()? as usize);
            match version {
                BsaVersion::V103 | BsaVersion::V104 => {
                    let _offset = cur.read_u32()?;
                }
                BsaVersion::V105 => {
                    let _padding = cur.read_u32()?;
                    let _offset = cur.read_u64()?;
                }
            }
            folders.push(BsaFolder {
                hash,
                name: None,
                files: Vec::new(),
            });
        }

        // File-record blocks follow the folder table in folder order.
        for (folder, count) in folders.iter_mut().zip(counts) {
            if header.directory_names() {
                folder.name = Some(cur.read_bzstring()?.to_string());
            }
            for _ in 0..count {
                let hash = cur.read_u64()?;
                let size = cur.read_u32()?;
                let offset = cur.read_u32()?;
                folder.files.push(BsaFile {
                    hash,
                    name: None,
                    size,
                    offset,
                });
            }
        }

        // The name table assigns names to file records in read order.
        if header.file_names() {
            for folder in &mut folders {
                for file in &mut folder.files {
                    file.name = Some(cur.read_zstring()?.to_string());
                }
            }
        }

        Ok((header, version, folders))
    }

    /// Find an entry by folder and file name. Falls back to hash lookup when
    /// the archive was written without names.
    pub fn find(&self, folder: &str, file: &str) -> Option<(usize, usize)> {
        let folder_norm = folder.replace('/', "\\");
        let dir_hash = hash::hash_directory(folder);
        let file_hash = hash::hash_file(file);

        let fi = self.folders.iter().position(|f| match &f.name {
            Some(name) => name.eq_ignore_ascii_case(&folder_norm),
            None => f.hash == dir_hash,
        })?;
        let gi = self.folders[fi].files.iter().position(|f| match &f.name {
            Some(name) => name.eq_ignore_ascii_case(file),
            None => f.hash == file_hash,
        })?;
        Some((fi, gi))
    }

    /// Read (and if needed decompress) an entry's data.
    pub fn read(&self, folder_index: usize, file_index: usize) -> Result<Vec<u8>> {
        let folder = self
            .folders
            .get(folder_index)
            .ok_or_else(|| Error::EntryNotFound(format!("folder #{folder_index}")))?;
        let file = folder
            .files
            .get(file_index)
            .ok_or_else(|| Error::EntryNotFound(format!("file #{file_index}")))?;
        self.read_record(file)
    }

    /// Read an entry located by [`find`](Self::find).
    pub fn read_file(&self, folder: &str, file: &str) -> Result<Vec<u8>> {
        let (fi, gi) = self
            .find(folder, file)
            .ok_or_else(|| Error::EntryNotFound(format!("{folder}\\{file}")))?;
        self.read(fi, gi)
    }

    fn read_record(&self, file: &BsaFile) -> Result<Vec<u8>> {
        let offset = file.offset as usize;
        let len = file.data_len() as usize;
        if offset + len > self.data.len() {
            return Err(Error::DataOutOfBounds {
                offset: file.offset as u64,
                len: len as u64,
                archive_len: self.data.len() as u64,
            });
        }

        let mut cur = ByteCursor::new(&self.data[offset..offset + len]);
        if self.header.embedded_names() {
            let _path = cur.read_bstring()?;
        }

        let compressed = self.header.compressed() ^ file.compression_toggled();
        if !compressed {
            return Ok(cur.remaining_bytes().to_vec());
        }

        let real_size = cur.read_u32()? as usize;
        let payload = cur.remaining_bytes();
        let out = match self.version {
            BsaVersion::V105 => compress::decompress_lz4(payload, real_size)?,
            _ => compress::decompress_zlib(payload, real_size)?,
        };
        Ok(out)
    }

    /// Read several entries in parallel. Each entry decompresses
    /// independently over the shared read-only mapping.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self, entries: &[(usize, usize)]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        entries
            .par_iter()
            .map(|&(fi, gi)| self.read(fi, gi))
            .collect()
    }

    /// Serialize the archive in canonical layout: header, folder records,
    /// folder names with file records, name table, then data blocks in
    /// directory order. Stored payload bytes are copied verbatim, so an
    /// archive already in this layout round-trips byte-identically.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let folder_count = self.folders.len() as u32;
        let file_count = self.file_count() as u32;
        let total_foldername_len: u32 = self
            .folders
            .iter()
            .filter_map(|f| f.name.as_ref())
            .map(|n| n.len() as u32 + 1)
            .sum();
        let total_filename_len: u32 = self
            .folders
            .iter()
            .flat_map(|f| &f.files)
            .filter_map(|f| f.name.as_ref())
            .map(|n| n.len() as u32 + 1)
            .sum();

        // Per-folder file-record block offsets, then the data start.
        let mut block_offset = HEADER_SIZE + folder_count * self.version.folder_record_size();
        let mut block_offsets = Vec::with_capacity(self.folders.len());
        for folder in &self.folders {
            block_offsets.push(block_offset);
            if let Some(name) = &folder.name {
                block_offset += name.len() as u32 + 2; // bzstring: prefix + null
            }
            block_offset += folder.files.len() as u32 * 16;
        }
        let mut data_offset = block_offset + total_filename_len;

        let mut out = ByteWriter::with_capacity(self.data.len());
        out.write_bytes(&BsaHeader::MAGIC);
        out.write_struct(&BsaHeader {
            version: self.version.as_u32(),
            folder_offset: HEADER_SIZE,
            archive_flags: self.header.archive_flags,
            folder_count,
            file_count,
            total_foldername_len,
            total_filename_len,
            file_flags: self.header.file_flags,
            padding: 0,
        });

        for (folder, offset) in self.folders.iter().zip(&block_offsets) {
            out.write_u64(folder.hash);
            out.write_u32(folder.files.len() as u32);
            // The stored offset includes the file-name table length.
            let stored = u64::from(offset + total_filename_len);
            match self.version {
                BsaVersion::V103 | BsaVersion::V104 => out.write_u32(stored as u32),
                BsaVersion::V105 => {
                    out.write_u32(0);
                    out.write_u64(stored);
                }
            }
        }

        for folder in &self.folders {
            if let Some(name) = &folder.name {
                out.write_bzstring(name);
            }
            for file in &folder.files {
                out.write_u64(file.hash);
                out.write_u32(file.size);
                out.write_u32(data_offset);
                data_offset += file.data_len();
            }
        }

        for folder in &self.folders {
            for file in &folder.files {
                if let Some(name) = &file.name {
                    out.write_zstring(name);
                }
            }
        }

        for folder in &self.folders {
            for file in &folder.files {
                let offset = file.offset as usize;
                let len = file.data_len() as usize;
                if offset + len > self.data.len() {
                    return Err(Error::DataOutOfBounds {
                        offset: file.offset as u64,
                        len: len as u64,
                        archive_len: self.data.len() as u64,
                    });
                }
                out.write_bytes(&self.data[offset..offset + len]);
            }
        }

        Ok(out.into_vec())
    }
}

impl std::fmt::Debug for Bsa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bsa")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("folders", &self.folders.len())
            .field("files", &self.file_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_common::compress::{compress_lz4, compress_zlib};

    const RAW_DATA: &[u8] = b"raw texture payload";
    const PACKED_DATA: &[u8] = b"mesh payload mesh payload mesh payload";

    /// Hand-build a canonical single-folder archive with one raw and one
    /// per-entry-compressed file.
    fn build_fixture(version: BsaVersion) -> Vec<u8> {
        let folder = "textures\\architecture";
        let files = ["a.dds", "b.nif"];

        let packed = match version {
            BsaVersion::V105 => compress_lz4(PACKED_DATA).unwrap(),
            _ => compress_zlib(PACKED_DATA).unwrap(),
        };
        let block_a = RAW_DATA.to_vec();
        let mut block_b = (PACKED_DATA.len() as u32).to_le_bytes().to_vec();
        block_b.extend_from_slice(&packed);

        let total_foldername_len = folder.len() as u32 + 1;
        let total_filename_len: u32 = files.iter().map(|f| f.len() as u32 + 1).sum();
        let block_offset = HEADER_SIZE + version.folder_record_size();
        let name_table = block_offset + (folder.len() as u32 + 2) + 2 * 16;
        let data_start = name_table + total_filename_len;

        let mut w = ByteWriter::new();
        w.write_bytes(&BsaHeader::MAGIC);
        w.write_struct(&BsaHeader {
            version: version.as_u32(),
            folder_offset: HEADER_SIZE,
            archive_flags: archive_flags::INCLUDE_DIRECTORY_NAMES
                | archive_flags::INCLUDE_FILE_NAMES,
            folder_count: 1,
            file_count: 2,
            total_foldername_len,
            total_filename_len,
            file_flags: 0x0002,
            padding: 0,
        });

        w.write_u64(hash::hash_directory(folder));
        w.write_u32(2);
        let stored = u64::from(block_offset + total_filename_len);
        match version {
            BsaVersion::V105 => {
                w.write_u32(0);
                w.write_u64(stored);
            }
            _ => w.write_u32(stored as u32),
        }

        w.write_bzstring(folder);
        w.write_u64(hash::hash_file(files[0]));
        w.write_u32(block_a.len() as u32);
        w.write_u32(data_start);
        w.write_u64(hash::hash_file(files[1]));
        w.write_u32(block_b.len() as u32 | SIZE_COMPRESSION_TOGGLE);
        w.write_u32(data_start + block_a.len() as u32);

        for f in files {
            w.write_zstring(f);
        }
        w.write_bytes(&block_a);
        w.write_bytes(&block_b);
        w.into_vec()
    }

    #[test]
    fn parses_directory_and_names() {
        let bsa = Bsa::from_vec(build_fixture(BsaVersion::V104), "test.bsa").unwrap();
        assert_eq!(bsa.version(), BsaVersion::V104);
        assert_eq!(bsa.folders().len(), 1);
        let folder = &bsa.folders()[0];
        assert_eq!(folder.name.as_deref(), Some("textures\\architecture"));
        assert_eq!(folder.files.len(), 2);
        assert_eq!(folder.files[0].name.as_deref(), Some("a.dds"));
        assert_eq!(folder.files[1].name.as_deref(), Some("b.nif"));
        assert!(folder.files[1].compression_toggled());
    }

    #[test]
    fn reads_raw_and_zlib_entries() {
        let bsa = Bsa::from_vec(build_fixture(BsaVersion::V104), "test.bsa").unwrap();
        assert_eq!(bsa.read_file("textures/architecture", "a.dds").unwrap(), RAW_DATA);
        assert_eq!(bsa.read_file("textures/architecture", "b.nif").unwrap(), PACKED_DATA);
    }

    #[test]
    fn reads_lz4_entries_on_v105() {
        let bsa = Bsa::from_vec(build_fixture(BsaVersion::V105), "test.bsa").unwrap();
        assert_eq!(bsa.read_file("textures/architecture", "b.nif").unwrap(), PACKED_DATA);
    }

    #[test]
    fn round_trips_byte_identically() {
        for version in [BsaVersion::V103, BsaVersion::V104, BsaVersion::V105] {
            let bytes = build_fixture(version);
            let bsa = Bsa::from_vec(bytes.clone(), "test.bsa").unwrap();
            assert_eq!(bsa.to_bytes().unwrap(), bytes);
        }
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut bytes = build_fixture(BsaVersion::V104);
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            Bsa::from_vec(bytes, "test.bsa"),
            Err(Error::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn decoding_twice_is_structurally_equal() {
        let bytes = build_fixture(BsaVersion::V104);
        let a = Bsa::from_vec(bytes.clone(), "test.bsa").unwrap();
        let b = Bsa::from_vec(bytes, "test.bsa").unwrap();
        assert_eq!(a.folders().len(), b.folders().len());
        for (fa, fb) in a.folders().iter().zip(b.folders()) {
            assert_eq!(fa.hash, fb.hash);
            assert_eq!(fa.name, fb.name);
            assert_eq!(fa.files.len(), fb.files.len());
            for (x, y) in fa.files.iter().zip(&fb.files) {
                assert_eq!((x.hash, x.size, x.offset, &x.name), (y.hash, y.size, y.offset, &y.name));
            }
        }
    }

    #[test]
    fn hash_lookup_without_name_table() {
        // Strip the name flags so lookup must go through hashes.
        let folder = "textures\\architecture";
        let mut w = ByteWriter::new();
        w.write_bytes(&BsaHeader::MAGIC);
        w.write_struct(&BsaHeader {
            version: 104,
            folder_offset: HEADER_SIZE,
            archive_flags: 0,
            folder_count: 1,
            file_count: 1,
            total_foldername_len: 0,
            total_filename_len: 0,
            file_flags: 0,
            padding: 0,
        });
        w.write_u64(hash::hash_directory(folder));
        w.write_u32(1);
        w.write_u32(HEADER_SIZE + 16);
        let data_start = HEADER_SIZE + 16 + 16;
        w.write_u64(hash::hash_file("a.dds"));
        w.write_u32(RAW_DATA.len() as u32);
        w.write_u32(data_start);
        w.write_bytes(RAW_DATA);

        let bsa = Bsa::from_vec(w.into_vec(), "bare.bsa").unwrap();
        assert_eq!(bsa.read_file("textures/architecture", "a.dds").unwrap(), RAW_DATA);
        assert!(bsa.read_file("textures/architecture", "missing.nif").is_err());
    }
}
