//! BA2 archive reader and writer.
//!
//! BA2 is the flat-table archive introduced with Fallout 4: a fixed header,
//! a run of 36-byte file records, file data, and a name table of
//! length-prefixed strings at the offset declared in the header. Only the
//! general (`GNRL`) format is handled; any other format tag fails before a
//! single file record is read.

use veles_common::{compress, ByteCursor, ByteWriter};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::storage::ArchiveData;
use crate::{Error, Result};

const HEADER_SIZE: u64 = 24;
const FILE_RECORD_SIZE: u64 = 36;

/// BA2 header (without the 4-byte magic).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Ba2Header {
    /// Container version.
    pub version: u32,
    /// Format tag: `GNRL` for general archives, `DX10` for textures.
    pub format: [u8; 4],
    /// Number of file records.
    pub file_count: u32,
    /// Absolute offset of the name table.
    pub nametable_offset: u64,
}

impl Ba2Header {
    /// BA2 magic bytes.
    pub const MAGIC: [u8; 4] = *b"BTDX";
    /// General-archive format tag.
    pub const FORMAT_GENERAL: [u8; 4] = *b"GNRL";
}

/// Fixed-size BA2 file record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Ba2FileRecord {
    /// Hash of the file name (without extension).
    pub name_hash: u32,
    /// File extension, null-padded.
    pub ext: [u8; 4],
    /// Hash of the directory part.
    pub dir_hash: u32,
    /// Per-entry flags, preserved verbatim.
    pub flags: u32,
    /// Absolute offset of the data block.
    pub offset: u64,
    /// Stored (possibly compressed) size; 0 means stored raw at full size.
    pub packed_size: u32,
    /// Uncompressed size.
    pub unpacked_size: u32,
    /// Alignment field, preserved verbatim.
    pub align: u32,
}

impl Ba2FileRecord {
    /// Stored byte length of the data block.
    pub fn stored_len(&self) -> u32 {
        let (packed, unpacked) = (self.packed_size, self.unpacked_size);
        if packed == 0 {
            unpacked
        } else {
            packed
        }
    }

    /// Whether the stored bytes are compressed.
    pub fn is_compressed(&self) -> bool {
        let (packed, unpacked) = (self.packed_size, self.unpacked_size);
        packed != 0 && packed != unpacked
    }
}

/// A file entry: the fixed record plus its name-table name.
#[derive(Debug, Clone)]
pub struct Ba2File {
    /// Fixed on-disk record.
    pub record: Ba2FileRecord,
    /// Full path from the name table.
    pub name: String,
}

/// An opened BA2 general archive.
pub struct Ba2 {
    data: ArchiveData,
    name: String,
    header: Ba2Header,
    files: Vec<Ba2File>,
}

impl Ba2 {
    /// Open and parse a BA2 archive from disk.
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

    /// Parse a BA2 archive held in memory.
    pub fn from_vec(bytes: Vec<u8>, name: impl Into<String>) -> Result<Self> {
        Self::from_data(ArchiveData::Owned(bytes), name.into())
    }

    fn from_data(data: ArchiveData, name: String) -> Result<Self> {
        let (header, files) = Self::parse(&data)?;
        Ok(Self {
            data,
            name,
            header,
            files,
        })
    }

    /// Archive file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed header.
    pub fn header(&self) -> &Ba2Header {
        &self.header
    }

    /// File entries in record order.
    pub fn files(&self) -> &[Ba2File] {
        &self.files
    }

    fn parse(data: &[u8]) -> Result<(Ba2Header, Vec<Ba2File>)> {
        let mut cur = ByteCursor::new(data);
        cur.expect_magic(&Ba2Header::MAGIC)?;
        let header: Ba2Header = cur.read_struct()?;
        let format = header.format;
        if format != Ba2Header::FORMAT_GENERAL {
            return Err(Error::UnsupportedFormat(format));
        }

        let file_count = header.file_count as usize;
        let mut records = Vec::with_capacity(file_count);
        for _ in 0..file_count {
            records.push(cur.read_struct::<Ba2FileRecord>()?);
        }

        // Names stream from the table in file-record order.
        let mut names = ByteCursor::new(data);
        names.seek(header.nametable_offset as usize);
        let mut files = Vec::with_capacity(file_count);
        for record in records {
            let name = names.read_wstring()?.to_string();
            files.push(Ba2File { record, name });
        }

        Ok((header, files))
    }

    /// Find an entry by its full path (case-insensitive, either separator).
    pub fn find(&self, path: &str) -> Option<usize> {
        let normalized = path.replace('/', "\\");
        self.files
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(&normalized))
    }

    /// Read (and if needed decompress) an entry by index.
    pub fn read(&self, index: usize) -> Result<Vec<u8>> {
        let file = self
            .files
            .get(index)
            .ok_or_else(|| Error::EntryNotFound(format!("file #{index}")))?;
        self.read_record(&file.record)
    }

    /// Read an entry by path.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let index = self
            .find(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))?;
        self.read(index)
    }

    fn read_record(&self, record: &Ba2FileRecord) -> Result<Vec<u8>> {
        let offset = record.offset as usize;
        let len = record.stored_len() as usize;
        if offset + len > self.data.len() {
            return Err(Error::DataOutOfBounds {
                offset: record.offset,
                len: len as u64,
                archive_len: self.data.len() as u64,
            });
        }

        let stored = &self.data[offset..offset + len];
        if record.is_compressed() {
            Ok(compress::decompress_zlib(stored, record.unpacked_size as usize)?)
        } else {
            Ok(stored.to_vec())
        }
    }

    /// Read several entries in parallel over the shared mapping.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self, indices: &[usize]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        indices.par_iter().map(|&i| self.read(i)).collect()
    }

    /// Serialize in canonical layout: header, file records, data blocks in
    /// record order, name table last. Stored payload bytes are copied
    /// verbatim; offsets and the name-table offset are recomputed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data_offset = HEADER_SIZE + FILE_RECORD_SIZE * self.files.len() as u64;
        let mut offsets = Vec::with_capacity(self.files.len());
        for file in &self.files {
            offsets.push(data_offset);
            data_offset += u64::from(file.record.stored_len());
        }
        let nametable_offset = data_offset;

        let mut out = ByteWriter::with_capacity(self.data.len());
        out.write_bytes(&Ba2Header::MAGIC);
        out.write_struct(&Ba2Header {
            version: self.header.version,
            format: self.header.format,
            file_count: self.files.len() as u32,
            nametable_offset,
        });

        for (file, offset) in self.files.iter().zip(&offsets) {
            let mut record = file.record;
            record.offset = *offset;
            out.write_struct(&record);
        }

        for file in &self.files {
            let offset = file.record.offset as usize;
            let len = file.record.stored_len() as usize;
            if offset + len > self.data.len() {
                return Err(Error::DataOutOfBounds {
                    offset: file.record.offset,
                    len: len as u64,
                    archive_len: self.data.len() as u64,
                });
            }
            out.write_bytes(&self.data[offset..offset + len]);
        }

        for file in &self.files {
            out.write_wstring(&file.name);
        }

        Ok(out.into_vec())
    }
}

impl std::fmt::Debug for Ba2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ba2")
            .field("name", &self.name)
            .field("files", &self.files.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veles_common::compress::compress_zlib;

    const RAW: &[u8] = b"interface swf bytes";
    const BIG: &[u8] = b"repetitive payload repetitive payload repetitive payload";

    fn build_fixture() -> Vec<u8> {
        let packed = compress_zlib(BIG).unwrap();
        let data_start = HEADER_SIZE + 2 * FILE_RECORD_SIZE;
        let nametable_offset = data_start + RAW.len() as u64 + packed.len() as u64;

        let mut w = ByteWriter::new();
        w.write_bytes(&Ba2Header::MAGIC);
        w.write_struct(&Ba2Header {
            version: 1,
            format: Ba2Header::FORMAT_GENERAL,
            file_count: 2,
            nametable_offset,
        });
        w.write_struct(&Ba2FileRecord {
            name_hash: 0x1111_1111,
            ext: *b"swf\0",
            dir_hash: 0x2222_2222,
            flags: 0x0010_0100,
            offset: data_start,
            packed_size: 0,
            unpacked_size: RAW.len() as u32,
            align: 4096,
        });
        w.write_struct(&Ba2FileRecord {
            name_hash: 0x3333_3333,
            ext: *b"nif\0",
            dir_hash: 0x4444_4444,
            flags: 0x0010_0100,
            offset: data_start + RAW.len() as u64,
            packed_size: packed.len() as u32,
            unpacked_size: BIG.len() as u32,
            align: 4096,
        });
        w.write_bytes(RAW);
        w.write_bytes(&packed);
        w.write_wstring("interface\\main.swf");
        w.write_wstring("meshes\\chair.nif");
        w.into_vec()
    }

    #[test]
    fn parses_records_and_names() {
        let ba2 = Ba2::from_vec(build_fixture(), "test.ba2").unwrap();
        assert_eq!(ba2.files().len(), 2);
        assert_eq!(ba2.files()[0].name, "interface\\main.swf");
        assert_eq!(ba2.files()[1].name, "meshes\\chair.nif");
        assert!(!ba2.files()[0].record.is_compressed());
        assert!(ba2.files()[1].record.is_compressed());
    }

    #[test]
    fn reads_raw_and_compressed_entries() {
        let ba2 = Ba2::from_vec(build_fixture(), "test.ba2").unwrap();
        assert_eq!(ba2.read_file("interface/main.swf").unwrap(), RAW);
        assert_eq!(ba2.read_file("meshes/chair.nif").unwrap(), BIG);
    }

    #[test]
    fn round_trips_byte_identically() {
        let bytes = build_fixture();
        let ba2 = Ba2::from_vec(bytes.clone(), "test.ba2").unwrap();
        assert_eq!(ba2.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn unknown_format_fails_before_records() {
        let mut bytes = build_fixture();
        bytes[8..12].copy_from_slice(b"DX10");
        match Ba2::from_vec(bytes, "tex.ba2") {
            Err(Error::UnsupportedFormat(tag)) => assert_eq!(&tag, b"DX10"),
            other => panic!("expected format error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn truncated_name_table_is_a_bounds_error() {
        let mut bytes = build_fixture();
        bytes.truncate(bytes.len() - 4);
        assert!(Ba2::from_vec(bytes, "test.ba2").is_err());
    }
}
