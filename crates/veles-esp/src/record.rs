//! Records and groups: the entries a plugin's record tree is made of.

use veles_common::{compress, ByteCursor, ByteWriter};
use veles_papyrus::ScriptIndex;

use crate::error::{Error, Result};
use crate::field::{DecodeCtx, Field, XXXX};
use crate::formid::RemapContext;
use crate::header::{GroupHeader, RecordHeader};

/// Group code introducing a nested block of entries.
pub const GRUP: [u8; 4] = *b"GRUP";

/// A decoded record. The header id and all FormId fields are globally scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub code: [u8; 4],
    pub header: RecordHeader,
    fields: Vec<Field>,
    /// Original compressed data block, re-emitted verbatim while the fields
    /// are untouched so unedited records round-trip byte for byte.
    compressed_blob: Option<Vec<u8>>,
}

impl Record {
    /// Build a record from scratch.
    pub fn new(code: [u8; 4], header: RecordHeader, fields: Vec<Field>) -> Self {
        Self {
            code,
            header,
            fields,
            compressed_blob: None,
        }
    }

    pub(crate) fn read(
        cur: &mut ByteCursor<'_>,
        ctx: &DecodeCtx<'_>,
        index: &mut ScriptIndex,
    ) -> Result<Self> {
        let code = cur.read_four()?;
        let data_size = cur.read_u32()? as usize;
        let mut header: RecordHeader = cur.read_struct()?;
        header.id = ctx.remap.to_global(header.id);
        let id = header.id;

        let mut body = cur.take(data_size)?;
        let (fields, compressed_blob) = if header.is_compressed() {
            let block = body.remaining_bytes().to_vec();
            let unpacked = body.read_u32()? as usize;
            let raw = compress::decompress_zlib(body.remaining_bytes(), unpacked)?;
            let mut field_cur = ByteCursor::new(&raw);
            (
                read_fields(code, id, &mut field_cur, ctx, index)?,
                Some(block),
            )
        } else {
            (read_fields(code, id, &mut body, ctx, index)?, None)
        };

        Ok(Self {
            code,
            header,
            fields,
            compressed_blob,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Mutable access to the fields. Drops the retained compressed blob, so
    /// a compressed record is recompressed on the next write.
    pub fn fields_mut(&mut self) -> &mut Vec<Field> {
        self.compressed_blob = None;
        &mut self.fields
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, remap: &RemapContext<'_>) -> Result<()> {
        let data = if let Some(blob) = &self.compressed_blob {
            blob.clone()
        } else {
            let mut body = ByteWriter::new();
            for field in &self.fields {
                field.write(&mut body, remap);
            }
            let body = body.into_vec();
            if self.header.is_compressed() {
                let packed = compress::compress_zlib(&body)?;
                let mut block = ByteWriter::with_capacity(4 + packed.len());
                block.write_u32(body.len() as u32);
                block.write_bytes(&packed);
                block.into_vec()
            } else {
                body
            }
        };

        w.write_bytes(&self.code);
        w.write_u32(data.len() as u32);
        let mut header = self.header;
        header.id = remap.to_local(self.header.id);
        w.write_struct(&header);
        w.write_bytes(&data);
        Ok(())
    }
}

fn read_fields(
    record: [u8; 4],
    id: u32,
    cur: &mut ByteCursor<'_>,
    ctx: &DecodeCtx<'_>,
    index: &mut ScriptIndex,
) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    let mut size_override: Option<usize> = None;
    while !cur.is_empty() {
        let code = cur.read_four()?;
        let declared = cur.read_u16()? as usize;
        if code == XXXX {
            if declared != 4 {
                return Err(Error::RecordSizeMismatch {
                    code: record,
                    id,
                    declared,
                    used: 4,
                }
                .in_field(record, id, XXXX));
            }
            size_override = Some(cur.read_u32()? as usize);
            continue;
        }
        let size = size_override.take().unwrap_or(declared);
        let mut payload = cur.take(size)?;
        let field = Field::read(record, code, &mut payload, ctx, index)
            .map_err(|e| e.in_field(record, id, code))?;
        if !payload.is_empty() {
            return Err(Error::RecordSizeMismatch {
                code: record,
                id,
                declared: size,
                used: size - payload.remaining(),
            }
            .in_field(record, id, code));
        }
        fields.push(field);
    }
    Ok(fields)
}

/// A `GRUP` block: a labelled container of nested entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub header: GroupHeader,
    pub entries: Vec<Entry>,
}

impl Group {
    pub(crate) fn read(
        cur: &mut ByteCursor<'_>,
        ctx: &DecodeCtx<'_>,
        index: &mut ScriptIndex,
    ) -> Result<Self> {
        cur.read_four()?;
        let size = cur.read_u32()? as usize;
        let header: GroupHeader = cur.read_struct()?;
        // The declared size includes the 24-byte group header.
        let body_len = size
            .checked_sub(GroupHeader::SIZE)
            .ok_or(veles_common::Error::SizeMismatch {
                expected: GroupHeader::SIZE,
                actual: size,
            })?;
        let mut body = cur.take(body_len)?;
        let mut entries = Vec::new();
        while !body.is_empty() {
            entries.push(Entry::read(&mut body, ctx, index)?);
        }
        Ok(Self { header, entries })
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, remap: &RemapContext<'_>) -> Result<()> {
        let mut body = ByteWriter::new();
        for entry in &self.entries {
            entry.write(&mut body, remap)?;
        }
        let body = body.into_vec();
        w.write_bytes(&GRUP);
        w.write_u32((GroupHeader::SIZE + body.len()) as u32);
        w.write_struct(&self.header);
        w.write_bytes(&body);
        Ok(())
    }
}

/// One entry of the record tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Record(Record),
    Group(Group),
}

impl Entry {
    pub(crate) fn read(
        cur: &mut ByteCursor<'_>,
        ctx: &DecodeCtx<'_>,
        index: &mut ScriptIndex,
    ) -> Result<Self> {
        if cur.peek_bytes(4)? == GRUP {
            Ok(Self::Group(Group::read(cur, ctx, index)?))
        } else {
            Ok(Self::Record(Record::read(cur, ctx, index)?))
        }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, remap: &RemapContext<'_>) -> Result<()> {
        match self {
            Self::Record(record) => record.write(w, remap),
            Self::Group(group) => group.write(w, remap),
        }
    }

    /// The record, when this entry is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Group(_) => None,
        }
    }
}
