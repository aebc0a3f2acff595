//! Whole-file parsing: the TES4 file header and the record tree after it.

use veles_common::{ByteCursor, ByteWriter};
use veles_papyrus::{GameFamily, ScriptIndex};

use crate::error::{Error, Result};
use crate::field::{DecodeCtx, FieldRegistry};
use crate::formid::{PluginRegistry, RemapContext};
use crate::header::RecordHeader;
use crate::record::Entry;

const TES4: [u8; 4] = *b"TES4";
const HEDR: [u8; 4] = *b"HEDR";
const MAST: [u8; 4] = *b"MAST";
const DATA: [u8; 4] = *b"DATA";

/// One field of the TES4 file header, kept in on-disk order.
#[derive(Debug, Clone, PartialEq)]
pub enum Tes4Field {
    /// `HEDR`: format version and record bookkeeping.
    Header {
        version: f32,
        record_count: u32,
        next_object_id: u32,
    },
    /// `MAST` and its optional trailing `DATA` size field.
    Master { name: String, data: Option<u64> },
    /// Anything else, kept opaque.
    Other { code: [u8; 4], data: Vec<u8> },
}

/// The TES4 record that opens every plugin.
///
/// Parsed outside the generic record path because its master list must be
/// known before any FormID in the rest of the file can be scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct Tes4 {
    pub header: RecordHeader,
    pub fields: Vec<Tes4Field>,
}

impl Tes4 {
    fn read(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let code = cur.read_four()?;
        if code != TES4 {
            return Err(Error::MissingFileHeader(code));
        }
        let data_size = cur.read_u32()? as usize;
        let header: RecordHeader = cur.read_struct()?;
        let mut body = cur.take(data_size)?;

        let mut fields = Vec::new();
        while !body.is_empty() {
            let code = body.read_four()?;
            let size = body.read_u16()? as usize;
            let mut payload = body.take(size)?;
            let field = match code {
                HEDR => Tes4Field::Header {
                    version: payload.read_f32()?,
                    record_count: payload.read_u32()?,
                    next_object_id: payload.read_u32()?,
                },
                MAST => {
                    let name = payload.read_zstring()?.to_owned();
                    // Fold the trailing DATA field in only when it is the
                    // expected u64; any other size falls through to Other.
                    let data = match body.peek_bytes(6) {
                        Ok(peek)
                            if peek[..4] == DATA
                                && u16::from_le_bytes([peek[4], peek[5]]) == 8 =>
                        {
                            body.advance(6);
                            Some(body.read_u64()?)
                        }
                        _ => None,
                    };
                    Tes4Field::Master { name, data }
                }
                other => Tes4Field::Other {
                    code: other,
                    data: payload.remaining_bytes().to_vec(),
                },
            };
            fields.push(field);
        }
        Ok(Self { header, fields })
    }

    fn write(&self, w: &mut ByteWriter) {
        let mut body = ByteWriter::new();
        for field in &self.fields {
            match field {
                Tes4Field::Header {
                    version,
                    record_count,
                    next_object_id,
                } => {
                    body.write_bytes(&HEDR);
                    body.write_u16(12);
                    body.write_f32(*version);
                    body.write_u32(*record_count);
                    body.write_u32(*next_object_id);
                }
                Tes4Field::Master { name, data } => {
                    body.write_bytes(&MAST);
                    body.write_u16(name.len() as u16 + 1);
                    body.write_zstring(name);
                    if let Some(size) = data {
                        body.write_bytes(&DATA);
                        body.write_u16(8);
                        body.write_u64(*size);
                    }
                }
                Tes4Field::Other { code, data } => {
                    body.write_bytes(code);
                    body.write_u16(data.len() as u16);
                    body.write_bytes(data);
                }
            }
        }
        let body = body.into_vec();
        w.write_bytes(&TES4);
        w.write_u32(body.len() as u32);
        w.write_struct(&self.header);
        w.write_bytes(&body);
    }

    /// Master filenames in declaration order.
    pub fn masters(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                Tes4Field::Master { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Format version from the `HEDR` field.
    pub fn version(&self) -> Option<f32> {
        self.fields.iter().find_map(|f| match f {
            Tes4Field::Header { version, .. } => Some(*version),
            _ => None,
        })
    }
}

/// A fully decoded plugin file.
#[derive(Debug)]
pub struct Plugin {
    pub name: String,
    pub tes4: Tes4,
    pub entries: Vec<Entry>,
    /// Scripts registered while decoding quest aliases.
    pub script_index: ScriptIndex,
    masters: Vec<String>,
    self_index: u8,
}

impl Plugin {
    /// Parse with the default field registry.
    ///
    /// `name` must already be registered in `plugins`, and the registry must
    /// hold every plugin of the load order before the first parse.
    pub fn parse(
        bytes: &[u8],
        name: &str,
        plugins: &PluginRegistry,
        family: GameFamily,
    ) -> Result<Self> {
        Self::parse_with(bytes, name, plugins, family, &FieldRegistry::default())
    }

    /// Parse with caller-supplied field mappings.
    pub fn parse_with(
        bytes: &[u8],
        name: &str,
        plugins: &PluginRegistry,
        family: GameFamily,
        fields: &FieldRegistry,
    ) -> Result<Self> {
        let self_index = plugins
            .lookup(name)
            .ok_or_else(|| Error::UnregisteredPlugin(name.to_owned()))?;

        let mut cur = ByteCursor::new(bytes);
        let tes4 = Tes4::read(&mut cur)?;
        let masters = tes4.masters();

        let ctx = DecodeCtx {
            fields,
            remap: RemapContext::new(plugins, &masters, self_index),
            family,
        };
        let mut script_index = ScriptIndex::new();
        let mut entries = Vec::new();
        while !cur.is_empty() {
            entries.push(Entry::read(&mut cur, &ctx, &mut script_index)?);
        }

        Ok(Self {
            name: name.to_owned(),
            tes4,
            entries,
            script_index,
            masters,
            self_index,
        })
    }

    /// Serialize back to plugin bytes, rescoping every id to file-local form.
    pub fn write(&self, plugins: &PluginRegistry) -> Result<Vec<u8>> {
        let remap = RemapContext::new(plugins, &self.masters, self.self_index);
        let mut w = ByteWriter::new();
        self.tes4.write(&mut w);
        for entry in &self.entries {
            entry.write(&mut w, &remap)?;
        }
        Ok(w.into_vec())
    }

    pub fn masters(&self) -> &[String] {
        &self.masters
    }

    pub fn localized(&self) -> bool {
        self.tes4.header.is_localized()
    }
}
