//! Fields: the typed leaves of a record.
//!
//! Fields are read by a dispatcher keyed on the 4-character field code.
//! Codes nobody registered decode as opaque byte blobs, which keeps the
//! round trip exact for content the codec does not understand.

use std::collections::HashMap;

use veles_common::{ByteCursor, ByteWriter};
use veles_papyrus::{FragmentKind, GameFamily, ScriptData, ScriptIndex};

use crate::error::Result;
use crate::formid::RemapContext;

/// Size-override field: its u32 payload replaces the next field's u16 size.
pub const XXXX: [u8; 4] = *b"XXXX";

/// How a field payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    ZString,
    FormId,
    Script,
    Bytes,
}

/// Dispatch table from (record code, field code) to a payload kind.
///
/// A mapping can be scoped to one record code or apply to every record;
/// scoped mappings win. The default table covers the codes the crate
/// interprets; callers add their own with [`register`](Self::register) and
/// [`register_for`](Self::register_for).
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    scoped: HashMap<([u8; 4], [u8; 4]), FieldKind>,
    any: HashMap<[u8; 4], FieldKind>,
}

impl FieldRegistry {
    pub fn empty() -> Self {
        Self {
            scoped: HashMap::new(),
            any: HashMap::new(),
        }
    }

    /// Map a field code to a kind for every record.
    pub fn register(&mut self, field: [u8; 4], kind: FieldKind) {
        self.any.insert(field, kind);
    }

    /// Map a field code to a kind for one record code only.
    pub fn register_for(&mut self, record: [u8; 4], field: [u8; 4], kind: FieldKind) {
        self.scoped.insert((record, field), kind);
    }

    pub fn kind_of(&self, record: [u8; 4], field: [u8; 4]) -> FieldKind {
        self.scoped
            .get(&(record, field))
            .or_else(|| self.any.get(&field))
            .copied()
            .unwrap_or(FieldKind::Bytes)
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(*b"EDID", FieldKind::ZString);
        registry.register(*b"SCRI", FieldKind::FormId);
        registry.register_for(*b"PERK", *b"VMAD", FieldKind::Script);
        registry.register_for(*b"QUST", *b"VMAD", FieldKind::Script);
        registry.register_for(*b"TERM", *b"VMAD", FieldKind::Script);
        registry.register_for(*b"REFR", *b"NAME", FieldKind::FormId);
        registry.register_for(*b"ACHR", *b"NAME", FieldKind::FormId);
        registry
    }
}

/// Everything field decoding needs besides the bytes themselves.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecodeCtx<'a> {
    pub fields: &'a FieldRegistry,
    pub remap: RemapContext<'a>,
    pub family: GameFamily,
}

/// A decoded field payload. FormIds are held globally scoped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldData {
    ZString(String),
    FormId(u32),
    Script(ScriptData),
    Bytes(Vec<u8>),
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub code: [u8; 4],
    pub data: FieldData,
}

impl Field {
    /// Decode one field from its payload cursor, already bounded to the
    /// field's declared (or XXXX-overridden) size.
    pub(crate) fn read(
        record: [u8; 4],
        code: [u8; 4],
        payload: &mut ByteCursor<'_>,
        ctx: &DecodeCtx<'_>,
        index: &mut ScriptIndex,
    ) -> Result<Self> {
        let data = match ctx.fields.kind_of(record, code) {
            FieldKind::ZString => FieldData::ZString(payload.read_zstring()?.to_owned()),
            FieldKind::FormId => FieldData::FormId(ctx.remap.to_global(payload.read_u32()?)),
            FieldKind::Script => FieldData::Script(ScriptData::read(
                payload,
                fragment_kind(record),
                ctx.family,
                index,
            )?),
            FieldKind::Bytes => {
                let bytes = payload.remaining_bytes().to_vec();
                payload.advance(bytes.len());
                FieldData::Bytes(bytes)
            }
        };
        Ok(Self { code, data })
    }

    /// Encode the payload bytes, mapping ids back to file-local form.
    pub(crate) fn encode(&self, remap: &RemapContext<'_>) -> Vec<u8> {
        let mut w = ByteWriter::new();
        match &self.data {
            FieldData::ZString(s) => w.write_zstring(s),
            FieldData::FormId(id) => w.write_u32(remap.to_local(*id)),
            FieldData::Script(script) => script.write(&mut w),
            FieldData::Bytes(bytes) => w.write_bytes(bytes),
        }
        w.into_vec()
    }

    /// Write code, size and payload; oversized payloads get an XXXX
    /// size-override field in front and declare size 0.
    pub(crate) fn write(&self, w: &mut ByteWriter, remap: &RemapContext<'_>) {
        let payload = self.encode(remap);
        if payload.len() > u16::MAX as usize {
            w.write_bytes(&XXXX);
            w.write_u16(4);
            w.write_u32(payload.len() as u32);
            w.write_bytes(&self.code);
            w.write_u16(0);
        } else {
            w.write_bytes(&self.code);
            w.write_u16(payload.len() as u16);
        }
        w.write_bytes(&payload);
    }
}

/// Which fragment container a record type's script data carries.
pub fn fragment_kind(record: [u8; 4]) -> Option<FragmentKind> {
    match &record {
        b"PERK" => Some(FragmentKind::Perk),
        b"QUST" => Some(FragmentKind::Quest),
        b"TERM" => Some(FragmentKind::Terminal),
        _ => None,
    }
}
