//! Tagged property values carried by script records.
//!
//! Every property payload starts with a one-byte type tag. The tag decides
//! how many bytes follow, so a tag outside the known set makes the rest of
//! the stream unreadable and decoding fails hard rather than guessing.

use veles_common::{ByteCursor, ByteWriter};

use crate::error::{Error, Result};

/// A decoded property value.
///
/// Scalar variants mirror the wire tags 0-7; array variants (tags 11-17)
/// hold untagged payloads of the corresponding scalar kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyData {
    Null,
    /// Global object id (form id packed with alias data).
    Object(u64),
    String(String),
    Int(i32),
    Float(f32),
    Bool(bool),
    /// Opaque variable reference, kept verbatim.
    Var(u32),
    /// Named member properties, each carrying its own tag.
    Struct(Vec<ScriptProperty>),
    ArrayOfObject(Vec<u64>),
    ArrayOfString(Vec<String>),
    ArrayOfInt(Vec<i32>),
    ArrayOfFloat(Vec<f32>),
    ArrayOfBool(Vec<bool>),
    ArrayOfVar(Vec<u32>),
    ArrayOfStruct(Vec<Vec<ScriptProperty>>),
}

impl PropertyData {
    /// The wire tag for this variant.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Object(_) => 1,
            Self::String(_) => 2,
            Self::Int(_) => 3,
            Self::Float(_) => 4,
            Self::Bool(_) => 5,
            Self::Var(_) => 6,
            Self::Struct(_) => 7,
            Self::ArrayOfObject(_) => 11,
            Self::ArrayOfString(_) => 12,
            Self::ArrayOfInt(_) => 13,
            Self::ArrayOfFloat(_) => 14,
            Self::ArrayOfBool(_) => 15,
            Self::ArrayOfVar(_) => 16,
            Self::ArrayOfStruct(_) => 17,
        }
    }

    /// Read a tag byte followed by its payload.
    pub fn read(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let tag = cur.read_u8()?;
        Self::read_payload(tag, cur)
    }

    /// Read the payload for an already-consumed tag byte.
    pub fn read_payload(tag: u8, cur: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(match tag {
            0 => Self::Null,
            1 => Self::Object(cur.read_u64()?),
            2 => Self::String(cur.read_wstring()?.to_owned()),
            3 => Self::Int(cur.read_i32()?),
            4 => Self::Float(cur.read_f32()?),
            5 => Self::Bool(cur.read_bool()?),
            6 => Self::Var(cur.read_u32()?),
            7 => Self::Struct(read_members(cur)?),
            11 => Self::ArrayOfObject(read_array(cur, |c| Ok(c.read_u64()?))?),
            12 => Self::ArrayOfString(read_array(cur, |c| Ok(c.read_wstring()?.to_owned()))?),
            13 => Self::ArrayOfInt(read_array(cur, |c| Ok(c.read_i32()?))?),
            14 => Self::ArrayOfFloat(read_array(cur, |c| Ok(c.read_f32()?))?),
            15 => Self::ArrayOfBool(read_array(cur, |c| Ok(c.read_bool()?))?),
            16 => Self::ArrayOfVar(read_array(cur, |c| Ok(c.read_u32()?))?),
            17 => Self::ArrayOfStruct(read_array(cur, read_members)?),
            other => return Err(Error::UnknownPropertyType(other)),
        })
    }

    /// Write the tag byte followed by the payload.
    pub fn write(&self, w: &mut ByteWriter) {
        w.write_u8(self.tag());
        self.write_payload(w);
    }

    /// Write the payload without the tag byte (array element form).
    pub fn write_payload(&self, w: &mut ByteWriter) {
        match self {
            Self::Null => {}
            Self::Object(v) => w.write_u64(*v),
            Self::String(s) => w.write_wstring(s),
            Self::Int(v) => w.write_i32(*v),
            Self::Float(v) => w.write_f32(*v),
            Self::Bool(v) => w.write_u8(*v as u8),
            Self::Var(v) => w.write_u32(*v),
            Self::Struct(members) => write_members(members, w),
            Self::ArrayOfObject(items) => write_array(items, w, |v, w| w.write_u64(*v)),
            Self::ArrayOfString(items) => write_array(items, w, |s, w| w.write_wstring(s)),
            Self::ArrayOfInt(items) => write_array(items, w, |v, w| w.write_i32(*v)),
            Self::ArrayOfFloat(items) => write_array(items, w, |v, w| w.write_f32(*v)),
            Self::ArrayOfBool(items) => write_array(items, w, |v, w| w.write_u8(*v as u8)),
            Self::ArrayOfVar(items) => write_array(items, w, |v, w| w.write_u32(*v)),
            Self::ArrayOfStruct(items) => write_array(items, w, |m, w| write_members(m, w)),
        }
    }

    /// Payload byte length, tag excluded.
    pub fn size(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Object(_) => 8,
            Self::String(s) => 2 + s.len(),
            Self::Int(_) => 4,
            Self::Float(_) => 4,
            Self::Bool(_) => 1,
            Self::Var(_) => 4,
            Self::Struct(members) => members_size(members),
            Self::ArrayOfObject(items) => 4 + items.len() * 8,
            Self::ArrayOfString(items) => 4 + items.iter().map(|s| 2 + s.len()).sum::<usize>(),
            Self::ArrayOfInt(items) => 4 + items.len() * 4,
            Self::ArrayOfFloat(items) => 4 + items.len() * 4,
            Self::ArrayOfBool(items) => 4 + items.len(),
            Self::ArrayOfVar(items) => 4 + items.len() * 4,
            Self::ArrayOfStruct(items) => 4 + items.iter().map(|m| members_size(m)).sum::<usize>(),
        }
    }
}

/// A named property on a script or struct.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptProperty {
    pub name: String,
    pub status: u8,
    pub data: PropertyData,
}

impl ScriptProperty {
    /// Wire order: name wstring, tag u8, status u8, payload.
    pub fn read(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let name = cur.read_wstring()?.to_owned();
        let tag = cur.read_u8()?;
        let status = cur.read_u8()?;
        let data = PropertyData::read_payload(tag, cur)?;
        Ok(Self { name, status, data })
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_wstring(&self.name);
        w.write_u8(self.data.tag());
        w.write_u8(self.status);
        self.data.write_payload(w);
    }

    /// Total encoded length including the name, tag and status bytes.
    pub fn size(&self) -> usize {
        2 + self.name.len() + 1 + 1 + self.data.size()
    }
}

fn read_array<'a, T>(
    cur: &mut ByteCursor<'a>,
    mut read_one: impl FnMut(&mut ByteCursor<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = cur.read_u32()? as usize;
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(read_one(cur)?);
    }
    Ok(items)
}

fn write_array<T>(items: &[T], w: &mut ByteWriter, mut write_one: impl FnMut(&T, &mut ByteWriter)) {
    w.write_u32(items.len() as u32);
    for item in items {
        write_one(item, w);
    }
}

fn read_members(cur: &mut ByteCursor<'_>) -> Result<Vec<ScriptProperty>> {
    read_array(cur, ScriptProperty::read)
}

fn write_members(members: &[ScriptProperty], w: &mut ByteWriter) {
    w.write_u32(members.len() as u32);
    for member in members {
        member.write(w);
    }
}

fn members_size(members: &[ScriptProperty]) -> usize {
    4 + members.iter().map(ScriptProperty::size).sum::<usize>()
}
