//! Attached scripts and the per-parse script registry.

use veles_common::{ByteCursor, ByteWriter};

use crate::error::Result;
use crate::property::ScriptProperty;

/// A script attached to a record, with its named properties.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Script {
    pub name: String,
    pub status: u8,
    pub properties: Vec<ScriptProperty>,
}

impl Script {
    /// Wire order: name wstring, status u8, property count u16, properties.
    pub fn read(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let name = cur.read_wstring()?.to_owned();
        let status = cur.read_u8()?;
        let count = cur.read_u16()? as usize;
        let mut properties = Vec::with_capacity(count);
        for _ in 0..count {
            properties.push(ScriptProperty::read(cur)?);
        }
        Ok(Self {
            name,
            status,
            properties,
        })
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_wstring(&self.name);
        w.write_u8(self.status);
        w.write_u16(self.properties.len() as u16);
        for property in &self.properties {
            property.write(w);
        }
    }

    /// Total encoded length.
    pub fn size(&self) -> usize {
        2 + self.name.len() + 1 + 2 + self.properties.iter().map(ScriptProperty::size).sum::<usize>()
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&ScriptProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A script registered while decoding, keyed by its owning object id.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedScript {
    pub owner: u64,
    pub name: String,
}

/// Registry of scripts seen during one decoding pass.
///
/// Quest alias decoding registers every script it reads so later passes can
/// cross-reference alias objects with the scripts attached to them. The
/// registry is threaded through decoding as `&mut`; each parse owns its own.
#[derive(Debug, Default)]
pub struct ScriptIndex {
    entries: Vec<IndexedScript>,
}

impl ScriptIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a script against its owning object id.
    pub fn register(&mut self, owner: u64, name: &str) {
        self.entries.push(IndexedScript {
            owner,
            name: name.to_owned(),
        });
    }

    /// All scripts registered for an object.
    pub fn scripts_for(&self, owner: u64) -> impl Iterator<Item = &IndexedScript> {
        self.entries.iter().filter(move |e| e.owner == owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedScript> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyData;

    fn sample() -> Script {
        Script {
            name: "defaultSetStageOnEnter".into(),
            status: 0,
            properties: vec![
                ScriptProperty {
                    name: "StageToSet".into(),
                    status: 1,
                    data: PropertyData::Int(20),
                },
                ScriptProperty {
                    name: "OnlyOnce".into(),
                    status: 1,
                    data: PropertyData::Bool(true),
                },
            ],
        }
    }

    #[test]
    fn script_round_trip() {
        let script = sample();
        let mut w = ByteWriter::new();
        script.write(&mut w);
        let bytes = w.into_vec();
        assert_eq!(bytes.len(), script.size());

        let mut cur = ByteCursor::new(&bytes);
        assert_eq!(Script::read(&mut cur).unwrap(), script);
        assert!(cur.is_empty());
    }

    #[test]
    fn property_lookup() {
        let script = sample();
        assert_eq!(
            script.property("OnlyOnce").map(|p| &p.data),
            Some(&PropertyData::Bool(true))
        );
        assert!(script.property("Missing").is_none());
    }

    #[test]
    fn index_groups_by_owner() {
        let mut index = ScriptIndex::new();
        index.register(0x10, "A");
        index.register(0x20, "B");
        index.register(0x10, "C");

        let names: Vec<_> = index.scripts_for(0x10).map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
        assert_eq!(index.len(), 3);
    }
}
