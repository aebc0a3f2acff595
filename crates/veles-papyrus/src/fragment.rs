//! Script fragment containers attached to perk, quest and terminal records.
//!
//! The fragment host differs by game: Fallout 4 embeds a full [`Script`]
//! while Skyrim stores the name of an external script file. The caller says
//! which family it is decoding; nothing here inspects payload bytes to guess.

use veles_common::{ByteCursor, ByteWriter};

use crate::error::Result;
use crate::script::{Script, ScriptIndex};

/// Which game's conventions the payload follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameFamily {
    Skyrim,
    Fallout4,
}

/// The record kinds that carry a fragment container after their scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Perk,
    Quest,
    Terminal,
}

/// The script a fragment container hangs its fragments off.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentHost {
    /// Fallout 4: the host script is embedded in the payload.
    Embedded(Script),
    /// Skyrim: the payload names an external script file.
    File(String),
}

impl FragmentHost {
    fn read(cur: &mut ByteCursor<'_>, family: GameFamily) -> Result<Self> {
        Ok(match family {
            GameFamily::Fallout4 => Self::Embedded(Script::read(cur)?),
            GameFamily::Skyrim => Self::File(cur.read_wstring()?.to_owned()),
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        match self {
            Self::Embedded(script) => script.write(w),
            Self::File(name) => w.write_wstring(name),
        }
    }
}

/// One fragment entry: which hook it binds and where its code lives.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    pub index: u16,
    pub flags: u8,
    pub script_name: String,
    pub fragment_name: String,
}

impl Fragment {
    fn read(cur: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            index: cur.read_u16()?,
            flags: cur.read_u8()?,
            script_name: cur.read_wstring()?.to_owned(),
            fragment_name: cur.read_wstring()?.to_owned(),
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_u16(self.index);
        w.write_u8(self.flags);
        w.write_wstring(&self.script_name);
        w.write_wstring(&self.fragment_name);
    }
}

/// The shared part of every fragment container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentList {
    pub unknown: u8,
    pub host: FragmentHost,
    pub fragments: Vec<Fragment>,
}

impl FragmentList {
    fn read(cur: &mut ByteCursor<'_>, family: GameFamily) -> Result<Self> {
        let unknown = cur.read_u8()?;
        let count = cur.read_u16()? as usize;
        let host = FragmentHost::read(cur, family)?;
        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            fragments.push(Fragment::read(cur)?);
        }
        Ok(Self {
            unknown,
            host,
            fragments,
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_u8(self.unknown);
        w.write_u16(self.fragments.len() as u16);
        self.host.write(w);
        for fragment in &self.fragments {
            fragment.write(w);
        }
    }
}

/// A quest alias with its own attached scripts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alias {
    pub object: u64,
    pub version: i16,
    pub object_format: i16,
    pub scripts: Vec<Script>,
}

impl Alias {
    fn read(cur: &mut ByteCursor<'_>, index: &mut ScriptIndex) -> Result<Self> {
        let object = cur.read_u64()?;
        let version = cur.read_i16()?;
        let object_format = cur.read_i16()?;
        let count = cur.read_u16()? as usize;
        let mut scripts = Vec::with_capacity(count);
        for _ in 0..count {
            let script = Script::read(cur)?;
            index.register(object, &script.name);
            scripts.push(script);
        }
        Ok(Self {
            object,
            version,
            object_format,
            scripts,
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_u64(self.object);
        w.write_i16(self.version);
        w.write_i16(self.object_format);
        w.write_u16(self.scripts.len() as u16);
        for script in &self.scripts {
            script.write(w);
        }
    }
}

/// Fragment container, shaped by the owning record kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fragments {
    Perk(FragmentList),
    Terminal(FragmentList),
    Quest {
        fragments: FragmentList,
        aliases: Vec<Alias>,
    },
}

impl Fragments {
    fn read(
        cur: &mut ByteCursor<'_>,
        kind: FragmentKind,
        family: GameFamily,
        index: &mut ScriptIndex,
    ) -> Result<Self> {
        Ok(match kind {
            FragmentKind::Perk => Self::Perk(FragmentList::read(cur, family)?),
            FragmentKind::Terminal => Self::Terminal(FragmentList::read(cur, family)?),
            FragmentKind::Quest => {
                let fragments = FragmentList::read(cur, family)?;
                let count = cur.read_u16()? as usize;
                let mut aliases = Vec::with_capacity(count);
                for _ in 0..count {
                    aliases.push(Alias::read(cur, index)?);
                }
                Self::Quest { fragments, aliases }
            }
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        match self {
            Self::Perk(list) | Self::Terminal(list) => list.write(w),
            Self::Quest { fragments, aliases } => {
                fragments.write(w);
                w.write_u16(aliases.len() as u16);
                for alias in aliases {
                    alias.write(w);
                }
            }
        }
    }
}

/// The full script payload of one record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptData {
    pub version: i16,
    pub object_format: i16,
    pub scripts: Vec<Script>,
    pub fragments: Option<Fragments>,
}

impl ScriptData {
    /// Decode a record's script payload.
    ///
    /// `kind` is `Some` for record types that carry a fragment container
    /// after the script list. Scripts found on quest aliases are registered
    /// in `index` as they are read.
    pub fn read(
        cur: &mut ByteCursor<'_>,
        kind: Option<FragmentKind>,
        family: GameFamily,
        index: &mut ScriptIndex,
    ) -> Result<Self> {
        let version = cur.read_i16()?;
        let object_format = cur.read_i16()?;
        let count = cur.read_u16()? as usize;
        let mut scripts = Vec::with_capacity(count);
        for _ in 0..count {
            scripts.push(Script::read(cur)?);
        }
        let fragments = match kind {
            Some(kind) if !cur.is_empty() => Some(Fragments::read(cur, kind, family, index)?),
            _ => None,
        };
        Ok(Self {
            version,
            object_format,
            scripts,
            fragments,
        })
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_i16(self.version);
        w.write_i16(self.object_format);
        w.write_u16(self.scripts.len() as u16);
        for script in &self.scripts {
            script.write(w);
        }
        if let Some(fragments) = &self.fragments {
            fragments.write(w);
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.write(&mut w);
        w.into_vec()
    }
}
