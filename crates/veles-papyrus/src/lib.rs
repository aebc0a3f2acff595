//! Codec for Papyrus script payloads embedded in plugin records.
//!
//! Records can carry attached scripts with typed properties, plus per-kind
//! fragment containers (perks, quests, terminals). This crate decodes those
//! payloads into closed enums and re-encodes them byte for byte.
//!
//! ```no_run
//! use veles_common::ByteCursor;
//! use veles_papyrus::{FragmentKind, GameFamily, ScriptData, ScriptIndex};
//!
//! # fn demo(payload: &[u8]) -> veles_papyrus::Result<()> {
//! let mut index = ScriptIndex::new();
//! let mut cur = ByteCursor::new(payload);
//! let data = ScriptData::read(
//!     &mut cur,
//!     Some(FragmentKind::Quest),
//!     GameFamily::Skyrim,
//!     &mut index,
//! )?;
//! for script in &data.scripts {
//!     println!("{} ({} properties)", script.name, script.properties.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod fragment;
mod property;
mod script;

pub use error::{Error, Result};
pub use fragment::{
    Alias, Fragment, FragmentHost, FragmentKind, FragmentList, Fragments, GameFamily, ScriptData,
};
pub use property::{PropertyData, ScriptProperty};
pub use script::{IndexedScript, Script, ScriptIndex};
