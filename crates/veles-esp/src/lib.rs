//! ESP/ESM plugin record codec.
//!
//! A plugin is a TES4 file header followed by a tree of records and nested
//! `GRUP` blocks. Decoding rescopes every FormID from its file-local master
//! index to a global plugin-registry scope; writing reverses the mapping.
//! Unedited plugins re-serialize byte for byte.
//!
//! ```no_run
//! use veles_esp::{Plugin, PluginRegistry};
//! use veles_papyrus::GameFamily;
//!
//! # fn demo(bytes: &[u8]) -> veles_esp::Result<()> {
//! let mut plugins = PluginRegistry::new();
//! plugins.register("Skyrim.esm");
//! plugins.register("MyMod.esp");
//!
//! let plugin = Plugin::parse(bytes, "MyMod.esp", &plugins, GameFamily::Skyrim)?;
//! println!("{} masters, {} top-level entries", plugin.masters().len(), plugin.entries.len());
//! assert_eq!(plugin.write(&plugins)?, bytes);
//! # Ok(())
//! # }
//! ```

mod error;
mod field;
mod formid;
mod header;
mod plugin;
mod record;

pub use error::{Error, Result};
pub use field::{fragment_kind, Field, FieldData, FieldKind, FieldRegistry};
pub use formid::{PluginRegistry, RemapContext, UNRESOLVED};
pub use header::{GroupHeader, RecordHeader, FLAG_COMPRESSED, FLAG_LOCALIZED};
pub use plugin::{Plugin, Tes4, Tes4Field};
pub use record::{Entry, Group, Record, GRUP};
