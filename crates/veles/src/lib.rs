//! Umbrella crate tying the codecs together.
//!
//! - [`archive`]: BSA and BA2 containers, extraction and rewriting.
//! - [`esp`]: plugin record trees with load-order FormID remapping.
//! - [`papyrus`]: script property and fragment payloads.
//! - [`batch`]: load many files, collecting per-file failures.
//!
//! ```no_run
//! use veles::prelude::*;
//!
//! let batch = veles::batch::open_archives(["Skyrim - Misc.bsa"]);
//! for archive in &batch.items {
//!     println!("opened {}", archive.name());
//! }
//! for failure in &batch.failures {
//!     eprintln!("{}: {}", failure.path.display(), failure.error);
//! }
//! ```

pub use veles_archive as archive;
pub use veles_common as common;
pub use veles_esp as esp;
pub use veles_papyrus as papyrus;

pub mod batch;
mod error;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::archive::{Archive, ArchiveKind, Ba2, Bsa};
    pub use crate::batch::{Batch, Failure};
    pub use crate::common::{ByteCursor, ByteWriter};
    pub use crate::esp::{Entry, Plugin, PluginRegistry, Record};
    pub use crate::papyrus::{GameFamily, PropertyData, Script, ScriptData};
    pub use crate::{Error, Result};
}
