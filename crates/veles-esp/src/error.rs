use thiserror::Error;

/// Errors raised while decoding or encoding plugin files.
#[derive(Debug, Error)]
pub enum Error {
    /// The first record of a plugin was not `TES4`.
    #[error("plugin does not start with a TES4 record (found {})", fourcc(.0))]
    MissingFileHeader([u8; 4]),

    /// The plugin being parsed was never registered with the plugin registry.
    #[error("plugin {0:?} is not registered")]
    UnregisteredPlugin(String),

    /// A record's fields did not fill its declared data size.
    #[error(
        "record {} ({id:#010x}) declared {declared} data bytes but fields used {used}",
        fourcc(.code)
    )]
    RecordSizeMismatch {
        code: [u8; 4],
        id: u32,
        declared: usize,
        used: usize,
    },

    /// Decoding failed inside a specific field, with positional context.
    #[error("record {} ({id:#010x}), field {}: {source}", fourcc(.record), fourcc(.field))]
    Field {
        record: [u8; 4],
        id: u32,
        field: [u8; 4],
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Papyrus(#[from] veles_papyrus::Error),

    #[error(transparent)]
    Common(#[from] veles_common::Error),
}

impl Error {
    /// Wrap an error with the record and field being decoded.
    pub(crate) fn in_field(self, record: [u8; 4], id: u32, field: [u8; 4]) -> Self {
        Self::Field {
            record,
            id,
            field,
            source: Box::new(self),
        }
    }
}

fn fourcc(code: &[u8; 4]) -> String {
    String::from_utf8_lossy(code).into_owned()
}

pub type Result<T> = std::result::Result<T, Error>;
