use thiserror::Error;

/// Errors raised while decoding or encoding Papyrus script data.
#[derive(Debug, Error)]
pub enum Error {
    /// A property carried a type tag outside the known set.
    ///
    /// An unrecognized tag means the payload length cannot be determined,
    /// so everything after it would be misread. Decoding stops here.
    #[error("unknown property type tag {0:#04x}")]
    UnknownPropertyType(u8),

    #[error(transparent)]
    Common(#[from] veles_common::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
