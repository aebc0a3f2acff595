use thiserror::Error;

/// Any error the sub-crates can raise, plus I/O from batch loading.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Archive(#[from] veles_archive::Error),

    #[error(transparent)]
    Plugin(#[from] veles_esp::Error),

    #[error(transparent)]
    Papyrus(#[from] veles_papyrus::Error),

    #[error(transparent)]
    Common(#[from] veles_common::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
