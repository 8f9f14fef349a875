use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Target process is not running")]
    InvalidTarget,

    #[error("Failed to allocate {size} bytes in target process")]
    AllocationFailed { size: usize },

    #[error("Short read at {address:#x}: {transferred} of {requested} bytes")]
    ShortRead {
        address: u64,
        requested: usize,
        transferred: usize,
    },

    #[error("Short write at {address:#x}: {transferred} of {requested} bytes")]
    ShortWrite {
        address: u64,
        requested: usize,
        transferred: usize,
    },

    #[error("Failed to create remote thread at {entry:#x}: {message}")]
    ThreadCreationFailed { entry: u64, message: String },

    #[error("Code buffer overflow: {requested} bytes exceed capacity {capacity}")]
    CodeOverflow { capacity: usize, requested: usize },

    #[error("Relocation site {offset} does not point into the code buffer")]
    InvalidRelocation { offset: usize },

    #[error("Address {0:#x} is outside the 32-bit address space")]
    AddressOutOfRange(u64),

    #[error("Address path is empty")]
    EmptyAddressPath,

    #[error("Invalid address path: {0}")]
    InvalidAddressPath(String),

    #[error("Write of {requested} bytes requested but only {available} supplied")]
    InvalidLength { requested: usize, available: usize },

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("No window matching {0:?}")]
    WindowNotFound(String),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Cannot copy {} into {}: destination is inside the source", src.display(), dst.display())]
    NestedCopy {
        src: std::path::PathBuf,
        dst: std::path::PathBuf,
    },

    #[error("{0} is only supported on Windows")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Whether the error came from a partial cross-process transfer
    pub fn is_short_transfer(&self) -> bool {
        matches!(self, Error::ShortRead { .. } | Error::ShortWrite { .. })
    }
}
