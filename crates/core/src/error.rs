/// Result alias that carries the custom [`RipError`] type.
pub type Result<T> = std::result::Result<T, RipError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum RipError {
    /// Free-form message for conditions that don't warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors raised by config loading.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Polygons carry either three or four vertices.
    #[error("polygon must have 3 or 4 vertices, got {0}")]
    VertexCount(usize),
    /// A VRAM bank handed over by the host does not match its hardware size.
    #[error("VRAM bank {bank} must be {expected} bytes, got {actual}")]
    BankSize {
        bank: char,
        expected: usize,
        actual: usize,
    },
    #[error("dump does not start with the melon ripper magic")]
    BadMagic,
    #[error("dump truncated at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },
    #[error("unknown opcode {tag:?} at offset {offset}")]
    UnknownOpcode { offset: usize, tag: [u8; 4] },
    #[error("dump has no VRAM/DISP/TOON snapshot block")]
    MissingSnapshot,
    #[error("{0} unexpected bytes after the snapshot block")]
    TrailingBytes(usize),
}

impl RipError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
