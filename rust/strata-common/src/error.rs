use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn index_out_of_bounds(index: usize, length: usize, bound: usize) -> Error {
        ErrorKind::IndexOutOfBounds {
            index,
            length,
            bound,
        }
        .into()
    }

    pub fn underflow(requested: usize, remaining: usize) -> Error {
        ErrorKind::BufferUnderflow {
            requested,
            remaining,
        }
        .into()
    }

    pub fn overflow(requested: usize, remaining: usize) -> Error {
        ErrorKind::BufferOverflow {
            requested,
            remaining,
        }
        .into()
    }

    pub fn read_only() -> Error {
        ErrorKind::ReadOnly.into()
    }

    pub fn invalid_mark() -> Error {
        ErrorKind::InvalidMark.into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        ErrorKind::InvalidOperation { name: name.into() }.into()
    }

    pub fn unsupported(operation: impl Into<String>) -> Error {
        ErrorKind::Unsupported {
            operation: operation.into(),
        }
        .into()
    }

    pub fn out_of_memory(requested: u64, available: u64) -> Error {
        ErrorKind::OutOfMemory {
            requested,
            available,
        }
        .into()
    }

    /// Returns `true` if this is an index/offset/length precondition failure.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind(), ErrorKind::IndexOutOfBounds { .. })
    }

    pub fn is_underflow(&self) -> bool {
        matches!(self.kind(), ErrorKind::BufferUnderflow { .. })
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self.kind(), ErrorKind::BufferOverflow { .. })
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.kind(), ErrorKind::ReadOnly)
    }

    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfMemory { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("index {index} (length {length}) out of bounds for {bound}")]
    IndexOutOfBounds {
        index: usize,
        length: usize,
        bound: usize,
    },

    #[error("buffer underflow: requested {requested}, remaining {remaining}")]
    BufferUnderflow { requested: usize, remaining: usize },

    #[error("buffer overflow: requested {requested}, remaining {remaining}")]
    BufferOverflow { requested: usize, remaining: usize },

    #[error("buffer is read-only")]
    ReadOnly,

    #[error("mark is not set")]
    InvalidMark,

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    #[error("cannot reserve {requested} bytes of direct memory ({available} available)")]
    OutOfMemory { requested: u64, available: u64 },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
