use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A document ID was committed twice within one session.
    DuplicateDocument,
    /// Bad caller input: empty/oversized term, position or payload out of range.
    InvalidInput,
    /// The spill temp file could not be created or written.
    SpillIo,
    /// Segment output files could not be written, synced or renamed.
    CommitIo,
    /// A staged frame or packed bitmap failed to parse, or the final
    /// index size did not match the encoder's accounting.
    FormatCorruption,
    InvalidState,
    Io,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub(crate) fn invalid_input(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidInput, context.into())
    }

    pub(crate) fn corrupt(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::FormatCorruption, context.into())
    }

    pub(crate) fn spill(err: io::Error) -> Self {
        Error::new(ErrorKind::SpillIo, err.to_string())
    }

    pub(crate) fn commit(err: io::Error) -> Self {
        Error::new(ErrorKind::CommitIo, err.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
