//! Error types for tag trees, the binary codec and the mapping compiler.
//!
//! Every fallible operation in this crate returns [`Result`]. The variants
//! fall into a few families:
//!
//! - stream errors: [`Error::Io`] and [`Error::EndOfStream`]
//! - format errors: [`Error::InvalidTagType`], [`Error::NegativeLength`],
//!   [`Error::TagMismatch`] and [`Error::Format`] (see [`Error::is_format_error`])
//! - misuse: [`Error::InvalidOperation`], [`Error::InvalidReaderState`],
//!   [`Error::Argument`] and [`Error::InvalidCast`]
//! - mapping: [`Error::NullValue`]
//!
//! # Example
//!
//! ```
//! use nbt_tree::{Compression, Error, NbtFile};
//!
//! let mut file = NbtFile::new();
//! match file.load_from_buffer(&[0x0A, 0x00], Compression::None, None) {
//!     Err(Error::EndOfStream) => println!("data was truncated"),
//!     Err(e) if e.is_format_error() => println!("not NBT: {e}"),
//!     Err(e) => println!("other failure: {e}"),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use std::io;

use crate::TagKind;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// This type represents all possible errors of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error other than a premature end of input.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// The input ended before the format said it would.
    ///
    /// The bytes consumed so far were well-formed; there were just not
    /// enough of them (for example a string length overrunning the buffer).
    #[error("unexpected end of stream")]
    EndOfStream,

    /// A byte outside 0-12 was found where a tag type was expected.
    #[error("invalid NBT tag type: {0:#04x}")]
    InvalidTagType(u8),

    /// An array or list declared a negative length.
    #[error("negative length given: {0}")]
    NegativeLength(i32),

    /// A tag kind did not match the kind required by its container.
    #[error("tag kind mismatch: expected {expected}, got {found}")]
    TagMismatch { expected: TagKind, found: TagKind },

    /// Any other violation of the binary grammar or of the writer's
    /// nesting rules.
    #[error("NBT format error: {0}")]
    Format(String),

    /// A call was made in a context where it makes no sense.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The reader hit malformed input earlier and can no longer be used.
    #[error("invalid operation: reader is in an erroneous state after a format error")]
    InvalidReaderState,

    /// A caller-supplied value violates a precondition.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// A value of one tag kind was requested as an incompatible type.
    #[error("cannot convert {from} to {to}")]
    InvalidCast { from: TagKind, to: &'static str },

    /// A member whose null policy is `Error` held no value.
    #[error("null value in member `{member}` of `{type_name}`")]
    NullValue {
        type_name: &'static str,
        member: String,
    },
}

impl Error {
    /// Returns `true` for the variants describing a malformed byte stream.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidTagType(_)
                | Error::NegativeLength(_)
                | Error::TagMismatch { .. }
                | Error::Format(_)
        )
    }

    /// Returns `true` when the error leaves a stream at an unknown position.
    pub(crate) fn corrupts_stream(&self) -> bool {
        self.is_format_error() || matches!(self, Error::Io(_) | Error::EndOfStream)
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation(message.into())
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Error::EndOfStream
        } else {
            Error::Io(error)
        }
    }
}
