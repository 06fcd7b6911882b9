//! Error types for header decoding.

use core::fmt;

/// An error encountered while reading a normalized-count or Huffman weight
/// header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The input is empty or shorter than the length it declares itself.
    SrcSizeWrong,
    /// A structural or arithmetic invariant of the header was violated.
    CorruptedHeader,
    /// The decoded table log exceeds the maximum allowed in this context.
    TableLogTooLarge,
    /// The requested maximum symbol value does not fit into the provided
    /// counts buffer.
    MaxSymbolTooLarge,
    /// The header references a symbol beyond the requested maximum symbol
    /// value.
    MaxSymbolTooSmall,
    /// The destination buffer is too small to hold the decoded data.
    DstSizeTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SrcSizeWrong => f.write_str("src size is incorrect"),
            Self::CorruptedHeader => f.write_str("corrupted header detected"),
            Self::TableLogTooLarge => f.write_str("table log requires too much memory"),
            Self::MaxSymbolTooLarge => f.write_str("unsupported max symbol value: too large"),
            Self::MaxSymbolTooSmall => f.write_str("specified max symbol value is too small"),
            Self::DstSizeTooSmall => f.write_str("destination buffer is too small"),
        }
    }
}

impl core::error::Error for Error {}

/// Result type for header decoding operations.
pub type Result<T> = core::result::Result<T, Error>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

pub(crate) use bail;
