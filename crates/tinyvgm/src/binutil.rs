//! Utilities used by the decoders: parse error type and bounds-checked
//! little-endian byte readers.
use thiserror::Error;

/// Broad classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The buffer is not a well-formed VGM image (bad magic, bad offsets,
    /// malformed GD3 block).
    Format,
    /// A payload, sub-header or read ran past the end of the data.
    Truncation,
    /// The command stream contained an opcode with no known length.
    UnknownOpcode,
}

/// Error type returned by every decoder in this crate.
///
/// All variants are fatal for the sequence that produced them: a lazy
/// sequence yields the error once and is exhausted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer is shorter than the minimum 0x40-byte VGM header.
    #[error("buffer too short for a VGM header: {len} bytes (need at least 0x40)")]
    HeaderTooShort { len: usize },

    /// The four-byte file identity did not match `"Vgm "`.
    ///
    /// The contained array is the raw 4 bytes that were read.
    #[error("invalid VGM ident: {0:?}")]
    InvalidIdent([u8; 4]),

    /// A version 1.50+ data offset resolves inside the minimum header.
    ///
    /// `offset` is the absolute command-data start computed from the field.
    #[error("invalid VGM data offset: command data would start at 0x{offset:X}")]
    InvalidDataOffset { offset: usize },

    /// The GD3 block did not start with `"Gd3 "`.
    #[error("invalid GD3 ident: {0:?}")]
    InvalidGd3Ident([u8; 4]),

    /// More GD3 text remained after the last known metadata field.
    #[error("unknown GD3 metadata type 0x{index:02X} at offset 0x{offset:X}")]
    Gd3FieldOverflow { index: usize, offset: usize },

    /// A GD3 string was not terminated before the end of the text block.
    #[error("unterminated GD3 string at offset 0x{offset:X}")]
    UnterminatedGd3String { offset: usize },

    /// A command payload would reach or cross the end-of-file offset.
    ///
    /// - `offset` is the position of the opcode.
    /// - `end` is the computed end of the payload (exclusive).
    /// - `eof` is the absolute end-of-file offset from the header.
    #[error("unexpected end of VGM {context} at 0x{offset:X}: ends at 0x{end:X}, eof is 0x{eof:X}")]
    Truncated {
        offset: usize,
        end: usize,
        eof: usize,
        context: &'static str,
    },

    /// An opcode byte has no entry in the command length table.
    #[error("unknown VGM command 0x{opcode:02X} at offset 0x{offset:X}")]
    UnknownOpcode { opcode: u8, offset: usize },

    /// An attempted read was outside the available buffer range.
    ///
    /// - `offset` is the index that was attempted to be accessed.
    /// - `needed` is the number of bytes required for the operation.
    /// - `available` is the current buffer length.
    /// - `context` describes the logical location (for example
    ///   `"extra_header"` or `"gd3"`) where the access was attempted.
    #[error("offset out of range at {context}: 0x{offset:X} (needed {needed} bytes, available {available})")]
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: &'static str,
    },
}

impl ParseError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::HeaderTooShort { .. }
            | ParseError::InvalidIdent(_)
            | ParseError::InvalidDataOffset { .. }
            | ParseError::InvalidGd3Ident(_)
            | ParseError::Gd3FieldOverflow { .. }
            | ParseError::UnterminatedGd3String { .. } => ErrorKind::Format,
            ParseError::Truncated { .. } | ParseError::OffsetOutOfRange { .. } => {
                ErrorKind::Truncation
            }
            ParseError::UnknownOpcode { .. } => ErrorKind::UnknownOpcode,
        }
    }
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
///
/// Returns `Err(ParseError::OffsetOutOfRange)` when the requested range
/// exceeds the available buffer.
pub(crate) fn read_slice<'a>(
    bytes: &'a [u8],
    off: usize,
    len: usize,
    context: &'static str,
) -> Result<&'a [u8], ParseError> {
    off.checked_add(len)
        .and_then(|end| bytes.get(off..end))
        .ok_or(ParseError::OffsetOutOfRange {
            offset: off,
            needed: len,
            // Report the remaining number of bytes from `off` to the end of the buffer.
            available: bytes.len().saturating_sub(off),
            context,
        })
}

/// Read a single byte from `bytes` at `off`.
pub(crate) fn read_u8_at(bytes: &[u8], off: usize, context: &'static str) -> Result<u8, ParseError> {
    read_slice(bytes, off, 1, context).map(|s| s[0])
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
pub(crate) fn read_u16_le_at(
    bytes: &[u8],
    off: usize,
    context: &'static str,
) -> Result<u16, ParseError> {
    let s = read_slice(bytes, off, 2, context)?;
    Ok(u16::from_le_bytes([s[0], s[1]]))
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
pub(crate) fn read_u32_le_at(
    bytes: &[u8],
    off: usize,
    context: &'static str,
) -> Result<u32, ParseError> {
    let s = read_slice(bytes, off, 4, context)?;
    Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

/// Read a four-byte identifier at `off`.
pub(crate) fn read_ident_at(
    bytes: &[u8],
    off: usize,
    context: &'static str,
) -> Result<[u8; 4], ParseError> {
    let s = read_slice(bytes, off, 4, context)?;
    Ok([s[0], s[1], s[2], s[3]])
}
