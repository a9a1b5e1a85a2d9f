//! VGM image parsing
//!
//! `parse_vgm(bytes, options)` validates the fixed header of a VGM image,
//! resolves its relative offsets and returns a `VgmContext`. Nothing past
//! the header is decoded up front; the context hands out lazy sequences:
//! - `header()`: `(field, value)` pairs for the version-dependent header.
//! - `metadata()`: the Gd3 strings, when a Gd3 block is present.
//! - `extra_header()`: the v1.70+ chip clock and volume overrides.
//! - `commands()`: the command stream, honouring loop settings.
//!
//! Offset resolution:
//! - A stored offset of `0` means "absent" for the Gd3, loop, data and
//!   extra header offsets.
//! - Each offset is relative to the position of its own field.
//! - Command data starts at 0x40 before v1.50 or when the data offset is
//!   absent. A data offset resolving inside the first 0x40 bytes is an
//!   error.
//! - When command data starts inside the nominal header, the header is
//!   truncated to the words that precede it.
use crate::binutil::{ParseError, read_ident_at, read_u32_le_at};
use crate::diag::{Diagnostic, Diagnostics};
use crate::meta::{Gd3, Gd3Fields};
use crate::vgm::header::{
    HeaderFields, VgmExtraHeader, VgmHeaderField, header_field_count_for_version,
    parse_extra_header,
};
use crate::vgm::stream::{CommandStream, StreamLayout, samples_to_duration};
use std::time::Duration;

/// File identity of every VGM image.
pub const VGM_IDENT: &[u8; 4] = b"Vgm ";
/// Size of the smallest (pre-1.01) header; also the legacy data start.
pub const VGM_MIN_HEADER_SIZE: usize = 0x40;

/// Options for [`parse_vgm`].
///
/// ```
/// use tinyvgm::ParseOptions;
///
/// let options = ParseOptions::new()
///     .loop_count(2)
///     .skip_unknown_commands(true);
/// assert_eq!(options.loop_count, 2);
/// ```
pub struct ParseOptions<'a> {
    /// How many times the command stream rewinds to the loop point.
    pub loop_count: u32,
    /// Skip unknown opcodes as single bytes instead of failing.
    pub skip_unknown_commands: bool,
    /// Called after every rewind with the loops still remaining.
    pub on_loop: Option<Box<dyn FnMut(u32) + 'a>>,
    /// Where advisory diagnostics go.
    pub diagnostics: Diagnostics<'a>,
}

impl Default for ParseOptions<'_> {
    fn default() -> Self {
        Self {
            loop_count: 0,
            skip_unknown_commands: false,
            on_loop: None,
            diagnostics: Diagnostics::log(),
        }
    }
}

impl<'a> ParseOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loop_count(mut self, loop_count: u32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn skip_unknown_commands(mut self, skip: bool) -> Self {
        self.skip_unknown_commands = skip;
        self
    }

    pub fn on_loop(mut self, callback: impl FnMut(u32) + 'a) -> Self {
        self.on_loop = Some(Box::new(callback));
        self
    }

    pub fn diagnostics(mut self, diagnostics: Diagnostics<'a>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

impl std::fmt::Debug for ParseOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseOptions")
            .field("loop_count", &self.loop_count)
            .field("skip_unknown_commands", &self.skip_unknown_commands)
            .field("on_loop", &self.on_loop.is_some())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// A validated VGM image.
///
/// Borrows the input buffer; every sequence it produces yields views into
/// that buffer.
pub struct VgmContext<'a> {
    bytes: &'a [u8],
    version: u32,
    eof_offset: usize,
    gd3_offset: Option<usize>,
    extra_header_offset: Option<usize>,
    command_offset: usize,
    header_field_count: usize,
    has_loop: bool,
    loop_offset: usize,
    loop_samples: u32,
    total_samples: u32,
    loop_count: u32,
    skip_unknown_commands: bool,
    on_loop: Option<Box<dyn FnMut(u32) + 'a>>,
    diagnostics: Diagnostics<'a>,
}

/// Resolve the relative offset stored in `field`; `None` when it is 0.
fn relative_offset(bytes: &[u8], field: VgmHeaderField) -> Result<Option<usize>, ParseError> {
    let raw = read_u32_le_at(bytes, field.offset(), field.name())?;
    Ok((raw != 0).then(|| raw as usize + field.offset()))
}

/// Parse the header of a VGM image held in `bytes`.
///
/// Returns a context on success, or a `ParseError` when the buffer is too
/// short, carries the wrong identity, or has a data offset that cannot be
/// honoured.
pub fn parse_vgm<'a>(bytes: &'a [u8], options: ParseOptions<'a>) -> Result<VgmContext<'a>, ParseError> {
    if bytes.len() < VGM_MIN_HEADER_SIZE {
        return Err(ParseError::HeaderTooShort { len: bytes.len() });
    }

    let ident = read_ident_at(bytes, 0, "ident")?;
    if &ident != VGM_IDENT {
        return Err(ParseError::InvalidIdent(ident));
    }

    let eof_offset = read_u32_le_at(bytes, VgmHeaderField::EofOffset.offset(), "eof_offset")?
        as usize
        + VgmHeaderField::EofOffset.offset();
    let version = read_u32_le_at(bytes, VgmHeaderField::Version.offset(), "version")?;
    let mut header_field_count = header_field_count_for_version(version);

    let gd3_offset = relative_offset(bytes, VgmHeaderField::Gd3Offset)?;
    let total_samples = read_u32_le_at(bytes, VgmHeaderField::TotalSamples.offset(), "total_samples")?;
    let stored_loop_samples =
        read_u32_le_at(bytes, VgmHeaderField::LoopSamples.offset(), "loop_samples")?;

    let mut loop_offset = relative_offset(bytes, VgmHeaderField::LoopOffset)?;
    if let Some(offset) = loop_offset
        && offset >= eof_offset
    {
        options.diagnostics.emit(Diagnostic::LoopOffsetOutOfRange {
            loop_offset: offset,
            eof_offset,
        });
        loop_offset = None;
    }

    let command_offset = if version >= 0x0000_0150 {
        match relative_offset(bytes, VgmHeaderField::DataOffset)? {
            None => VGM_MIN_HEADER_SIZE,
            Some(offset) if offset < VGM_MIN_HEADER_SIZE => {
                return Err(ParseError::InvalidDataOffset { offset });
            }
            Some(offset) => offset,
        }
    } else {
        VGM_MIN_HEADER_SIZE
    };

    // command data may begin inside the nominal header
    header_field_count = header_field_count.min(command_offset / 4);
    if header_field_count * 4 > bytes.len() {
        return Err(ParseError::OffsetOutOfRange {
            offset: 0,
            needed: header_field_count * 4,
            available: bytes.len(),
            context: "header",
        });
    }

    let extra_header_offset =
        if version >= 0x0000_0170 && header_field_count > VgmHeaderField::ExtraHeaderOffset.index() {
            relative_offset(bytes, VgmHeaderField::ExtraHeaderOffset)?
        } else {
            None
        };

    let has_loop = loop_offset.is_some();
    let (loop_offset, loop_samples) = match loop_offset {
        Some(offset) => (offset, stored_loop_samples),
        None => (command_offset, total_samples),
    };

    Ok(VgmContext {
        bytes,
        version,
        eof_offset,
        gd3_offset,
        extra_header_offset,
        command_offset,
        header_field_count,
        has_loop,
        loop_offset,
        loop_samples,
        total_samples,
        loop_count: options.loop_count,
        skip_unknown_commands: options.skip_unknown_commands,
        on_loop: options.on_loop,
        diagnostics: options.diagnostics,
    })
}

impl<'a> VgmContext<'a> {
    /// The buffer this context was parsed from.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Raw BCD format version (`0x171` for 1.71).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Absolute end-of-file offset declared by the header.
    pub fn eof_offset(&self) -> usize {
        self.eof_offset
    }

    pub fn gd3_offset(&self) -> Option<usize> {
        self.gd3_offset
    }

    pub fn extra_header_offset(&self) -> Option<usize> {
        self.extra_header_offset
    }

    /// Absolute position of the first command.
    pub fn command_offset(&self) -> usize {
        self.command_offset
    }

    /// Number of header words in effect, `Identity` included.
    pub fn header_field_count(&self) -> usize {
        self.header_field_count
    }

    /// Whether the header declared a usable loop point.
    pub fn has_loop(&self) -> bool {
        self.has_loop
    }

    /// Absolute loop position. Without a loop this is the command offset.
    pub fn loop_offset(&self) -> usize {
        self.loop_offset
    }

    /// Samples in one loop pass. Without a loop this is the total.
    pub fn loop_samples(&self) -> u32 {
        self.loop_samples
    }

    pub fn total_samples(&self) -> u32 {
        self.total_samples
    }

    /// Play time of one pass through the file, without loops.
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.total_samples as u64)
    }

    /// Loops used by [`commands`](Self::commands).
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn set_loop_count(&mut self, loop_count: u32) {
        self.loop_count = loop_count;
    }

    /// Header words from `EofOffset` up to the effective header size.
    pub fn header(&self) -> HeaderFields<'a> {
        HeaderFields::new(self.bytes, self.header_field_count)
    }

    /// Value of a single header word, if it is part of the effective header.
    pub fn header_value(&self, field: VgmHeaderField) -> Option<u32> {
        if field.index() >= self.header_field_count {
            return None;
        }
        read_u32_le_at(self.bytes, field.offset(), field.name()).ok()
    }

    /// Lazy Gd3 strings; `None` when the header declares no Gd3 block.
    pub fn metadata(&self) -> Option<Gd3Fields<'a>> {
        self.gd3_offset
            .map(|start| Gd3Fields::new(self.bytes, start, self.diagnostics.clone()))
    }

    /// Collect the Gd3 block into owned strings.
    pub fn gd3(&self) -> Result<Option<Gd3>, ParseError> {
        self.metadata().map(Gd3::from_fields).transpose()
    }

    /// Decode the extra header; `None` when the image has none.
    pub fn extra_header(&self) -> Result<Option<VgmExtraHeader>, ParseError> {
        self.extra_header_offset
            .map(|start| parse_extra_header(self.bytes, start))
            .transpose()
    }

    fn layout(&self) -> StreamLayout {
        StreamLayout {
            command_offset: self.command_offset,
            eof_offset: self.eof_offset,
            loop_offset: self.loop_offset,
            loop_samples: self.loop_samples,
            total_samples: self.total_samples,
        }
    }

    /// Walk the command stream with the configured loop count.
    ///
    /// Each call starts a fresh traversal. The loop callback is borrowed
    /// for the lifetime of the stream, so only one traversal can be live.
    pub fn commands(&mut self) -> CommandStream<'_, 'a> {
        let loops = self.loop_count;
        self.commands_with_loops(loops)
    }

    /// Walk the command stream, rewinding `loop_count` times.
    pub fn commands_with_loops(&mut self, loop_count: u32) -> CommandStream<'_, 'a> {
        let layout = self.layout();
        CommandStream::new(
            self.bytes,
            layout,
            loop_count,
            self.skip_unknown_commands,
            self.on_loop.as_deref_mut(),
            self.diagnostics.clone(),
        )
    }
}

impl std::fmt::Debug for VgmContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VgmContext")
            .field("len", &self.bytes.len())
            .field("version", &self.version)
            .field("eof_offset", &self.eof_offset)
            .field("gd3_offset", &self.gd3_offset)
            .field("extra_header_offset", &self.extra_header_offset)
            .field("command_offset", &self.command_offset)
            .field("header_field_count", &self.header_field_count)
            .field("has_loop", &self.has_loop)
            .field("loop_offset", &self.loop_offset)
            .field("loop_samples", &self.loop_samples)
            .field("total_samples", &self.total_samples)
            .field("loop_count", &self.loop_count)
            .finish_non_exhaustive()
    }
}

/// Parse with default options.
impl<'a> TryFrom<&'a [u8]> for VgmContext<'a> {
    type Error = ParseError;

    fn try_from(bytes: &'a [u8]) -> Result<Self, Self::Error> {
        parse_vgm(bytes, ParseOptions::default())
    }
}
