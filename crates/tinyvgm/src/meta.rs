//! Gd3 metadata decoding.
//!
//! The Gd3 chunk consists of a four-byte identifier (`"Gd3 "`), a 32-bit
//! little-endian version, a 32-bit little-endian text length, and up to
//! eleven UTF-16LE nul-terminated strings in a fixed order.
//!
//! `Gd3Fields` walks the strings lazily and yields borrowed UTF-16 views.
//! `Gd3` collects a whole chunk into owned strings.
use crate::binutil::{ParseError, read_ident_at, read_slice, read_u16_le_at, read_u32_le_at};
use crate::diag::{Diagnostic, Diagnostics};
use std::iter::FusedIterator;
use std::string::FromUtf16Error;

/// Gd3 metadata fields, in on-disk order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gd3Field {
    TitleEn,
    Title,
    AlbumEn,
    Album,
    SystemNameEn,
    SystemName,
    ComposerEn,
    Composer,
    ReleaseDate,
    Converter,
    Notes,
}

impl Gd3Field {
    pub const ALL: [Gd3Field; 11] = [
        Gd3Field::TitleEn,
        Gd3Field::Title,
        Gd3Field::AlbumEn,
        Gd3Field::Album,
        Gd3Field::SystemNameEn,
        Gd3Field::SystemName,
        Gd3Field::ComposerEn,
        Gd3Field::Composer,
        Gd3Field::ReleaseDate,
        Gd3Field::Converter,
        Gd3Field::Notes,
    ];

    /// Number of real fields; one past the last index.
    pub const MAX: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Gd3Field::TitleEn => "Title_EN",
            Gd3Field::Title => "Title",
            Gd3Field::AlbumEn => "Album_EN",
            Gd3Field::Album => "Album",
            Gd3Field::SystemNameEn => "SystemName_EN",
            Gd3Field::SystemName => "SystemName",
            Gd3Field::ComposerEn => "Composer_EN",
            Gd3Field::Composer => "Composer",
            Gd3Field::ReleaseDate => "ReleaseDate",
            Gd3Field::Converter => "Converter",
            Gd3Field::Notes => "Notes",
        }
    }
}

const GD3_IDENT: &[u8; 4] = b"Gd3 ";
const GD3_PREAMBLE_LEN: usize = 12;

/// One metadata string as stored: UTF-16LE bytes without the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gd3Entry<'a> {
    pub field: Gd3Field,
    /// Absolute position of the first byte of the string.
    pub offset: usize,
    pub data: &'a [u8],
}

impl Gd3Entry<'_> {
    fn code_units(&self) -> impl Iterator<Item = u16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Decode the string, failing on unpaired surrogates.
    pub fn text(&self) -> Result<String, FromUtf16Error> {
        let units: Vec<u16> = self.code_units().collect();
        String::from_utf16(&units)
    }

    /// Decode the string, replacing invalid code units with U+FFFD.
    pub fn text_lossy(&self) -> String {
        let units: Vec<u16> = self.code_units().collect();
        String::from_utf16_lossy(&units)
    }
}

/// Lazy sequence over the strings of one Gd3 chunk.
///
/// Created by `VgmContext::metadata()`. The chunk preamble is validated on
/// the first call to `next`.
#[derive(Debug, Clone)]
pub struct Gd3Fields<'a> {
    bytes: &'a [u8],
    start: usize,
    cursor: usize,
    /// End of the text block; `None` until the preamble has been read.
    end: Option<usize>,
    version: Option<u32>,
    index: usize,
    done: bool,
    diagnostics: Diagnostics<'a>,
}

impl<'a> Gd3Fields<'a> {
    pub(crate) fn new(bytes: &'a [u8], start: usize, diagnostics: Diagnostics<'a>) -> Self {
        Self {
            bytes,
            start,
            cursor: start,
            end: None,
            version: None,
            index: 0,
            done: false,
            diagnostics,
        }
    }

    /// Gd3 version, once the preamble has been read.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    fn read_preamble(&mut self) -> Result<usize, ParseError> {
        let ident = read_ident_at(self.bytes, self.start, "gd3 ident")?;
        if &ident != GD3_IDENT {
            return Err(ParseError::InvalidGd3Ident(ident));
        }

        let version = read_u32_le_at(self.bytes, self.start + 4, "gd3 version")?;
        self.version = Some(version);
        self.diagnostics.emit(Diagnostic::Gd3Version { version });

        let length = read_u32_le_at(self.bytes, self.start + 8, "gd3 length")? as usize;
        let cursor = self.start + GD3_PREAMBLE_LEN;
        // the whole text block must be addressable
        read_slice(self.bytes, cursor, length, "gd3 text")?;
        self.cursor = cursor;
        Ok(cursor + length)
    }

    fn step(&mut self) -> Result<Option<Gd3Entry<'a>>, ParseError> {
        let end = match self.end {
            Some(end) => end,
            None => {
                let end = self.read_preamble()?;
                self.end = Some(end);
                end
            }
        };

        let cursor = self.cursor;
        if cursor >= end {
            return Ok(None);
        }

        let Some(field) = Gd3Field::from_index(self.index) else {
            let rest = read_slice(self.bytes, cursor, end - cursor, "gd3 text")?;
            if rest.iter().all(|&b| b == 0) {
                self.diagnostics.emit(Diagnostic::Gd3TrailingPadding {
                    offset: cursor,
                    len: rest.len(),
                });
                return Ok(None);
            }
            return Err(ParseError::Gd3FieldOverflow {
                index: self.index,
                offset: cursor,
            });
        };

        let mut len = 0;
        loop {
            if cursor + len + 2 > end {
                return Err(ParseError::UnterminatedGd3String { offset: cursor });
            }
            if read_u16_le_at(self.bytes, cursor + len, "gd3 text")? == 0 {
                break;
            }
            len += 2;
        }

        let data = read_slice(self.bytes, cursor, len, "gd3 text")?;
        self.cursor = cursor + len + 2;
        self.index += 1;
        Ok(Some(Gd3Entry {
            field,
            offset: cursor,
            data,
        }))
    }
}

impl<'a> Iterator for Gd3Fields<'a> {
    type Item = Result<Gd3Entry<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Gd3Fields<'_> {}

/// Owned Gd3 metadata. Empty strings are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gd3 {
    pub track_name_en: Option<String>,
    pub track_name_jp: Option<String>,
    pub game_name_en: Option<String>,
    pub game_name_jp: Option<String>,
    pub system_name_en: Option<String>,
    pub system_name_jp: Option<String>,
    pub author_name_en: Option<String>,
    pub author_name_jp: Option<String>,
    pub release_date: Option<String>,
    pub creator: Option<String>,
    pub notes: Option<String>,
    /// The Gd3 chunk version (raw, e.g. 0x00000100 for 1.00)
    pub version: u32,
}

impl Gd3 {
    /// Drain `fields` into an owned `Gd3`, stopping at the first error.
    pub fn from_fields(mut fields: Gd3Fields<'_>) -> Result<Self, ParseError> {
        let mut gd3 = Gd3::default();
        for entry in fields.by_ref() {
            let entry = entry?;
            let text = entry.text_lossy();
            *gd3.slot(entry.field) = (!text.is_empty()).then_some(text);
        }
        gd3.version = fields.version().unwrap_or_default();
        Ok(gd3)
    }

    /// The value stored for `field`.
    pub fn get(&self, field: Gd3Field) -> Option<&str> {
        let value = match field {
            Gd3Field::TitleEn => &self.track_name_en,
            Gd3Field::Title => &self.track_name_jp,
            Gd3Field::AlbumEn => &self.game_name_en,
            Gd3Field::Album => &self.game_name_jp,
            Gd3Field::SystemNameEn => &self.system_name_en,
            Gd3Field::SystemName => &self.system_name_jp,
            Gd3Field::ComposerEn => &self.author_name_en,
            Gd3Field::Composer => &self.author_name_jp,
            Gd3Field::ReleaseDate => &self.release_date,
            Gd3Field::Converter => &self.creator,
            Gd3Field::Notes => &self.notes,
        };
        value.as_deref()
    }

    fn slot(&mut self, field: Gd3Field) -> &mut Option<String> {
        match field {
            Gd3Field::TitleEn => &mut self.track_name_en,
            Gd3Field::Title => &mut self.track_name_jp,
            Gd3Field::AlbumEn => &mut self.game_name_en,
            Gd3Field::Album => &mut self.game_name_jp,
            Gd3Field::SystemNameEn => &mut self.system_name_en,
            Gd3Field::SystemName => &mut self.system_name_jp,
            Gd3Field::ComposerEn => &mut self.author_name_en,
            Gd3Field::Composer => &mut self.author_name_jp,
            Gd3Field::ReleaseDate => &mut self.release_date,
            Gd3Field::Converter => &mut self.creator,
            Gd3Field::Notes => &mut self.notes,
        }
    }
}

/// Decode a Gd3 chunk that starts at offset 0 of `bytes`.
impl TryFrom<&[u8]> for Gd3 {
    type Error = ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Gd3::from_fields(Gd3Fields::new(bytes, 0, Diagnostics::log()))
    }
}
