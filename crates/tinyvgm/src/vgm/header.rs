//! VGM header and extra-header decoding
//!
//! This module defines:
//! - `VgmHeaderField`: the fixed, ordered enumeration of 32-bit header
//!   words, with their index and on-disk byte offset.
//! - `header_field_count_for_version`: the number of header words each
//!   format version defines.
//! - `HeaderFields`: a lazy, restartable sequence of `(field, value)`
//!   pairs over a resolved header.
//! - `VgmExtraHeader`: the v1.70+ extra header with per-chip clock and
//!   volume overrides, and its decoder.
use crate::binutil::{ParseError, read_u8_at, read_u16_le_at, read_u32_le_at};
use std::iter::FusedIterator;

macro_rules! header_fields {
    ($($variant:ident => $name:literal,)*) => {
        /// Enum identifying the 32-bit header words, in on-disk order.
        ///
        /// The discriminant is the word index; the byte offset is
        /// `index * 4`.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum VgmHeaderField {
            $($variant,)*
        }

        impl VgmHeaderField {
            /// Every field in index order.
            pub const ALL: &'static [VgmHeaderField] = &[$(VgmHeaderField::$variant,)*];

            /// Name of the field as used in the VGM format documentation.
            pub fn name(self) -> &'static str {
                match self {
                    $(VgmHeaderField::$variant => $name,)*
                }
            }
        }
    };
}

header_fields! {
    // 0x00
    Identity => "Identity",
    EofOffset => "EoF_Offset",
    Version => "Version",
    Sn76489Clock => "SN76489_Clock",
    // 0x10
    Ym2413Clock => "YM2413_Clock",
    Gd3Offset => "GD3_Offset",
    TotalSamples => "Total_Samples",
    LoopOffset => "Loop_Offset",
    // 0x20
    LoopSamples => "Loop_Samples",
    Rate => "Rate",
    SnConfig => "SN_Config",
    Ym2612Clock => "YM2612_Clock",
    // 0x30
    Ym2151Clock => "YM2151_Clock",
    DataOffset => "Data_Offset",
    SegaPcmClock => "SegaPCM_Clock",
    SpcmInterface => "SPCM_Interface",
    // 0x40
    Rf5c68Clock => "RF5C68_Clock",
    Ym2203Clock => "YM2203_Clock",
    Ym2608Clock => "YM2608_Clock",
    Ym2610Clock => "YM2610_Clock",
    // 0x50
    Ym3812Clock => "YM3812_Clock",
    Ym3526Clock => "YM3526_Clock",
    Y8950Clock => "Y8950_Clock",
    Ymf262Clock => "YMF262_Clock",
    // 0x60
    Ymf278bClock => "YMF278B_Clock",
    Ymf271Clock => "YMF271_Clock",
    Ymz280bClock => "YMZ280B_Clock",
    Rf5c164Clock => "RF5C164_Clock",
    // 0x70
    PwmClock => "PWM_Clock",
    Ay8910Clock => "AY8910_Clock",
    AyConfig => "AY_Config",
    PlaybackConfig => "Playback_Config",
    // 0x80
    GbDmgClock => "GBDMG_Clock",
    NesApuClock => "NESAPU_Clock",
    MultiPcmClock => "MultiPCM_Clock",
    Upd7759Clock => "uPD7759_Clock",
    // 0x90
    Okim6258Clock => "OKIM6258_Clock",
    ArcadeChipsConfig => "ArcadeChips_Config",
    Okim6295Clock => "OKIM6295_Clock",
    K051649Clock => "K051649_Clock",
    // 0xA0
    K054539Clock => "K054539_Clock",
    Huc6280Clock => "HuC6280_Clock",
    C140Clock => "C140_Clock",
    K053260Clock => "K053260_Clock",
    // 0xB0
    PokeyClock => "Pokey_Clock",
    QsoundClock => "QSound_Clock",
    ScspClock => "SCSP_Clock",
    ExtraHeaderOffset => "ExtraHeader_Offset",
    // 0xC0
    WonderSwanClock => "WonderSwan_Clock",
    VsuClock => "VSU_Clock",
    Saa1099Clock => "SAA1099_Clock",
    Es5503Clock => "ES5503_Clock",
    // 0xD0
    Es5506Clock => "ES5506_Clock",
    EsConfig => "ES_Config",
    X1010Clock => "X1010_Clock",
    C352Clock => "C352_Clock",
    // 0xE0
    Ga20Clock => "GA20_Clock",
    MikeyClock => "Mikey_Clock",
}

impl VgmHeaderField {
    /// Number of real header fields; one past the last index.
    pub const MAX: usize = Self::ALL.len();

    /// Word index of this field.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Absolute byte offset of this field in the file.
    pub fn offset(self) -> usize {
        self.index() * 4
    }

    /// Field at word index `index`, or `None` at or past [`Self::MAX`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Number of header words defined by format `version`.
///
/// The result is an exclusive bound: fields `0..count` exist. It is the
/// nominal size only; the parser may shrink it further when command data
/// starts inside the nominal header.
pub fn header_field_count_for_version(version: u32) -> usize {
    if version < 0x0000_0101 {
        VgmHeaderField::Rate.index()
    } else if version < 0x0000_0110 {
        VgmHeaderField::Ym2612Clock.index()
    } else if version < 0x0000_0150 {
        VgmHeaderField::DataOffset.index()
    } else if version < 0x0000_0151 {
        VgmHeaderField::SegaPcmClock.index()
    } else {
        VgmHeaderField::MAX
    }
}

/// Render a BCD version number the way VGM tools print it (`0x171` → `"1.71"`).
pub fn format_version(version: u32) -> String {
    format!("{:x}.{:02x}", version >> 8, version & 0xFF)
}

/// One decoded header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEntry {
    pub field: VgmHeaderField,
    pub value: u32,
}

/// Lazy sequence of header words, starting after `Identity`.
///
/// Created by `VgmContext::header()`. The parser has already checked that
/// every word up to `end` lies inside the buffer.
#[derive(Debug, Clone)]
pub struct HeaderFields<'a> {
    bytes: &'a [u8],
    index: usize,
    end: usize,
}

impl<'a> HeaderFields<'a> {
    pub(crate) fn new(bytes: &'a [u8], end: usize) -> Self {
        Self {
            bytes,
            index: VgmHeaderField::EofOffset.index(),
            end,
        }
    }
}

impl Iterator for HeaderFields<'_> {
    type Item = HeaderEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.end {
            return None;
        }
        let field = VgmHeaderField::from_index(self.index)?;
        let value = read_u32_le_at(self.bytes, field.offset(), "header").ok()?;
        self.index += 1;
        Some(HeaderEntry { field, value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.index);
        (n, Some(n))
    }
}

impl ExactSizeIterator for HeaderFields<'_> {}
impl FusedIterator for HeaderFields<'_> {}

/// Chip clock override from the extra header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipClock {
    /// Chip ID, in main-header chip order.
    pub chip_id: u8,
    pub clock: u32,
}

/// Chip volume override from the extra header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipVolume {
    pub chip_id: u8,
    pub flags: u8,
    /// Bit 15 of the stored word: the volume is relative to the default.
    pub relative: bool,
    /// Bits 0..=14 of the stored word.
    pub volume: u16,
}

/// Extra header introduced in VGM v1.70.
///
/// Format summary:
/// - 32-bit LE block size
/// - 32-bit LE offset to the chip-clock table, relative to this field
/// - 32-bit LE offset to the chip-volume table, relative to this field
///
/// Each table is one count byte followed by its records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VgmExtraHeader {
    pub chip_clocks: Vec<ChipClock>,
    pub chip_volumes: Vec<ChipVolume>,
}

const EXTRA_CLOCK_OFFSET_FIELD: usize = 4;
const EXTRA_VOLUME_OFFSET_FIELD: usize = 8;
const CHIP_CLOCK_RECORD_LEN: usize = 5;
const CHIP_VOLUME_RECORD_LEN: usize = 4;

/// Decode the extra header that starts at absolute offset `start`.
///
/// A sub-table is present when the block is large enough to hold its
/// offset field and that offset is at least 4. Absent tables, and tables
/// with a zero count, yield empty lists.
pub(crate) fn parse_extra_header(bytes: &[u8], start: usize) -> Result<VgmExtraHeader, ParseError> {
    let size = read_u32_le_at(bytes, start, "extra_header size")?;
    let mut extra = VgmExtraHeader::default();

    if size >= 8
        && let Some(base) = sub_table_base(bytes, start, EXTRA_CLOCK_OFFSET_FIELD)?
    {
        let count = read_u8_at(bytes, base, "extra_header chip_clock count")?;
        let mut cur = base + 1;
        for _ in 0..count {
            let chip_id = read_u8_at(bytes, cur, "extra_header chip_clock")?;
            let clock = read_u32_le_at(bytes, cur + 1, "extra_header chip_clock")?;
            extra.chip_clocks.push(ChipClock { chip_id, clock });
            cur += CHIP_CLOCK_RECORD_LEN;
        }
    }

    if size >= 12
        && let Some(base) = sub_table_base(bytes, start, EXTRA_VOLUME_OFFSET_FIELD)?
    {
        let count = read_u8_at(bytes, base, "extra_header chip_volume count")?;
        let mut cur = base + 1;
        for _ in 0..count {
            let chip_id = read_u8_at(bytes, cur, "extra_header chip_volume")?;
            let flags = read_u8_at(bytes, cur + 1, "extra_header chip_volume")?;
            let raw = read_u16_le_at(bytes, cur + 2, "extra_header chip_volume")?;
            extra.chip_volumes.push(ChipVolume {
                chip_id,
                flags,
                relative: raw & 0x8000 != 0,
                volume: raw & 0x7FFF,
            });
            cur += CHIP_VOLUME_RECORD_LEN;
        }
    }

    Ok(extra)
}

/// Absolute position of a sub-table's count byte, or `None` when the
/// table is absent.
fn sub_table_base(bytes: &[u8], start: usize, field: usize) -> Result<Option<usize>, ParseError> {
    let field_pos = start + field;
    let rel = read_u32_le_at(bytes, field_pos, "extra_header table offset")?;
    if rel < 4 {
        return Ok(None);
    }
    field_pos
        .checked_add(rel as usize)
        .map(Some)
        .ok_or(ParseError::OffsetOutOfRange {
            offset: field_pos,
            needed: rel as usize,
            available: bytes.len().saturating_sub(field_pos),
            context: "extra_header table offset",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_indices_follow_the_byte_layout() {
        assert_eq!(VgmHeaderField::EofOffset.offset(), 0x04);
        assert_eq!(VgmHeaderField::Gd3Offset.offset(), 0x14);
        assert_eq!(VgmHeaderField::LoopOffset.offset(), 0x1C);
        assert_eq!(VgmHeaderField::DataOffset.offset(), 0x34);
        assert_eq!(VgmHeaderField::ExtraHeaderOffset.offset(), 0xBC);
        assert_eq!(VgmHeaderField::MikeyClock.offset(), 0xE4);
        assert_eq!(VgmHeaderField::MAX, 58);
    }

    #[test]
    fn from_index_round_trips_every_field() {
        for (i, field) in VgmHeaderField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(VgmHeaderField::from_index(i), Some(*field));
        }
        assert_eq!(VgmHeaderField::from_index(VgmHeaderField::MAX), None);
    }

    #[test]
    fn versions_print_as_bcd() {
        assert_eq!(format_version(0x0000_0171), "1.71");
        assert_eq!(format_version(0x0000_0101), "1.01");
    }
}
