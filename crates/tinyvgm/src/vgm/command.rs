//! VGM command records and the opcode length table.
//!
//! Commands are not interpreted as chip register writes here; a
//! `VgmCommand` is the opcode, a zero-copy view of its payload and the
//! number of samples it advances playback by.

/// Opcode that ends the command stream.
pub const END_OF_DATA: u8 = 0x66;
/// Opcode of the variable-length data block command.
pub const DATA_BLOCK: u8 = 0x67;
/// Samples advanced by opcode 0x62 (one 60 Hz frame at 44.1 kHz).
pub const WAIT_735_SAMPLES: u32 = 735;
/// Samples advanced by opcode 0x63 (one 50 Hz frame at 44.1 kHz).
pub const WAIT_882_SAMPLES: u32 = 882;

/// Length-table sentinel for opcodes with no known length.
pub const LENGTH_UNKNOWN: i8 = -1;
/// Length-table sentinel for the data block opcode.
pub const LENGTH_DATA_BLOCK: i8 = -2;

/// Payload length in bytes (excluding the opcode) for every opcode.
///
/// `-1` marks an unknown opcode, `-2` marks the data block whose length
/// is encoded in its own sub-header.
#[rustfmt::skip]
pub const VGM_CMD_LENGTH_TABLE: [i8; 256] = [
//  0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // 00 - 0F
   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // 10 - 1F
   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // 20 - 2F
   -1,  1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // 30 - 3F
    2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,  1, // 40 - 4F
    1,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2, // 50 - 5F
   -1,  2,  0,  0, -1, -1,  0, -2, 11, -1, -1, -1, -1, -1, -1, -1, // 60 - 6F
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 70 - 7F
    0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0, // 80 - 8F
    4,  4,  5, 10,  1,  4, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // 90 - 9F
    2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2, // A0 - AF
    2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2,  2, // B0 - BF
    3,  3,  3,  3,  3,  3,  3,  3,  3, -1, -1, -1, -1, -1, -1, -1, // C0 - CF
    3,  3,  3,  3,  3,  3,  3, -1, -1, -1, -1, -1, -1, -1, -1, -1, // D0 - DF
    4,  4, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // E0 - EF
   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, // F0 - FF
];

/// Decoded meaning of a length-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLength {
    /// No command uses this opcode.
    Unknown,
    /// Data block: a 6-byte sub-header followed by a declared payload.
    DataBlock,
    /// Fixed payload of this many bytes (0 for opcode-only commands).
    Fixed(usize),
}

impl CommandLength {
    /// Look up `opcode` in [`VGM_CMD_LENGTH_TABLE`].
    pub fn of(opcode: u8) -> Self {
        match VGM_CMD_LENGTH_TABLE[opcode as usize] {
            LENGTH_DATA_BLOCK => CommandLength::DataBlock,
            n if n >= 0 => CommandLength::Fixed(n as usize),
            _ => CommandLength::Unknown,
        }
    }
}

/// Samples a command advances playback by.
///
/// `data` is the command's payload; only opcode 0x61 reads it.
pub fn sample_increment(opcode: u8, data: Option<&[u8]>) -> u32 {
    match opcode {
        0x61 => match data {
            Some([lo, hi, ..]) => u16::from_le_bytes([*lo, *hi]) as u32,
            _ => 0,
        },
        0x62 => WAIT_735_SAMPLES,
        0x63 => WAIT_882_SAMPLES,
        0x70..=0x8F => (opcode & 0x0F) as u32 + 1,
        _ => 0,
    }
}

/// Size of the data block sub-header that follows opcode 0x67:
/// compatibility byte (0x66), sub-type, 32-bit LE payload length.
pub const DATA_BLOCK_HEADER_LEN: usize = 6;

/// One decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VgmCommand<'a> {
    /// Absolute position of the opcode byte.
    pub offset: usize,
    pub opcode: u8,
    /// Bytes after the opcode. For data blocks this is the whole
    /// sub-header plus payload; `None` for opcode-only commands.
    pub data: Option<&'a [u8]>,
    /// Data block sub-type; only set for opcode 0x67.
    pub block_type: Option<u8>,
    /// Samples this command advanced playback by.
    pub samples: u32,
}

impl<'a> VgmCommand<'a> {
    pub fn is_data_block(&self) -> bool {
        self.opcode == DATA_BLOCK
    }

    /// Payload of a data block without its 6-byte sub-header.
    pub fn block_payload(&self) -> Option<&'a [u8]> {
        if !self.is_data_block() {
            return None;
        }
        self.data.and_then(|d| d.get(DATA_BLOCK_HEADER_LEN..))
    }

    /// Classification of a data block's sub-type.
    pub fn block_kind(&self) -> Option<DataBlockKind> {
        self.block_type.map(DataBlockKind::from)
    }
}

/// Data block categories, by sub-type range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBlockKind {
    /// 0x00..=0x3F: PCM/ADPCM stream data for the chip in the low bits.
    UncompressedStream(u8),
    /// 0x40..=0x7E: compressed stream data for the chip in the low bits.
    CompressedStream(u8),
    /// 0x7F: decompression table.
    DecompressionTable,
    /// 0x80..=0xBF: ROM/RAM image dump.
    RomRamDump(u8),
    /// 0xC0..=0xFF: RAM write.
    RamWrite(u8),
}

impl From<u8> for DataBlockKind {
    fn from(value: u8) -> Self {
        match value {
            0x00..=0x3F => DataBlockKind::UncompressedStream(value),
            0x40..=0x7E => DataBlockKind::CompressedStream(value & 0x3F),
            0x7F => DataBlockKind::DecompressionTable,
            0x80..=0xBF => DataBlockKind::RomRamDump(value),
            _ => DataBlockKind::RamWrite(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sentinels() {
        assert_eq!(CommandLength::of(0x00), CommandLength::Unknown);
        assert_eq!(CommandLength::of(0x67), CommandLength::DataBlock);
        assert_eq!(CommandLength::of(0x66), CommandLength::Fixed(0));
        assert_eq!(CommandLength::of(0x68), CommandLength::Fixed(11));
        assert_eq!(CommandLength::of(0x93), CommandLength::Fixed(10));
        assert_eq!(CommandLength::of(0xE1), CommandLength::Fixed(4));
        assert_eq!(CommandLength::of(0xFF), CommandLength::Unknown);
    }

    #[test]
    fn only_one_data_block_opcode() {
        let count = VGM_CMD_LENGTH_TABLE
            .iter()
            .filter(|&&n| n == LENGTH_DATA_BLOCK)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn wait_increments() {
        assert_eq!(sample_increment(0x61, Some(&[0xFF, 0x00])), 255);
        assert_eq!(sample_increment(0x61, Some(&[0x44, 0xAC])), 0xAC44);
        assert_eq!(sample_increment(0x62, None), 735);
        assert_eq!(sample_increment(0x63, None), 882);
        assert_eq!(sample_increment(0x70, None), 1);
        assert_eq!(sample_increment(0x7F, None), 16);
        assert_eq!(sample_increment(0x80, None), 1);
        assert_eq!(sample_increment(0x8F, None), 16);
        assert_eq!(sample_increment(0x52, Some(&[0x22, 0x00])), 0);
    }

    #[test]
    fn data_block_kinds() {
        assert_eq!(DataBlockKind::from(0x00), DataBlockKind::UncompressedStream(0x00));
        assert_eq!(DataBlockKind::from(0x41), DataBlockKind::CompressedStream(0x01));
        assert_eq!(DataBlockKind::from(0x7F), DataBlockKind::DecompressionTable);
        assert_eq!(DataBlockKind::from(0x8B), DataBlockKind::RomRamDump(0x8B));
        assert_eq!(DataBlockKind::from(0xC0), DataBlockKind::RamWrite(0xC0));
    }
}
