//! VGM image decoding.
//!
//! The parser validates a header and returns a `VgmContext`; the header,
//! extra header and command stream are exposed as lazy views from there.
pub mod command;
pub mod header;
pub mod parser;
pub mod stream;

pub use command::{DataBlockKind, VgmCommand};
pub use header::{
    ChipClock, ChipVolume, HeaderEntry, HeaderFields, VgmExtraHeader, VgmHeaderField,
    format_version, header_field_count_for_version,
};
pub use parser::{ParseOptions, VgmContext, parse_vgm};
pub use stream::{CommandStream, PlaybackState, VGM_SAMPLE_RATE, samples_to_duration};
