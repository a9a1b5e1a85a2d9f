mod common;

use common::{VgmImage, put_u32, recording_diagnostics};
use tinyvgm::{
    Diagnostic, ErrorKind, ParseError, ParseOptions, VgmContext, VgmHeaderField, parse_vgm,
};

/// Smallest image: v1.50, no data offset, a lone end-of-data at 0x40.
fn minimal_image() -> Vec<u8> {
    let mut bytes = vec![0u8; 0x41];
    bytes[0..4].copy_from_slice(b"Vgm ");
    put_u32(&mut bytes, 0x04, 0x3D);
    put_u32(&mut bytes, 0x08, 0x150);
    bytes[0x40] = 0x66;
    bytes
}

#[test]
fn test_minimal_image() {
    let bytes = minimal_image();
    let mut vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");

    assert_eq!(vgm.version(), 0x150);
    assert_eq!(vgm.eof_offset(), 0x41);
    assert_eq!(vgm.command_offset(), 0x40);
    assert_eq!(vgm.gd3_offset(), None);
    assert_eq!(vgm.extra_header_offset(), None);
    assert!(!vgm.has_loop());
    assert_eq!(vgm.loop_offset(), 0x40);
    assert_eq!(vgm.loop_samples(), 0);
    assert!(vgm.metadata().is_none());
    assert_eq!(vgm.extra_header(), Ok(None));
    assert_eq!(vgm.commands().count(), 0);
}

#[test]
fn test_try_from_uses_default_options() {
    let bytes = minimal_image();
    let vgm = VgmContext::try_from(bytes.as_slice()).expect("parse");
    assert_eq!(vgm.loop_count(), 0);
    assert_eq!(vgm.total_samples(), 0);
}

#[test]
fn test_short_buffer_is_rejected() {
    let bytes = vec![0u8; 0x3F];
    let err = parse_vgm(&bytes, ParseOptions::new()).unwrap_err();
    assert_eq!(err, ParseError::HeaderTooShort { len: 0x3F });
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_bad_magic_is_rejected() {
    let mut bytes = minimal_image();
    bytes[0..4].copy_from_slice(b"Vgz ");
    let err = parse_vgm(&bytes, ParseOptions::new()).unwrap_err();
    assert_eq!(err, ParseError::InvalidIdent(*b"Vgz "));
}

#[test]
fn test_data_offset_inside_minimum_header_is_rejected() {
    let mut bytes = minimal_image();
    // 0x34 + 0x08 = 0x3C
    put_u32(&mut bytes, 0x34, 0x08);
    let err = parse_vgm(&bytes, ParseOptions::new()).unwrap_err();
    assert_eq!(err, ParseError::InvalidDataOffset { offset: 0x3C });
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_data_offset_ignored_before_v150() {
    let mut bytes = minimal_image();
    put_u32(&mut bytes, 0x08, 0x110);
    put_u32(&mut bytes, 0x34, 0x08);
    let vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.command_offset(), 0x40);
}

#[test]
fn test_data_offset_is_relative_to_its_field() {
    let bytes = VgmImage::new(0x171).commands(&[0x66]).build();
    let vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.command_offset(), 0x100);
    assert_eq!(vgm.eof_offset(), 0x101);
}

#[test]
fn test_header_past_buffer_end() {
    // v1.71 with the data offset pointing far away but only 0x80 bytes
    let mut bytes = VgmImage::new(0x171).header_len(0x80).commands(&[0x66]).build();
    put_u32(&mut bytes, 0x34, 0x200);
    let err = parse_vgm(&bytes, ParseOptions::new()).unwrap_err();
    assert_eq!(
        err,
        ParseError::OffsetOutOfRange {
            offset: 0,
            needed: 58 * 4,
            available: 0x81,
            context: "header",
        }
    );
    assert_eq!(err.kind(), ErrorKind::Truncation);
}

#[test]
fn test_loop_offset_at_eof_is_ignored() {
    let (diagnostics, seen) = recording_diagnostics();
    let bytes = VgmImage::new(0x161)
        .commands(&[0x62, 0x66])
        .loop_samples(735)
        .poke(0x1C, 0x102 - 0x1C)
        .build();
    let options = ParseOptions::new().diagnostics(diagnostics);
    let vgm = parse_vgm(&bytes, options).expect("parse");

    assert!(!vgm.has_loop());
    assert_eq!(vgm.loop_offset(), vgm.command_offset());
    assert_eq!(vgm.loop_samples(), vgm.total_samples());
    assert_eq!(
        seen.borrow().as_slice(),
        &[Diagnostic::LoopOffsetOutOfRange {
            loop_offset: 0x102,
            eof_offset: 0x102,
        }]
    );
}

#[test]
fn test_loop_offset_resolved_when_inside_data() {
    let bytes = VgmImage::new(0x161)
        .commands(&[0x62])
        .mark_loop()
        .commands(&[0x63, 0x66])
        .loop_samples(882)
        .build();
    let vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");
    assert!(vgm.has_loop());
    assert_eq!(vgm.loop_offset(), 0x101);
    assert_eq!(vgm.loop_samples(), 882);
    assert_eq!(vgm.total_samples(), 735 + 882);
}

#[test]
fn test_extra_header_offset_requires_v170() {
    let block = vec![4, 0, 0, 0];
    let old = VgmImage::new(0x161)
        .extra_header(block.clone())
        .commands(&[0x66])
        .build();
    let vgm = parse_vgm(&old, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.extra_header_offset(), None);

    let new = VgmImage::new(0x170).extra_header(block).commands(&[0x66]).build();
    let vgm = parse_vgm(&new, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.extra_header_offset(), Some(0xC0));
}

#[test]
fn test_extra_header_offset_dropped_when_header_is_clamped() {
    // command data at 0x80 cuts the header before the 0xBC word
    let bytes = VgmImage::new(0x171)
        .header_len(0x80)
        .commands(&[0x66; 0x50])
        .poke(0xBC, 0x04)
        .build();
    let vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.header_field_count(), 0x80 / 4);
    assert_eq!(vgm.extra_header_offset(), None);
}

#[test]
fn test_header_value_respects_effective_size() {
    let bytes = VgmImage::new(0x101)
        .header_len(0x40)
        .commands(&[0x66])
        .poke(0x2C, 7_670_453)
        .build();
    let vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.header_value(VgmHeaderField::Rate), Some(0));
    // YM2612 clock only exists from v1.10
    assert_eq!(vgm.header_value(VgmHeaderField::Ym2612Clock), None);
    assert_eq!(vgm.header_value(VgmHeaderField::Version), Some(0x101));
}

#[test]
fn test_gd3_offset_resolved() {
    let bytes = VgmImage::new(0x171)
        .commands(&[0x66])
        .gd3(common::gd3_block(&["Title"]))
        .build();
    let vgm = parse_vgm(&bytes, ParseOptions::new()).expect("parse");
    assert_eq!(vgm.gd3_offset(), Some(0x101));
    let gd3 = vgm.gd3().expect("gd3").expect("present");
    assert_eq!(gd3.track_name_en.as_deref(), Some("Title"));
}
