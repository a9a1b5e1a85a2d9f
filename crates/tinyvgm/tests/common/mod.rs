#![allow(dead_code)]
//! Helpers for assembling VGM byte images in tests.

use std::cell::RefCell;
use std::rc::Rc;
use tinyvgm::{Diagnostic, Diagnostics};

/// Builder for an in-memory VGM image.
///
/// The header is `header_len` bytes long (0x100 by default). Commands are
/// appended after it, followed by an optional Gd3 block. `build` fills in
/// the EOF, data, loop and Gd3 offsets.
pub struct VgmImage {
    version: u32,
    header_len: usize,
    commands: Vec<u8>,
    loop_at: Option<usize>,
    loop_samples: u32,
    total_samples: Option<u32>,
    gd3: Option<Vec<u8>>,
    extra: Option<Vec<u8>>,
    pokes: Vec<(usize, u32)>,
    write_data_offset: bool,
}

impl VgmImage {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            header_len: 0x100,
            commands: Vec::new(),
            loop_at: None,
            loop_samples: 0,
            total_samples: None,
            gd3: None,
            extra: None,
            pokes: Vec::new(),
            write_data_offset: true,
        }
    }

    pub fn header_len(mut self, len: usize) -> Self {
        self.header_len = len;
        self
    }

    /// Leave the data offset field at 0.
    pub fn without_data_offset(mut self) -> Self {
        self.write_data_offset = false;
        self
    }

    pub fn commands(mut self, bytes: &[u8]) -> Self {
        self.commands.extend_from_slice(bytes);
        self
    }

    /// Mark the loop point at the current end of the command data.
    pub fn mark_loop(mut self) -> Self {
        self.loop_at = Some(self.commands.len());
        self
    }

    pub fn loop_samples(mut self, samples: u32) -> Self {
        self.loop_samples = samples;
        self
    }

    /// Total samples; defaults to the sum of the commands' waits.
    pub fn total_samples(mut self, samples: u32) -> Self {
        self.total_samples = Some(samples);
        self
    }

    pub fn gd3(mut self, block: Vec<u8>) -> Self {
        self.gd3 = Some(block);
        self
    }

    /// Extra header block placed right after the 0xC0 header word.
    pub fn extra_header(mut self, block: Vec<u8>) -> Self {
        self.extra = Some(block);
        self
    }

    /// Overwrite the header word at `offset` after everything else.
    pub fn poke(mut self, offset: usize, value: u32) -> Self {
        self.pokes.push((offset, value));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.header_len];
        bytes[0..4].copy_from_slice(b"Vgm ");
        put_u32(&mut bytes, 0x08, self.version);

        if let Some(extra) = &self.extra {
            let start = 0xC0;
            put_u32(&mut bytes, 0xBC, (start - 0xBC) as u32);
            bytes[start..start + extra.len()].copy_from_slice(extra);
        }

        let command_offset = self.header_len;
        if self.write_data_offset {
            put_u32(&mut bytes, 0x34, (command_offset - 0x34) as u32);
        }
        bytes.extend_from_slice(&self.commands);

        let total = self
            .total_samples
            .unwrap_or_else(|| wait_sum(&self.commands));
        put_u32(&mut bytes, 0x18, total);

        if let Some(at) = self.loop_at {
            put_u32(&mut bytes, 0x1C, (command_offset + at - 0x1C) as u32);
            put_u32(&mut bytes, 0x20, self.loop_samples);
        }

        if let Some(gd3) = &self.gd3 {
            let start = bytes.len();
            put_u32(&mut bytes, 0x14, (start - 0x14) as u32);
            bytes.extend_from_slice(gd3);
        }

        let eof = bytes.len();
        put_u32(&mut bytes, 0x04, (eof - 0x04) as u32);

        for (offset, value) in self.pokes {
            put_u32(&mut bytes, offset, value);
        }
        bytes
    }
}

pub fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Sum of the waits encoded by a command byte string made of waits and
/// opcode-only commands.
fn wait_sum(commands: &[u8]) -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < commands.len() {
        match commands[i] {
            0x61 => {
                total += u16::from_le_bytes([commands[i + 1], commands[i + 2]]) as u32;
                i += 3;
            }
            0x62 => {
                total += 735;
                i += 1;
            }
            0x63 => {
                total += 882;
                i += 1;
            }
            op @ 0x70..=0x8F => {
                total += (op & 0x0F) as u32 + 1;
                i += 1;
            }
            0x50 => i += 2,
            0x52 | 0x53 | 0x54 => i += 3,
            _ => i += 1,
        }
    }
    total
}

/// Encode one UTF-16LE nul-terminated string.
pub fn utf16z(text: &str) -> Vec<u8> {
    let mut out: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    out.extend_from_slice(&[0, 0]);
    out
}

/// Gd3 block with the given raw text payload.
pub fn gd3_raw(version: u32, text: &[u8]) -> Vec<u8> {
    let mut out = b"Gd3 ".to_vec();
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&(text.len() as u32).to_le_bytes());
    out.extend_from_slice(text);
    out
}

/// Gd3 block holding `fields` in order.
pub fn gd3_block(fields: &[&str]) -> Vec<u8> {
    let text: Vec<u8> = fields.iter().flat_map(|f| utf16z(f)).collect();
    gd3_raw(0x100, &text)
}

/// A diagnostics sink that records everything it is given.
pub fn recording_diagnostics<'a>() -> (Diagnostics<'a>, Rc<RefCell<Vec<Diagnostic>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let diagnostics = Diagnostics::with_hook(move |d: &Diagnostic| sink.borrow_mut().push(d.clone()));
    (diagnostics, seen)
}
