//! tinyvgm: lazy, zero-copy decoder for VGM sound-chip command logs
//!
//! `parse_vgm` validates the header of a VGM image and returns a
//! `VgmContext`. The context borrows the input buffer and produces lazy
//! sequences over it:
//! - `header()` yields the version-dependent header words.
//! - `metadata()` yields the Gd3 strings as UTF-16LE views.
//! - `extra_header()` decodes the v1.70+ chip clock and volume tables.
//! - `commands()` yields `VgmCommand` records, rewinding at the loop
//!   point as many times as requested.
//!
//! Errors are reported as `ParseError`. Non-fatal observations are sent
//! to a `Diagnostics` sink, which forwards to the `log` crate unless a
//! hook is installed.
//!
//! ```
//! use tinyvgm::{ParseOptions, VgmHeaderField, parse_vgm};
//!
//! // v1.50 header with no data offset, followed by a single end-of-data
//! let mut bytes = vec![0u8; 0x41];
//! bytes[0..4].copy_from_slice(b"Vgm ");
//! bytes[0x04..0x08].copy_from_slice(&0x3Du32.to_le_bytes());
//! bytes[0x08..0x0C].copy_from_slice(&0x150u32.to_le_bytes());
//! bytes[0x40] = 0x66;
//!
//! let mut vgm = parse_vgm(&bytes, ParseOptions::new()).expect("valid header");
//! assert_eq!(vgm.eof_offset(), 0x41);
//! assert_eq!(vgm.command_offset(), 0x40);
//! assert_eq!(vgm.header_value(VgmHeaderField::Version), Some(0x150));
//! assert!(vgm.metadata().is_none());
//! assert_eq!(vgm.commands().count(), 0);
//! ```
//!
//! Loop callbacks and diagnostics hooks are plain closures:
//!
//! ```no_run
//! use tinyvgm::{Diagnostics, ParseOptions, parse_vgm};
//!
//! let bytes = std::fs::read("song.vgm").unwrap();
//! let options = ParseOptions::new()
//!     .loop_count(2)
//!     .on_loop(|remaining| println!("{} loops left", remaining))
//!     .diagnostics(Diagnostics::with_hook(|d| eprintln!("{}", d)));
//! let mut vgm = parse_vgm(&bytes, options).unwrap();
//! let samples: u64 = vgm
//!     .commands()
//!     .filter_map(Result::ok)
//!     .map(|c| c.samples as u64)
//!     .sum();
//! println!("{} samples", samples);
//! ```
mod binutil;
pub mod diag;
pub mod meta;
pub mod vgm;

pub use binutil::{ErrorKind, ParseError};
pub use diag::{Diagnostic, Diagnostics};
pub use meta::{Gd3, Gd3Entry, Gd3Field, Gd3Fields};
pub use vgm::{ParseOptions, VgmCommand, VgmContext, VgmHeaderField, parse_vgm};
