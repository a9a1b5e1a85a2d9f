//! Advisory diagnostics emitted while decoding.
//!
//! Decoders never print. Everything that is worth telling a caller but is
//! not an error is described by a [`Diagnostic`] and handed to the
//! [`Diagnostics`] sink configured in the parse options. Without a hook the
//! sink forwards to the `log` crate under the `tinyvgm` target.
use std::fmt;
use std::rc::Rc;

/// Non-fatal observations made by the decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The GD3 block declares this version. It is reported, not validated.
    Gd3Version { version: u32 },
    /// An unknown opcode was skipped as a single byte.
    SkippedUnknownOpcode { opcode: u8, offset: usize },
    /// The header loop offset pointed at or past the end of file and was
    /// ignored.
    LoopOffsetOutOfRange { loop_offset: usize, eof_offset: usize },
    /// Zero bytes past the last GD3 field were accepted as padding.
    Gd3TrailingPadding { offset: usize, len: usize },
    /// The command stream rewound to the loop point.
    LoopRewind { remaining: u32 },
}

impl Diagnostic {
    /// The `log` level used when no hook is installed.
    pub fn level(&self) -> log::Level {
        match self {
            Diagnostic::Gd3Version { .. } => log::Level::Info,
            Diagnostic::SkippedUnknownOpcode { .. }
            | Diagnostic::LoopOffsetOutOfRange { .. }
            | Diagnostic::Gd3TrailingPadding { .. } => log::Level::Warn,
            Diagnostic::LoopRewind { .. } => log::Level::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Gd3Version { version } => write!(f, "GD3 version: 0x{:08x}", version),
            Diagnostic::SkippedUnknownOpcode { opcode, offset } => write!(
                f,
                "unknown VGM command 0x{:02x} at offset 0x{:X}, skipped",
                opcode, offset
            ),
            Diagnostic::LoopOffsetOutOfRange {
                loop_offset,
                eof_offset,
            } => write!(
                f,
                "loop offset 0x{:X} is outside the data (eof 0x{:X}), loop disabled",
                loop_offset, eof_offset
            ),
            Diagnostic::Gd3TrailingPadding { offset, len } => write!(
                f,
                "ignoring {} bytes of GD3 padding at offset 0x{:X}",
                len, offset
            ),
            Diagnostic::LoopRewind { remaining } => {
                write!(f, "looped, {} loops left", remaining)
            }
        }
    }
}

type DiagnosticHook<'a> = Rc<dyn Fn(&Diagnostic) + 'a>;

/// Destination for [`Diagnostic`]s.
///
/// Cloning is cheap; every decoder created from one parse shares the same
/// hook.
#[derive(Clone, Default)]
pub struct Diagnostics<'a> {
    hook: Option<DiagnosticHook<'a>>,
}

impl<'a> Diagnostics<'a> {
    /// Forward diagnostics to the `log` crate.
    pub fn log() -> Self {
        Self { hook: None }
    }

    /// Send diagnostics to `hook` instead of the `log` crate.
    pub fn with_hook(hook: impl Fn(&Diagnostic) + 'a) -> Self {
        Self {
            hook: Some(Rc::new(hook)),
        }
    }

    pub(crate) fn emit(&self, diagnostic: Diagnostic) {
        match &self.hook {
            Some(hook) => hook(&diagnostic),
            None => log::log!(target: "tinyvgm", diagnostic.level(), "{}", diagnostic),
        }
    }
}

impl fmt::Debug for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
