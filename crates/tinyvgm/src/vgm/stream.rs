//! Command stream traversal with loop handling.
//!
//! `CommandStream` walks the command data of a parsed VGM image one record
//! at a time. Every record is a zero-copy view into the caller's buffer.
//!
//! Loop handling:
//! - Samples advanced at or after the loop offset are counted separately.
//! - When that count reaches the header's loop length and loops remain,
//!   the stream subtracts the pass from the played total, jumps back to the
//!   loop offset, decrements the remaining count and calls the loop
//!   callback with the new count.
//! - When the header declares a positive total, the stream stops as soon
//!   as the played total reaches it, even without an end-of-data command.
use std::iter::FusedIterator;
use std::time::Duration;

use crate::binutil::{ParseError, read_slice, read_u8_at, read_u32_le_at};
use crate::diag::{Diagnostic, Diagnostics};
use crate::vgm::command::{
    CommandLength, DATA_BLOCK_HEADER_LEN, END_OF_DATA, VgmCommand, sample_increment,
};

/// Output sample rate every VGM timing value is expressed in.
pub const VGM_SAMPLE_RATE: u32 = 44_100;

/// Convert a sample count at [`VGM_SAMPLE_RATE`] to wall-clock time.
pub fn samples_to_duration(samples: u64) -> Duration {
    let secs = samples / VGM_SAMPLE_RATE as u64;
    let rem = samples % VGM_SAMPLE_RATE as u64;
    Duration::from_secs(secs) + Duration::from_nanos(rem * 1_000_000_000 / VGM_SAMPLE_RATE as u64)
}

/// Resolved positions and lengths the stream runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamLayout {
    pub command_offset: usize,
    pub eof_offset: usize,
    pub loop_offset: usize,
    pub loop_samples: u32,
    pub total_samples: u32,
}

/// Progress of one traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    /// Absolute position of the next opcode.
    pub cursor: usize,
    /// Loops still to be played.
    pub remaining_loops: u32,
    /// Samples played, net of rewound loop passes.
    pub played_samples: u64,
    /// Samples played inside the loop region during the current pass.
    pub loop_samples_played: u64,
}

type LoopCallback<'s, 'a> = &'s mut (dyn FnMut(u32) + 'a);

/// Lazy sequence of [`VgmCommand`]s.
///
/// Created by `VgmContext::commands()`. Yields `Err` at most once, after
/// which it is exhausted.
pub struct CommandStream<'s, 'a> {
    bytes: &'a [u8],
    layout: StreamLayout,
    state: PlaybackState,
    skip_unknown: bool,
    on_loop: Option<LoopCallback<'s, 'a>>,
    diagnostics: Diagnostics<'a>,
    finished: bool,
}

impl<'s, 'a> CommandStream<'s, 'a> {
    pub(crate) fn new(
        bytes: &'a [u8],
        layout: StreamLayout,
        loop_count: u32,
        skip_unknown: bool,
        on_loop: Option<LoopCallback<'s, 'a>>,
        diagnostics: Diagnostics<'a>,
    ) -> Self {
        Self {
            bytes,
            layout,
            state: PlaybackState {
                cursor: layout.command_offset,
                remaining_loops: loop_count,
                ..PlaybackState::default()
            },
            skip_unknown,
            on_loop,
            diagnostics,
            finished: false,
        }
    }

    /// Current traversal state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn played_samples(&self) -> u64 {
        self.state.played_samples
    }

    pub fn loop_samples_played(&self) -> u64 {
        self.state.loop_samples_played
    }

    pub fn remaining_loops(&self) -> u32 {
        self.state.remaining_loops
    }

    /// Absolute position of the next opcode.
    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    /// `end` must lie strictly before the end-of-file offset.
    fn ensure_before_eof(
        &self,
        offset: usize,
        end: Option<usize>,
        context: &'static str,
    ) -> Result<usize, ParseError> {
        let eof = self.layout.eof_offset;
        match end {
            Some(end) if end < eof => Ok(end),
            end => Err(ParseError::Truncated {
                offset,
                end: end.unwrap_or(usize::MAX),
                eof,
                context,
            }),
        }
    }

    fn step(&mut self) -> Result<Option<VgmCommand<'a>>, ParseError> {
        loop {
            let pos = self.state.cursor;
            if pos >= self.layout.eof_offset {
                return Ok(None);
            }
            let opcode = read_u8_at(self.bytes, pos, "command")?;
            if opcode == END_OF_DATA {
                return Ok(None);
            }

            let (data, block_type, next) = match CommandLength::of(opcode) {
                CommandLength::Unknown if self.skip_unknown => {
                    self.diagnostics
                        .emit(Diagnostic::SkippedUnknownOpcode { opcode, offset: pos });
                    self.state.cursor = pos + 1;
                    continue;
                }
                CommandLength::Unknown => {
                    return Err(ParseError::UnknownOpcode {
                        opcode,
                        offset: pos,
                    });
                }
                CommandLength::DataBlock => {
                    let header_end = pos + 1 + DATA_BLOCK_HEADER_LEN;
                    self.ensure_before_eof(pos, Some(header_end), "data block header")?;
                    let block_type = read_u8_at(self.bytes, pos + 2, "data block type")?;
                    let len = read_u32_le_at(self.bytes, pos + 3, "data block length")? as usize;
                    let end =
                        self.ensure_before_eof(pos, header_end.checked_add(len), "data block")?;
                    let data = read_slice(self.bytes, pos + 1, end - pos - 1, "data block")?;
                    (Some(data), Some(block_type), end)
                }
                CommandLength::Fixed(0) => (None, None, pos + 1),
                CommandLength::Fixed(n) => {
                    let end = self.ensure_before_eof(pos, Some(pos + 1 + n), "command payload")?;
                    let data = read_slice(self.bytes, pos + 1, n, "command payload")?;
                    (Some(data), None, end)
                }
            };

            self.state.cursor = next;
            let samples = sample_increment(opcode, data);
            if samples > 0 {
                self.advance(pos, samples);
            }
            return Ok(Some(VgmCommand {
                offset: pos,
                opcode,
                data,
                block_type,
                samples,
            }));
        }
    }

    /// Account for `samples` advanced by the command at `pos`.
    fn advance(&mut self, pos: usize, samples: u32) {
        let samples = samples as u64;
        self.state.played_samples += samples;
        if pos >= self.layout.loop_offset {
            self.state.loop_samples_played += samples;
        }

        if self.state.remaining_loops > 0
            && self.state.loop_samples_played >= self.layout.loop_samples as u64
        {
            self.state.played_samples = self
                .state
                .played_samples
                .saturating_sub(self.state.loop_samples_played);
            self.state.loop_samples_played = 0;
            self.state.cursor = self.layout.loop_offset;
            self.state.remaining_loops -= 1;

            let remaining = self.state.remaining_loops;
            self.diagnostics.emit(Diagnostic::LoopRewind { remaining });
            if let Some(callback) = self.on_loop.as_mut() {
                callback(remaining);
            }
        }

        let total = self.layout.total_samples as u64;
        if total > 0 && self.state.played_samples >= total {
            self.finished = true;
        }
    }
}

impl<'a> Iterator for CommandStream<'_, 'a> {
    type Item = Result<VgmCommand<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(command)) => Some(Ok(command)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for CommandStream<'_, '_> {}

impl std::fmt::Debug for CommandStream<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStream")
            .field("layout", &self.layout)
            .field("state", &self.state)
            .field("skip_unknown", &self.skip_unknown)
            .field("on_loop", &self.on_loop.is_some())
            .field("finished", &self.finished)
            .finish()
    }
}
