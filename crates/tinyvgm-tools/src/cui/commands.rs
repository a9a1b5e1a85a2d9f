use std::path::Path;

use anyhow::{Context, Result};
use tinyvgm::vgm::{DataBlockKind, samples_to_duration};
use tinyvgm::{VgmCommand, parse_vgm};

use crate::DecodeArgs;
use crate::cui::format_time;

/// Payload bytes shown per command before the listing elides the rest.
const PAYLOAD_PREVIEW: usize = 8;

fn format_payload(cmd: &VgmCommand<'_>) -> String {
    if let (Some(kind), Some(payload)) = (cmd.block_kind(), cmd.block_payload()) {
        let kind = match kind {
            DataBlockKind::UncompressedStream(t) => format!("stream(0x{:02X})", t),
            DataBlockKind::CompressedStream(t) => format!("compressed(0x{:02X})", t),
            DataBlockKind::DecompressionTable => "decompression_table".to_string(),
            DataBlockKind::RomRamDump(t) => format!("rom(0x{:02X})", t),
            DataBlockKind::RamWrite(t) => format!("ram(0x{:02X})", t),
        };
        return format!("DataBlock({}, size={})", kind, payload.len());
    }

    let Some(data) = cmd.data else {
        return String::new();
    };
    let mut out: Vec<String> = data
        .iter()
        .take(PAYLOAD_PREVIEW)
        .map(|b| format!("{:02X}", b))
        .collect();
    if data.len() > PAYLOAD_PREVIEW {
        out.push(format!("... (+{})", data.len() - PAYLOAD_PREVIEW));
    }
    out.join(" ")
}

/// Commands command: list every command with its position and timing.
///
/// A decode error ends the listing and is returned after the rows that
/// were decoded before it have been printed.
pub fn print_commands(
    path: &Path,
    bytes: &[u8],
    decode: DecodeArgs,
    limit: Option<usize>,
) -> Result<()> {
    let mut rewinds = 0u32;
    let options = crate::vgm::parse_options(decode).on_loop(|_| rewinds += 1);
    let mut vgm = parse_vgm(bytes, options)
        .with_context(|| format!("failed to parse VGM file: {}", path.display()))?;

    println!(
        "{:<8} {:<10} {:<6} {:<40} {:>8} Time",
        "Index", "Offset", "Op", "Payload", "Samples"
    );
    println!("{}", "-".repeat(90));

    let mut elapsed = 0u64;
    let mut commands = vgm.commands();
    for (index, cmd) in commands.by_ref().enumerate() {
        if limit.is_some_and(|l| index >= l) {
            break;
        }
        let cmd = cmd.context("command stream stopped")?;
        elapsed += cmd.samples as u64;
        println!(
            "{:<8} 0x{:08X} 0x{:02X}   {:<40} {:>8} {}",
            index,
            cmd.offset,
            cmd.opcode,
            format_payload(&cmd),
            cmd.samples,
            format_time(samples_to_duration(elapsed)),
        );
    }
    let state = commands.state();
    drop(commands);
    drop(vgm);

    println!("{}", "-".repeat(90));
    println!(
        " played {} samples ({}), {} loop rewinds, cursor 0x{:08X}",
        state.played_samples,
        format_time(samples_to_duration(state.played_samples)),
        rewinds,
        state.cursor
    );
    Ok(())
}
