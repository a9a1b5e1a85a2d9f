use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use tinyvgm::vgm::format_version;
use unicode_width::UnicodeWidthStr;
use tinyvgm::{ParseOptions, VgmContext, VgmHeaderField, parse_vgm};

use crate::cui::{format_time, pad_to_width};

/// Header words that are offsets or counters; shown in the summary instead.
const SUMMARY_FIELDS: [VgmHeaderField; 8] = [
    VgmHeaderField::EofOffset,
    VgmHeaderField::Version,
    VgmHeaderField::Gd3Offset,
    VgmHeaderField::TotalSamples,
    VgmHeaderField::LoopOffset,
    VgmHeaderField::LoopSamples,
    VgmHeaderField::DataOffset,
    VgmHeaderField::ExtraHeaderOffset,
];

fn offset_cell(offset: Option<usize>) -> String {
    match offset {
        Some(o) => format!("0x{:08X}", o),
        None => "(none)".to_string(),
    }
}

fn summary_rows(path: &Path, vgm: &VgmContext<'_>) -> Vec<(String, String)> {
    let loop_value = if vgm.has_loop() {
        format!(
            "0x{:08X} ({} samples)",
            vgm.loop_offset(),
            vgm.loop_samples()
        )
    } else {
        "(none)".to_string()
    };
    vec![
        ("file".into(), path.display().to_string()),
        (
            "version".into(),
            format!("{} (0x{:08X})", format_version(vgm.version()), vgm.version()),
        ),
        ("eof_offset".into(), format!("0x{:08X}", vgm.eof_offset())),
        ("data_offset".into(), format!("0x{:08X}", vgm.command_offset())),
        (
            "header_fields".into(),
            format!("{}", vgm.header_field_count()),
        ),
        (
            "total_samples".into(),
            format!("{} ({})", vgm.total_samples(), format_time(vgm.duration())),
        ),
        ("loop".into(), loop_value),
        ("gd3_offset".into(), offset_cell(vgm.gd3_offset())),
        (
            "extra_header_offset".into(),
            offset_cell(vgm.extra_header_offset()),
        ),
    ]
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.into_iter().map(Cell::new).collect::<Vec<_>>());
    table
}

/// Info command: print the header summary, non-zero chip header words,
/// extra header tables and GD3 strings.
pub fn print_info(path: &Path, bytes: &[u8], verbose: bool) -> Result<()> {
    let options = ParseOptions::new().diagnostics(crate::vgm::diagnostics(verbose));
    let vgm = parse_vgm(bytes, options)
        .with_context(|| format!("failed to parse VGM file: {}", path.display()))?;

    let mut summary = new_table(vec!["Field", "Value"]);
    for (k, v) in summary_rows(path, &vgm) {
        summary.add_row(vec![Cell::new(k), Cell::new(v)]);
    }
    println!("{}", summary);

    let mut header = new_table(vec!["Offset", "Header", "Value"]);
    let mut any = false;
    for entry in vgm.header() {
        if entry.value == 0 || SUMMARY_FIELDS.contains(&entry.field) {
            continue;
        }
        any = true;
        header.add_row(vec![
            Cell::new(format!("0x{:02X}", entry.field.offset())),
            Cell::new(entry.field.name()),
            Cell::new(format!("0x{:08X} ({})", entry.value, entry.value)),
        ]);
    }
    if any {
        println!();
        println!("{}", header);
    }

    let extra = vgm
        .extra_header()
        .context("failed to decode extra header")?;
    if let Some(extra) = extra {
        let mut table = new_table(vec!["Extra", "Chip", "Value"]);
        for clock in &extra.chip_clocks {
            table.add_row(vec![
                Cell::new("clock"),
                Cell::new(format!("0x{:02X}", clock.chip_id)),
                Cell::new(format!("{} Hz", clock.clock)),
            ]);
        }
        for volume in &extra.chip_volumes {
            let mode = if volume.relative { "relative" } else { "absolute" };
            table.add_row(vec![
                Cell::new("volume"),
                Cell::new(format!("0x{:02X} (flags 0x{:02X})", volume.chip_id, volume.flags)),
                Cell::new(format!("0x{:04X} {}", volume.volume, mode)),
            ]);
        }
        println!();
        println!("{}", table);
    }

    if let Some(fields) = vgm.metadata() {
        let mut rows = Vec::new();
        for entry in fields {
            let entry = entry.context("failed to decode GD3 metadata")?;
            let text = entry.text_lossy();
            if !text.is_empty() {
                rows.push((entry.field.name(), text, entry.offset));
            }
        }
        let name_width = rows.iter().map(|(n, _, _)| n.len()).max().unwrap_or(0);
        let text_width = rows
            .iter()
            .map(|(_, t, _)| UnicodeWidthStr::width(t.as_str()))
            .max()
            .unwrap_or(0);
        println!();
        for (name, text, offset) in &rows {
            println!(
                " {} {} @0x{:08X}",
                pad_to_width(name, name_width),
                pad_to_width(text, text_width),
                offset
            );
        }
    }

    Ok(())
}
