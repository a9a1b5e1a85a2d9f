use std::path::Path;

use anyhow::{Context, Result, bail};
use tinyvgm::parse_vgm;

use crate::DecodeArgs;

/// Check command: decode every command and compare the summed waits with
/// the header's Total_Samples.
///
/// With `--loops N` the expected sum grows by N loop passes.
pub fn check_vgm(path: &Path, bytes: &[u8], decode: DecodeArgs) -> Result<()> {
    let mut vgm = parse_vgm(bytes, crate::vgm::parse_options(decode))
        .with_context(|| format!("failed to parse VGM file: {}", path.display()))?;

    let mut count = 0usize;
    let mut waited = 0u64;
    for cmd in vgm.commands() {
        let cmd = cmd.with_context(|| format!("\"{}\": decode failed", path.display()))?;
        count += 1;
        waited += cmd.samples as u64;
    }

    let expected = vgm.total_samples() as u64 + decode.loops as u64 * vgm.loop_samples() as u64;
    if waited != expected {
        bail!(
            "\"{}\": waits sum to {} samples, header declares {} ({} commands)",
            path.display(),
            waited,
            expected,
            count
        );
    }
    println!(
        "\"{}\": ok ({} commands, {} samples)",
        path.display(),
        count,
        waited
    );
    Ok(())
}
