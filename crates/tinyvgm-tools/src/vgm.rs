use std::fs::File;
use std::io::{Read, stdin};
use std::path::{Path, PathBuf};

use anyhow::Context;
use flate2::read::GzDecoder;
use tinyvgm::{Diagnostic, Diagnostics, ParseOptions};

use crate::DecodeArgs;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Read VGM bytes from a path or stdin ('-') into a Vec<u8>.
///
/// Gzipped input (`.vgz`) is detected by its magic bytes and decompressed,
/// whatever the file is called.
pub fn read_vgm_as_vec(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    let mut raw = Vec::new();
    if path == Path::new("-") {
        stdin()
            .read_to_end(&mut raw)
            .context("failed to read from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?
            .read_to_end(&mut raw)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
    }

    if raw.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(&raw[..])
            .read_to_end(&mut out)
            .with_context(|| format!("failed to decompress gzip input: {}", path.display()))?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

/// Diagnostics sink for the CLI: stderr lines under `--verbose`, otherwise
/// the library's `log` forwarding (silent without a logger).
pub fn diagnostics<'a>(verbose: bool) -> Diagnostics<'a> {
    if verbose {
        Diagnostics::with_hook(|d: &Diagnostic| eprintln!("warning: {}", d))
    } else {
        Diagnostics::log()
    }
}

pub fn parse_options<'a>(decode: DecodeArgs) -> ParseOptions<'a> {
    ParseOptions::new()
        .loop_count(decode.loops)
        .skip_unknown_commands(decode.skip_unknown)
        .diagnostics(diagnostics(decode.verbose))
}
