//! `tinyvgm` command-line tool.
//!
//! Thin frontend over the `tinyvgm` library: reads a `.vgm`/`.vgz` file (or
//! stdin), then prints the header, walks the command stream, or checks the
//! declared sample total.

mod cui;
mod vgm;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Decode options shared by the subcommands that walk commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct DecodeArgs {
    /// Number of times to rewind to the loop point
    #[arg(long, default_value_t = 0)]
    loops: u32,

    /// Skip unknown opcodes as single bytes instead of stopping
    #[arg(long)]
    skip_unknown: bool,

    /// Print diagnostics (skipped opcodes, loop rewinds, ...) to stderr
    #[arg(long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show header fields, extra header and GD3 metadata
    Info {
        /// VGM file path (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print diagnostics to stderr
        #[arg(long)]
        verbose: bool,
    },
    /// List commands with offsets, payloads and sample counts
    Commands {
        /// VGM file path (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,

        /// Stop after this many commands
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Walk the whole command stream and compare waits with Total_Samples
    Check {
        /// VGM file path (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "tinyvgm",
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { file, verbose } => vgm::read_vgm_as_vec(&file)
            .and_then(|bytes| cui::info::print_info(&file, &bytes, verbose)),
        Commands::Commands {
            file,
            decode,
            limit,
        } => vgm::read_vgm_as_vec(&file)
            .and_then(|bytes| cui::commands::print_commands(&file, &bytes, decode, limit)),
        Commands::Check { file, decode } => vgm::read_vgm_as_vec(&file)
            .and_then(|bytes| cui::check::check_vgm(&file, &bytes, decode)),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
