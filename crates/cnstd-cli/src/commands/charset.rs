//! Charset command - load a recognizer vocabulary file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cnstd_core::Charset;

/// Arguments for the charset command
#[derive(Args)]
pub struct CharsetArgs {
    /// Charset file, one symbol per line
    pub file: PathBuf,

    /// Print every symbol with its index
    #[arg(long)]
    pub show: bool,
}

/// Run the charset command.
pub fn run(args: &CharsetArgs) -> Result<()> {
    let charset = Charset::load(&args.file)?;
    if args.show {
        for (idx, symbol) in charset.symbols().iter().enumerate() {
            println!("{idx}\t{symbol}");
        }
    }
    println!("{}: {} symbols", args.file.display(), charset.len());
    Ok(())
}
