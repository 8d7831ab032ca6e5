use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless playback-reset demo session", long_about = None)]
pub struct Args {
    /// Log at debug level, including every skipped attempt
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory holding the settings file (default: ./rewind_data)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}
