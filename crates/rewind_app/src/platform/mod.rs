mod cli;
mod demo;
mod logging;
mod persistence;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rewind_logging::rewind_info;

use self::cli::Args;
use self::logging::LogDestination;
use self::persistence::RonSettingsStore;

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::initialize(LogDestination::Both, args.verbose);

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .context("resolving working directory")?
            .join("rewind_data"),
    };
    let store = RonSettingsStore::open(&data_dir)
        .with_context(|| format!("opening settings in {:?}", data_dir))?;
    rewind_info!("settings file: {:?}", store.path());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;
    runtime.block_on(demo::run(Arc::new(store)))
}
