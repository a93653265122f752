// src/bin/cli.rs
use color_eyre::eyre::WrapErr;
use xp_tracker::{cli, log};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    log::init();
    cli::run().wrap_err("xp_tracker run failed")?;
    Ok(())
}
