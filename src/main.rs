use clap::Parser;
use waypoint::cli::{run_cli, Cli};
use waypoint::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging_with_config(&LogConfig::from_env())?;
    let cli = Cli::parse();
    run_cli(&cli)
}
