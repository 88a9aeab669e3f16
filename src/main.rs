use anyhow::Result;
use clap::Parser;
use sharedbook::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    sharedbook::logging::init_logging(cli.verbose).map_err(anyhow::Error::msg)?;
    cli.run()
}
