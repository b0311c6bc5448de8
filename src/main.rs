use clap::Parser;
use tracing_subscriber::EnvFilter;

use repmatch::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("repmatch=debug,info")
    } else {
        EnvFilter::new("repmatch=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Match(args) => {
            cli::matching::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Crosscheck(args) => {
            cli::crosscheck::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Network(args) => {
            cli::network::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
