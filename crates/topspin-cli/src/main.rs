mod app;
mod args;
mod commands;

use clap::Parser;

use args::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    topspin_core::set_verbose(cli.verbose);

    let result = match cli.command {
        Commands::Analyze(analyze_args) => commands::analyze::run(analyze_args).await,
        Commands::Models { all } => commands::models::run(all).await,
        Commands::Config(config_args) => commands::config::run(config_args),
        Commands::Setup => commands::setup::run().await,
    };

    if let Err(e) = result {
        app::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
