mod cli;
mod commands;
mod config;
mod manifest;
mod paths;
mod provider;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Overrides;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub manifest: PathBuf,
    pub offline: bool,
    pub overrides: Overrides,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        manifest: paths::expand(&cli.manifest.to_string_lossy()),
        offline: cli.offline,
        overrides: Overrides {
            host: cli.host,
            username: cli.username,
            password: cli.password,
        },
    };

    let result = match cli.command {
        Command::Schema => commands::schema::run(&ctx),
        Command::Plan(args) => commands::plan::run(&ctx, args),
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Refresh(args) => commands::refresh::run(&ctx, args),
        Command::Destroy(args) => commands::destroy::run(&ctx, args),
        Command::Import { address, id } => commands::import::run(&ctx, &address, &id),
        Command::Coffees => commands::coffees::run(&ctx),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "hashicups", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(err) = &result
        && let Some(api) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<hashicups_client::Error>())
    {
        ui::warn(api.category().advice());
    }
    result
}
