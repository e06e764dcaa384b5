#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(unused_crate_dependencies)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser as _;
use colored::Colorize;
use log::{error, info, warn, LevelFilter};

// Bundling a vendored version of OpenSSL to avoid cross-platform compilation problems
// And avoid requiring OpenSSL on the client machine
use openssl_sys as _;

use self::{
    args::{Action, Args},
    display::{installed_table, specs_table, upgradable_table},
    logger::Logger,
    pak::{
        find_pak_error, search, sorted_specs, LocalRepository, LogFacade, Manager,
        SourceRepository,
    },
};

mod args;
mod config;
mod display;
mod logger;
mod pak;
mod repository;
mod yaml;

#[tokio::main]
async fn main() -> ExitCode {
    let Args {
        verbosity,
        config,
        action,
    } = Args::parse();

    // Set up the logger
    if let Err(err) = Logger::init(verbosity) {
        eprintln!("Failed to set up the logger: {err}");
        return ExitCode::FAILURE;
    }

    let result = tokio::select! {
        result = inner(config, action) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, exiting...");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,

        Err(err) => {
            error!("{err:?}");

            if find_pak_error(&err).is_some_and(|err| err.is_not_found()) {
                info!(
                    "Run {} to see the paks available in the source repository",
                    "pakman list".bright_yellow()
                );
            }

            ExitCode::FAILURE
        }
    }
}

async fn inner(config_path: Option<PathBuf>, action: Action) -> Result<()> {
    let config_path = config::locate(config_path)?;
    let config = config::load(&config_path).await?;

    if config.debug {
        Logger::raise_level(LevelFilter::Debug);
    }

    let manager = Manager::new(config.local_repository(), config.remote_repository()?)
        .with_logger(LogFacade);

    run(&manager, action).await
}

async fn run<L: LocalRepository, S: SourceRepository>(
    manager: &Manager<L, S>,
    action: Action,
) -> Result<()> {
    match action {
        Action::Install { specs } => {
            manager.install(&specs).await?;

            info!(
                "Successfully installed {} pak(s)!",
                specs.len().to_string().bright_yellow()
            );
        }

        Action::Uninstall { ids } => {
            manager.uninstall(&ids).await?;

            info!(
                "Successfully uninstalled {} pak(s)!",
                ids.len().to_string().bright_yellow()
            );
        }

        Action::Upgrade { specs } => {
            manager.upgrade(&specs).await?;
            info!("Upgrade complete!");
        }

        Action::Upgradable => {
            let upgradable = manager.upgradable().await?;

            if upgradable.is_empty() {
                info!("All installed paks are up to date");
                return Ok(());
            }

            println!("{}", upgradable_table(&upgradable));
        }

        Action::List => {
            let index = manager.list().await?;

            if index.is_empty() {
                warn!("The source repository has no pak");
                return Ok(());
            }

            println!("{}", specs_table(sorted_specs(&index)));
        }

        Action::Installed => {
            let installed = manager.list_installed().await?;

            if installed.is_empty() {
                info!("No pak is installed");
                return Ok(());
            }

            println!("{}", installed_table(&installed));
        }

        Action::Search { query } => {
            let index = manager.list().await?;
            let results = search(&index, &query);

            if results.is_empty() {
                warn!("No pak matches {}", query.bright_yellow());
                return Ok(());
            }

            println!("{}", specs_table(results));
        }
    }

    Ok(())
}
