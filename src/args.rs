use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::pak::InstallSpec;

#[derive(Parser)]
#[clap(version, about, author)]
pub struct Args {
    #[clap(short, long, help = "Level of verbosity", default_value = "info")]
    pub verbosity: LevelFilter,

    #[clap(short, long, help = "Path to the configuration file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub action: Action,
}

#[derive(Subcommand)]
pub enum Action {
    #[clap(about = "Install pak(s)")]
    Install {
        #[clap(
            help = "Pak(s) to install, as 'id' or 'id@version'",
            required = true
        )]
        specs: Vec<InstallSpec>,
    },

    #[clap(about = "Uninstall pak(s)")]
    Uninstall {
        #[clap(help = "ID of the pak(s) to uninstall", required = true)]
        ids: Vec<String>,
    },

    #[clap(about = "Upgrade installed pak(s)")]
    Upgrade {
        #[clap(help = "Only upgrade some pak(s), as 'id' or 'id@version'")]
        specs: Vec<InstallSpec>,
    },

    #[clap(about = "List installed paks that have a newer version available")]
    Upgradable,

    #[clap(about = "List every pak of the source repository")]
    List,

    #[clap(about = "List installed paks")]
    Installed,

    #[clap(about = "Search for a pak in the source repository")]
    Search {
        #[clap(help = "Text the pak's ID must contain")]
        query: String,
    },
}
