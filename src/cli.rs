use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Add, remove and list the plugins of a platform project.
#[derive(Debug, Parser)]
#[command(name = "plugin", version, about)]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<PluginCommand>,
}

#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// Adds all plugins contained in the given directory
    #[command(visible_alias = "install")]
    Add {
        /// Path, globally fetched name, or installed name
        reference: String,
        /// Print the install steps without running plugman
        #[arg(long)]
        dry_run: bool,
    },

    /// Removes all of the listed plugins
    #[command(visible_aliases = ["remove", "uninstall"])]
    Rm {
        names: Vec<String>,

        /// Also delete the local copy after uninstalling
        #[arg(long)]
        purge: bool,
    },

    /// Lists all of the currently installed plugins
    #[command(visible_alias = "list")]
    Ls {
        /// Ask plugman instead of reading the plugins directory
        #[arg(long)]
        tool: bool,
    },

    /// Fetches a plugin without installing it
    Fetch {
        reference: String,

        /// Fetch into the global plugin cache
        #[arg(long)]
        global: bool,
    },

    /// Re-runs plugman's prepare step for the project
    Prepare,
}
