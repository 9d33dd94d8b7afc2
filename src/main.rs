mod cli;
mod model;
mod plugin;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, PluginCommand};
use model::config::AppConfig;
use plugin::{InstallLocation, Plugman, PluginInstaller, ToolContext};

fn main() -> ExitCode {
    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = match init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("plugin: logging disabled: {e:#}");
            None
        }
    };

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to a daily file, never stdout: stdout carries listings and plugman output.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "plugin-orchestrator")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("plugin-orchestrator"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "plugin.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plugin=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(anyhow::Error::msg)?;

    Ok(guard)
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let project_root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let installer = build_installer(&project_root)?;
    tracing::info!("{command:?} in {}", project_root.display());

    match command {
        PluginCommand::Add {
            reference,
            dry_run: true,
        } => {
            for request in installer.plan_install(&reference)? {
                if let (Some(plugin), Some(location)) = (request.plugin(), request.location()) {
                    println!("{location:?}\t{}", plugin.display());
                }
            }
        }
        PluginCommand::Add { reference, .. } => installer.install(&reference)?,
        PluginCommand::Rm { names, purge } => installer.remove_installed(&names, purge)?,
        PluginCommand::Ls { tool: true } => installer.list_via_tool()?,
        PluginCommand::Ls { tool: false } => {
            for name in installer.list()? {
                println!("{name}");
            }
        }
        PluginCommand::Fetch { reference, global } => {
            let location = global.then_some(InstallLocation::Global);
            installer.fetch(&reference, location)?
        }
        PluginCommand::Prepare => installer.prepare()?,
    }

    Ok(())
}

fn build_installer(project_root: &Path) -> Result<PluginInstaller<Plugman>> {
    let config = AppConfig::load(project_root)?;

    let context = ToolContext {
        platform: config.project.platform.clone(),
        project_root: project_root.to_path_buf(),
        global_root: config.global_root(project_root)?,
        local_root: config.local_root(project_root),
    };
    tracing::debug!(
        "global root {}, local root {}",
        context.global_root.display(),
        context.local_root.display()
    );

    let tool = Plugman::new(config.tool_path(project_root)?, context, config.timeout())
        .with_runner(config.runner());
    Ok(PluginInstaller::new(tool, config.project.descriptor))
}
