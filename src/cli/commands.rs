//! Command dispatch: settings layering, service wiring and terminal output

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::{ExportFormat, GraphOutput, LeafSummary};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        cmd_completion(*shell);
        return Ok(());
    }

    let container = ServiceContainer::new(load_settings(cli)?);
    match command {
        Commands::Tree { file } => cmd_tree(&container, file),
        Commands::Leaves { file } => cmd_leaves(&container, file),
        Commands::Links { file } => cmd_links(&container, file),
        Commands::Export {
            file,
            format,
            output,
        } => cmd_export(&container, file, *format, output.as_deref()),
        Commands::Check { files } => cmd_check(&container, files),
        Commands::Config { command } => cmd_config(&container, cli, command),
        Commands::Completion { .. } => Ok(()),
    }
}

/// Config layers first, then command line overrides.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    if cli.overrides.delimiter.as_deref() == Some("") {
        return Err(CliError::InvalidArgs("--delimiter must not be empty".into()));
    }
    let project_dir = cli
        .project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let mut settings = Settings::load(project_dir.as_deref())?;
    cli.overrides.apply(&mut settings);
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn build(container: &ServiceContainer, file: &Path) -> CliResult<GraphOutput> {
    let built = container.graph_service().build_file(file)?;
    for rejected in &built.rejected {
        output::warning(&format!("skipped record {}", rejected));
    }
    Ok(built)
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let built = build(container, file)?;
    output::info(&built.graph.to_tree_string());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_leaves(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let built = build(container, file)?;
    for &leaf in built.graph.leaves() {
        if let Some(summary) = LeafSummary::new(&built.graph, leaf) {
            output::info(&summary);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_links(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let built = build(container, file)?;
    for (source, target) in built.graph.edge_paths() {
        output::info(&format!("{} -> {}", source, target));
    }
    for dangling in built.graph.dangling() {
        output::warning(&format!("dangling import {}", dangling));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(
    container: &ServiceContainer,
    file: &Path,
    format: ExportFormat,
    target: Option<&Path>,
) -> CliResult<()> {
    let built = build(container, file)?;
    let service = container.graph_service();
    let rendered = service.export(&built.graph, format)?;
    match target {
        Some(path) => {
            service.write_output(path, &rendered)?;
            output::action("Wrote", &path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", rendered)
                .map_err(|e| InfraError::io("write export to stdout", e))?;
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer, files: &[PathBuf]) -> CliResult<()> {
    let results = container.graph_service().build_files(files);
    let total = results.len();
    let mut failed = 0;

    for (path, result) in results {
        match result {
            Ok(built) => {
                let graph = &built.graph;
                output::success(&format!(
                    "{}: {} leaves, {} edges",
                    path.display(),
                    graph.leaves().len(),
                    graph.edges().len()
                ));
                for rejected in &built.rejected {
                    output::detail(&format!("skipped record {}", rejected));
                }
                for dangling in graph.dangling() {
                    output::detail(&format!("dangling import {}", dangling));
                }
            }
            Err(e) => {
                failed += 1;
                output::failure(&format!("{}: {}", path.display(), e));
            }
        }
    }

    if failed > 0 {
        return Err(CliError::CheckFailed { failed, total });
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            output::header("Config files");
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}", path.display())),
                None => output::detail("global: unavailable"),
            }
            if let Some(dir) = cli
                .project_dir
                .clone()
                .or_else(|| std::env::current_dir().ok())
            {
                output::detail(&format!("local:  {}", local_config_path(&dir).display()));
            }
        }
    }
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
