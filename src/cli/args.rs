//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::application::ExportFormat;
use crate::config::Settings;
use crate::domain::{DanglingPolicy, ImportPolicy, RootPolicy};

/// Rebuild dotted-name hierarchies and link their imports into dependency graphs
#[derive(Parser, Debug)]
#[command(name = "hiergraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Directory with a local .hiergraph.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings overrides, applied after all config layers.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Separator between name segments
    #[arg(long, global = true)]
    pub delimiter: Option<String>,

    /// Several top-level names: umbrella | reject
    #[arg(long, global = true)]
    pub root_policy: Option<RootPolicy>,

    /// Unresolved imports: drop | reject
    #[arg(long, global = true)]
    pub dangling: Option<DanglingPolicy>,

    /// Drop repeated imports
    #[arg(long, global = true)]
    pub dedup: bool,

    /// Fail a batch on any refused record
    #[arg(long, global = true)]
    pub strict: bool,

    /// Keep input order instead of sorting siblings
    #[arg(long, global = true)]
    pub no_sort: bool,
}

impl Overrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(delimiter) = &self.delimiter {
            settings.delimiter = delimiter.clone();
        }
        if let Some(policy) = self.root_policy {
            settings.root_policy = policy;
        }
        if let Some(policy) = self.dangling {
            settings.dangling = policy;
        }
        if self.dedup {
            settings.imports = ImportPolicy::Dedup;
        }
        if self.strict {
            settings.strict = true;
        }
        if self.no_sort {
            settings.sort_children = false;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy as a tree
    Tree {
        /// JSON record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List leaves with their edge counts
    Leaves {
        /// JSON record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List resolved edges and dangling imports
    Links {
        /// JSON record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Write the linked graph as JSON
    Export {
        /// JSON record file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Output layout: graph | hierarchy
        #[arg(short, long, default_value = "graph")]
        format: ExportFormat,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Validate record files
    Check {
        /// JSON record files, built in parallel
        #[arg(required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
}
