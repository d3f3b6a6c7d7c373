//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Balanced parallel partitioning of hierarchical test suites
#[derive(Parser, Debug)]
#[command(name = "suite-splitter")]
#[command(author = "hephaex@gmail.com")]
#[command(version)]
#[command(about = "Split test suites into balanced parallel execution contexts")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (overrides the standard locations)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Partition pages into execution contexts and print them
    Split(SplitArgs),

    /// Partition pages and run every context in parallel
    Run(RunArgs),

    /// Inspect recorded page runtimes
    History(HistoryArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Page selection and partitioning options shared by `split` and `run`
#[derive(ClapArgs, Debug)]
pub struct SelectionArgs {
    /// Page tree manifest (YAML or JSON)
    #[arg(short, long)]
    pub tree: String,

    /// Page to include (repeatable)
    #[arg(short, long = "page")]
    pub pages: Vec<String>,

    /// Include every test page under this page (repeatable)
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,

    /// Number of parallel workers to partition for
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Weight above which a fixture group is split
    #[arg(long)]
    pub large: Option<u64>,

    /// Weight strategy (average, latest, uniform)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Allow non-suite pages as context roots
    #[arg(long)]
    pub no_suite_root: bool,

    /// Never split fixture groups
    #[arg(long)]
    pub whole_groups: bool,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

/// Arguments for split command
#[derive(ClapArgs, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Arguments for run command
#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Command run per page; `{root}` and `{page}` are substituted
    #[arg(short, long)]
    pub exec: String,

    /// Maximum contexts running at once
    #[arg(short, long)]
    pub concurrent: Option<usize>,

    /// Per-page timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not run suite setup and teardown pages
    #[arg(long)]
    pub skip_fixtures: bool,

    /// Do not record runtimes in the history
    #[arg(long)]
    pub no_record: bool,

    /// Save outcomes to a JSON file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for history command
#[derive(ClapArgs, Debug)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List pages with recorded runtimes
    List,

    /// Show the recorded runs of a page
    Show {
        /// Page path
        page: String,

        /// Output format (table, json, json-pretty, csv, summary)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Export recorded runs to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: String,

        /// Export format (json, csv); defaults to the file extension
        #[arg(short, long)]
        format: Option<String>,

        /// Only export this page
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Delete recorded runs
    Clear {
        /// Page to clear
        page: Option<String>,

        /// Clear the history of every page
        #[arg(long)]
        all: bool,
    },
}

/// Arguments for config command
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Destination path
        #[arg(default_value = "suite-splitter.yaml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Validate a configuration file
    Validate {
        /// File to validate; defaults to the standard locations
        path: Option<String>,
    },

    /// List supported environment variables
    Env,
}
