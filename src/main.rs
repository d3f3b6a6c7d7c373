//! Suite Splitter - parallel test suite partitioning tool
//!
//! A CLI tool for splitting hierarchical test suites into balanced,
//! independent execution contexts and running them in parallel.
//!
//! ## Usage
//!
//! ```bash
//! # Show the contexts for every test page under a suite
//! suite-splitter split --tree pages.yaml --suite FrontPage.AcceptanceTests -n 4
//!
//! # Run them, four contexts at a time, recording runtimes
//! suite-splitter run --tree pages.yaml --suite FrontPage.AcceptanceTests \
//!     --exec 'run-fitnesse-page.sh {root} {page}'
//!
//! # Inspect recorded runtimes
//! suite-splitter history show FrontPage.AcceptanceTests.LoginTest
//!
//! # Write an example configuration file
//! suite-splitter config init
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

use suite_splitter::cli::{
    self, Args, ConfigAction, HistoryAction, RunArgs, SelectionArgs, SplitArgs,
};
use suite_splitter::config::{print_env_help, AppConfig, ConfigFile, EnvConfig, WeightStrategy};
use suite_splitter::executor::{CommandTemplate, ContextDispatcher, PageRunner};
use suite_splitter::output::{ContextFormatter, OutputFormat};
use suite_splitter::results::{generate_run_id, ExportFormat};
use suite_splitter::utils::logger::{init_logger, LogLevel};
use suite_splitter::{
    ContextGenerator, ExecutionContext, LoadBalancingStrategy, Page, PagePath, PageTree,
    PartitionStrategy, TreeManifest, WholeGroupStrategy, WikiTree,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();
    let config = load_config(args.config.as_deref(), &env)?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config.log_level()
    };
    init_logger(level);

    match args.command {
        cli::Command::Split(split_args) => {
            split(split_args, config, &env)?;
        }
        cli::Command::Run(run_args) => {
            run(run_args, config, &env).await?;
        }
        cli::Command::History(history_args) => {
            manage_history(history_args, &config)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &config, &env)?;
        }
    }

    Ok(())
}

/// Config file (explicit, environment or standard location) with
/// environment overrides applied
fn load_config(path: Option<&str>, env: &EnvConfig) -> Result<AppConfig> {
    let file = match path.or(env.config_file.as_deref()) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut config = file.app;
    env.apply(&mut config)?;
    Ok(config)
}

fn output_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(format).ok_or_else(|| anyhow!("Unknown output format: {format}"))
}

fn split(args: SplitArgs, config: AppConfig, env: &EnvConfig) -> Result<()> {
    let formatter = ContextFormatter::new(output_format(&args.selection.format)?);
    let contexts = plan(&args.selection, config, env)?;
    println!("{}", formatter.format_contexts(&contexts));
    Ok(())
}

async fn run(args: RunArgs, config: AppConfig, env: &EnvConfig) -> Result<()> {
    let formatter = ContextFormatter::new(output_format(&args.selection.format)?);
    let template = CommandTemplate::new(args.exec)?;
    let timeout = args
        .timeout
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.page_timeout());
    let concurrent = args.concurrent.unwrap_or(config.max_concurrent);
    let run_fixtures = config.run_fixtures && !args.skip_fixtures;
    let store = config.history_store();

    let contexts = plan(&args.selection, config, env)?;
    let runner = PageRunner::new(template).with_timeout(timeout);
    let dispatcher = ContextDispatcher::new(runner, concurrent).run_fixtures(run_fixtures);
    let outcomes = dispatcher.dispatch(contexts).await?;

    println!("{}", formatter.format_outcomes(&outcomes));

    if !args.no_record {
        let run_id = generate_run_id();
        let mut recorded = 0;
        for outcome in &outcomes {
            recorded += store.record_context(&run_id, outcome)?;
        }
        info!(
            "Recorded {} page runtimes as run {} in {}",
            recorded,
            run_id,
            store.base_dir().display()
        );
    }

    if let Some(output) = &args.output {
        let file = File::create(output).with_context(|| format!("Failed to create {output}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &outcomes)
            .context("Failed to write outcomes")?;
        info!("Outcomes saved to {output}");
    }

    if outcomes.iter().any(|o| !o.is_all_passed()) {
        std::process::exit(1);
    }
    Ok(())
}

/// Load the tree, select pages and generate contexts. Command-line options
/// override the configuration.
fn plan(
    selection: &SelectionArgs,
    mut config: AppConfig,
    env: &EnvConfig,
) -> Result<Vec<ExecutionContext>> {
    if let Some(large) = selection.large {
        config.large_threshold = large;
    }
    if let Some(strategy) = &selection.strategy {
        config.weight_strategy = WeightStrategy::from_str(strategy)
            .ok_or_else(|| anyhow!("Unknown weight strategy: {strategy}"))?;
    }
    if selection.no_suite_root {
        config.enforce_suite_root = false;
    }
    let count = selection.count.unwrap_or_else(|| env.count_or(config.max_concurrent));

    let tree = TreeManifest::load(&selection.tree)?.build()?;
    let pages = select_pages(&tree, selection)?;
    info!(
        "Selected {} pages from {} for {} workers ({} weights)",
        pages.len(),
        selection.tree,
        count,
        config.weight_strategy
    );

    let strategy: Box<dyn PartitionStrategy> = if selection.whole_groups {
        Box::new(WholeGroupStrategy)
    } else {
        Box::new(LoadBalancingStrategy::new(config.large_threshold))
    };

    let generator = ContextGenerator::new(&tree, config.weight_source())
        .with_strategy(strategy)
        .enforce_suite_root(config.enforce_suite_root)
        .with_fixture_names(config.fixtures.clone());

    match generator.generate(pages, count) {
        Ok(contexts) => Ok(contexts),
        Err(e) if e.is_recoverable() => {
            bail!("{e} (use --no-suite-root to allow non-suite context roots)")
        }
        Err(e) => Err(e).context("Failed to generate execution contexts"),
    }
}

/// Pages named with `--page` plus the test pages under each `--suite`.
/// Without either, every test page in the tree.
fn select_pages(tree: &WikiTree, selection: &SelectionArgs) -> Result<Vec<Page>> {
    let resolve = |path: &str| {
        tree.resolve(&PagePath::parse(path))
            .ok_or_else(|| anyhow!("Page not found in tree: {path}"))
    };

    if selection.pages.is_empty() && selection.suites.is_empty() {
        return Ok(tree.test_pages_under(&tree.root()));
    }

    let mut pages = Vec::new();
    for path in &selection.pages {
        pages.push(resolve(path)?);
    }
    for path in &selection.suites {
        let suite = resolve(path)?;
        let found = tree.test_pages_under(&suite);
        if found.is_empty() {
            warn!("No test pages under {path}");
        }
        pages.extend(found);
    }
    Ok(pages)
}

fn manage_history(args: cli::HistoryArgs, config: &AppConfig) -> Result<()> {
    let store = config.history_store();

    match args.action {
        HistoryAction::List => {
            let pages = store.list_pages()?;
            if pages.is_empty() {
                println!("No history found in {}", store.base_dir().display());
                return Ok(());
            }

            println!("Pages with recorded runtimes ({}):", store.base_dir().display());
            for page in pages {
                let name = page.to_string();
                match store.page_history(&page) {
                    Ok(Some(history)) => println!(
                        "  {:50} {:>4} runs  avg {:>8}ms",
                        name,
                        history.len(),
                        history.average_duration_ms().unwrap_or(0)
                    ),
                    Ok(None) => println!("  {name:50}    0 runs"),
                    Err(e) => println!("  {name:50} unreadable: {e:#}"),
                }
            }
        }
        HistoryAction::Show { page, format } => {
            let formatter = ContextFormatter::new(output_format(&format)?);
            let path = PagePath::parse(&page);
            match store.page_history(&path)? {
                Some(history) => println!("{}", formatter.format_history(&history)),
                None => println!("No history for {page}"),
            }
        }
        HistoryAction::Export {
            output,
            format,
            page,
        } => {
            let path = Path::new(&output);
            let format = match format {
                Some(f) => ExportFormat::from_str(&f)
                    .ok_or_else(|| anyhow!("Unknown export format: {f}"))?,
                None => ExportFormat::from_extension(path).unwrap_or(ExportFormat::Json),
            };

            let records = match page {
                Some(page) => store
                    .page_history(&PagePath::parse(&page))?
                    .map(|h| h.records().to_vec())
                    .unwrap_or_default(),
                None => store.all_records()?,
            };
            store.export(&records, path, format)?;
            println!("Exported {} records to {output}", records.len());
        }
        HistoryAction::Clear { page, all } => match (page, all) {
            (Some(page), false) => {
                if store.clear_page(&PagePath::parse(&page))? {
                    println!("Cleared history for {page}");
                } else {
                    println!("No history for {page}");
                }
            }
            (None, true) => {
                let cleared = store.clear_all()?;
                println!("Cleared history for {cleared} pages");
            }
            _ => bail!("Specify either a page or --all"),
        },
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, config: &AppConfig, env: &EnvConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            if Path::new(&path).exists() && !force {
                bail!("{path} already exists (use --force to overwrite)");
            }
            ConfigFile::example().save(&path)?;
            println!("Wrote example configuration to {path}");
        }
        ConfigAction::Show => {
            let effective = ConfigFile {
                app: config.clone(),
                ..ConfigFile::default()
            };
            print!("{}", serde_yaml::to_string(&effective).context("Failed to serialize config")?);
        }
        ConfigAction::Validate { path } => {
            let path = path.map(Into::into).or_else(ConfigFile::find);
            match path {
                Some(path) => {
                    ConfigFile::load(&path)?;
                    println!("✓ {} is valid", path.display());
                }
                None => println!("No configuration file found; using defaults"),
            }
        }
        ConfigAction::Env => {
            print_env_help();
            if env.has_any() {
                println!();
                env.print_summary();
            }
        }
    }

    Ok(())
}
