//! Strata - versioned process archive publisher
//!
//! Usage:
//!   strata publish orders --server local --source ./orders --project shop
//!   strata versions --server local
//!   strata undeploy --server local shop /opt/ode/processes/orders-20240101120000.jar
//!   strata remove --server local shop
//!   strata servers

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strata_core::commands::{
    CommandContext, PublishCommand, PublishOptions, PublishReport, VersionsCommand,
};
use strata_core::deploy::{PublishPhase, RemovalReport};
use strata_core::transfer::CancelToken;
use strata_core::types::{DeltaKind, PublishKind};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Versioned process archive publisher", long_about = None)]
struct Cli {
    /// Path to strata.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a module as a new timestamped archive
    Publish(PublishArgs),

    /// List recorded versions on a server
    #[command(alias = "ls")]
    Versions {
        /// Only show this project
        project: Option<String>,
        /// Target server from strata.toml
        #[arg(long, short)]
        server: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete one deployed version and drop it from the ledger
    Undeploy {
        /// Owning project
        project: String,
        /// Recorded path of the version to delete
        path: String,
        /// Target server from strata.toml
        #[arg(long, short)]
        server: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every deployed version of a project
    #[command(alias = "rm")]
    Remove {
        /// Owning project
        project: String,
        /// Target server from strata.toml
        #[arg(long, short)]
        server: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List configured servers
    Servers {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct PublishArgs {
    /// Module name
    module: String,
    /// Target server from strata.toml
    #[arg(long, short)]
    server: String,
    /// Directory holding the module content
    #[arg(long)]
    source: PathBuf,
    /// Owning project; published versions are recorded under it
    #[arg(long, short)]
    project: Option<String>,
    /// Enclosing module, outermost first (repeatable)
    #[arg(long = "parent", value_name = "MODULE")]
    parents: Vec<String>,
    /// Requested publish kind
    #[arg(long, default_value = "auto")]
    kind: KindArg,
    /// What changed since the last publish
    #[arg(long, default_value = "changed")]
    delta: DeltaArg,
    /// Treat the module as never published before
    #[arg(long)]
    first_publish: bool,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show issues (non-zero exit if problems)
    Quiet,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Auto,
    Incremental,
    Full,
    Clean,
}

impl From<KindArg> for PublishKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Auto => PublishKind::Auto,
            KindArg::Incremental => PublishKind::Incremental,
            KindArg::Full => PublishKind::Full,
            KindArg::Clean => PublishKind::Clean,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DeltaArg {
    NoChange,
    Added,
    Changed,
    Removed,
}

impl From<DeltaArg> for DeltaKind {
    fn from(value: DeltaArg) -> Self {
        match value {
            DeltaArg::NoChange => DeltaKind::NoChange,
            DeltaArg::Added => DeltaKind::Added,
            DeltaArg::Changed => DeltaKind::Changed,
            DeltaArg::Removed => DeltaKind::Removed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "strata=debug,info"
    } else {
        "strata=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = CommandContext::with_defaults(cli.config)?;
    run_cli(&ctx, cli.command)
}

fn run_cli(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::Publish(args) => run_publish(ctx, args),
        Commands::Versions {
            project,
            server,
            format,
        } => run_versions(ctx, &server, project.as_deref(), format),
        Commands::Undeploy {
            project,
            path,
            server,
            yes,
            format,
        } => run_undeploy(ctx, &server, &project, &path, yes, format),
        Commands::Remove {
            project,
            server,
            yes,
            format,
        } => run_remove(ctx, &server, &project, yes, format),
        Commands::Servers { format } => run_servers(ctx, format),
    }
}

fn run_publish(ctx: &CommandContext, args: PublishArgs) -> Result<()> {
    let mut options = PublishOptions::new(&args.server, &args.module, &args.source)
        .with_kind(args.kind.into())
        .with_delta(args.delta.into());
    options.parents = args.parents.clone();
    if let Some(project) = &args.project {
        options = options.with_project(project);
    }
    if args.first_publish {
        options.prior_publish_known = Some(false);
    }

    let report = PublishCommand::new(ctx).execute(&options, &CancelToken::new())?;

    match args.format {
        OutputFormat::Table => print_publish_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {
            for error in &report.errors {
                eprintln!("{}: {}", error.kind, error.message);
            }
        }
    }

    if !report.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_publish_table(report: &PublishReport) {
    let header = format!("{} ({})", report.module, report.publish_type);
    match report.phase {
        PublishPhase::Done if report.is_ok() => {
            println!("{} {}", style("✓").green(), style(header).bold());
        }
        PublishPhase::Done => {
            println!("{} {}", style("⚠").yellow(), style(header).bold());
        }
        _ => println!("{} {}", style("✗").red(), style(header).bold()),
    }

    println!("  Server:  {}", report.server);
    println!("  State:   {}", report.state);
    println!("  Phase:   {}", report.phase);
    if let Some(target) = &report.target_path {
        println!("  Target:  {}", target.display());
    }
    if report.target_path.is_some() || report.recorded {
        let recorded = if report.recorded {
            style("yes").green()
        } else {
            style("no").yellow()
        };
        println!("  Recorded: {}", recorded);
    }
    if let Some(removal) = &report.removal {
        print_removal_lines(removal);
    }
    if let Some(summary) = &report.summary {
        println!("  {}", style(summary).red());
    }
    for error in &report.errors {
        println!("    - [{}] {}", error.kind, error.message);
    }
}

fn run_versions(
    ctx: &CommandContext,
    server: &str,
    project: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let report = VersionsCommand::new(ctx).list(server, project)?;

    match format {
        OutputFormat::Table => {
            println!(
                "Server: {} ({})",
                style(&report.server).bold(),
                report.ledger_path.display()
            );
            if report.projects.is_empty() {
                println!("  No recorded versions");
            }
            for (project, paths) in &report.projects {
                println!();
                println!("  {} ({} version(s))", style(project).cyan(), paths.len());
                for path in paths {
                    println!("    {}", path);
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {
            for paths in report.projects.values() {
                for path in paths {
                    println!("{}", path);
                }
            }
        }
    }
    Ok(())
}

fn run_undeploy(
    ctx: &CommandContext,
    server: &str,
    project: &str,
    path: &str,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    if !yes && !confirm(&format!("Delete {} from server '{}'?", path, server))? {
        println!("Undeploy cancelled.");
        return Ok(());
    }

    let report = VersionsCommand::new(ctx).undeploy(server, project, path, &CancelToken::new())?;

    match format {
        OutputFormat::Table => {
            println!("{} Undeployed {}", style("✓").green(), report.path);
            println!(
                "  {} version(s) of '{}' still recorded",
                report.remaining.len(),
                report.project
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn run_remove(
    ctx: &CommandContext,
    server: &str,
    project: &str,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    let cmd = VersionsCommand::new(ctx);
    let recorded = cmd.list(server, Some(project))?.total();
    if recorded == 0 {
        println!("No recorded versions of '{}' on server '{}'", project, server);
        return Ok(());
    }
    if !yes
        && !confirm(&format!(
            "Delete all {} recorded version(s) of '{}' from server '{}'?",
            recorded, project, server
        ))?
    {
        println!("Removal cancelled.");
        return Ok(());
    }

    let report = cmd.remove_all(server, project, &CancelToken::new())?;

    match format {
        OutputFormat::Table => {
            let mark = if report.is_clean() {
                style("✓").green()
            } else {
                style("⚠").yellow()
            };
            println!("{} Removed versions of '{}'", mark, report.project);
            print_removal_lines(&report);
        }
        OutputFormat::Json => {
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|err| serde_json::json!({ "kind": err.kind(), "message": err.to_string() }))
                .collect();
            let output = serde_json::json!({
                "report": report,
                "failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {
            for err in &report.failures {
                eprintln!("{}: {}", err.kind(), err);
            }
        }
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_removal_lines(report: &RemovalReport) {
    println!(
        "  Deleted: {}/{}",
        report.deleted.len(),
        report.attempted.len()
    );
    for failure in &report.failures {
        println!("    - {}", style(failure).red());
    }
    if report.cancelled {
        println!("  {}", style("Cancelled; undeleted versions remain recorded").yellow());
    } else if report.ledger_cleared {
        println!("  Ledger record cleared");
    }
}

fn run_servers(ctx: &CommandContext, format: OutputFormat) -> Result<()> {
    let servers = VersionsCommand::new(ctx).servers()?;

    match format {
        OutputFormat::Table => {
            if servers.is_empty() {
                println!(
                    "No servers configured in {}",
                    ctx.config_path().display()
                );
            }
            for server in &servers {
                let packaging = if server.zip_deployments {
                    "zip"
                } else {
                    "directory"
                };
                println!(
                    "{}  {}  [{}]  {} version(s)",
                    style(&server.name).bold(),
                    server.deploy_dir.display(),
                    packaging,
                    server.recorded_versions
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&servers)?),
        OutputFormat::Quiet => {
            for server in &servers {
                println!("{}", server.name);
            }
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
