//! kepctl - Kubernetes Enhancement Proposal tooling
//!
//! ## Commands
//!
//! - `validate`: Check KEP metadata files against the schema and registry
//! - `query`: Search KEPs in a local checkout and, optionally, open pull requests
//! - `registry`: Show the groups and PRR approvers KEPs are checked against

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kep_core::{
    obs, read_proposal, run_query, GitHubConfig, GitHubPullRequests, LocalRepo, Proposal,
    PullRequestSource, QueryOpts, QueryResult, Registry,
};
use kep_registry::{RegistryConfig, RegistryLoader};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "kepctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and query Kubernetes Enhancement Proposals", long_about = None)]
struct Cli {
    /// Path to a checkout of the enhancements repository
    #[arg(long, global = true, env = "ENHANCEMENTS_PATH", default_value = ".")]
    repo_path: PathBuf,

    /// File holding a GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long, global = true)]
    gh_token_path: Option<PathBuf>,

    /// Group listing source, URL or file path
    #[arg(long, global = true, env = "KEP_SIGS_SOURCE")]
    sigs_source: Option<String>,

    /// OWNERS_ALIASES source, URL or file path
    #[arg(long, global = true, env = "KEP_ALIASES_SOURCE")]
    aliases_source: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate KEP metadata files (kep.yaml or Markdown with front matter)
    Validate {
        /// Files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Search for KEPs matching the given criteria
    ///
    /// # TDD: test_query_cli_defaults
    Query {
        /// Group selector regex; repeatable
        #[arg(long = "sig")]
        sigs: Vec<String>,

        /// Allowed status; repeatable
        #[arg(long)]
        status: Vec<String>,

        /// Allowed stage; repeatable
        #[arg(long)]
        stage: Vec<String>,

        /// Allowed PRR approver; repeatable, any match keeps the KEP
        #[arg(long = "prr")]
        prr_approvers: Vec<String>,

        /// Also search open pull requests on GitHub
        #[arg(long)]
        include_prs: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Print the loaded groups and PRR approvers
    Registry {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Yaml,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    kep_core::init_tracing(cli.json, level);

    let registry = load_registry(&cli).await?;

    match cli.command {
        Commands::Validate { ref files } => cmd_validate(&registry, files),
        Commands::Query {
            ref sigs,
            ref status,
            ref stage,
            ref prr_approvers,
            include_prs,
            output,
        } => {
            let opts = QueryOpts {
                groups: sigs.clone(),
                status: status.clone(),
                stage: stage.clone(),
                prr_approvers: prr_approvers.clone(),
                include_prs,
            };
            cmd_query(&cli, &registry, &opts, output).await
        }
        Commands::Registry { output } => cmd_registry(&registry, output),
    }
}

/// Load the reference registry; nothing can be validated without it.
async fn load_registry(cli: &Cli) -> Result<Registry> {
    let mut config = RegistryConfig::from_env();
    if let Some(source) = &cli.sigs_source {
        config = config.with_groups_source(source);
    }
    if let Some(source) = &cli.aliases_source {
        config = config.with_aliases_source(source);
    }

    let loader = RegistryLoader::new(config).context("Failed to build registry loader")?;
    let registry = loader
        .load()
        .await
        .context("Failed to load the KEP reference registry")?;
    obs::emit_registry_loaded(registry.groups().len(), registry.approvers().len());
    Ok(registry)
}

fn cmd_validate(registry: &Registry, files: &[PathBuf]) -> Result<()> {
    let mut invalid = 0;
    for file in files {
        match validate_file(registry, file) {
            Ok(()) => println!("{}: OK", file.display()),
            Err(err) => {
                invalid += 1;
                println!("{}: kep is invalid: {}", file.display(), err);
            }
        }
    }

    if invalid > 0 {
        bail!("{} of {} KEPs are invalid", invalid, files.len());
    }
    Ok(())
}

fn validate_file(registry: &Registry, file: &Path) -> kep_core::Result<()> {
    read_proposal(file, registry).map(|_| ())
}

async fn cmd_query(
    cli: &Cli,
    registry: &Registry,
    opts: &QueryOpts,
    output: OutputFormat,
) -> Result<()> {
    let repo = LocalRepo::open(&cli.repo_path).context("unable to search KEPs")?;

    let github = if opts.include_prs {
        Some(github_source(cli.gh_token_path.as_deref())?)
    } else {
        None
    };
    let pull_requests = github.as_ref().map(|g| g as &dyn PullRequestSource);

    info!(repo = %repo.root().display(), "searching for KEPs");
    let result = run_query(opts, registry, &repo, pull_requests).await?;

    for issue in &result.issues {
        eprintln!("error: {}", issue);
    }
    print_result(&result, output)
}

fn github_source(token_path: Option<&Path>) -> Result<GitHubPullRequests> {
    let mut config = GitHubConfig::from_env();
    if let Some(path) = token_path {
        config = config
            .with_token_file(path)
            .context("Failed to read GitHub token")?;
    }
    GitHubPullRequests::new(config).context("Failed to build GitHub client")
}

fn print_result(result: &QueryResult, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => print!("{}", render_table(&result.proposals)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.proposals)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&result.proposals)?),
    }
    Ok(())
}

const COLUMNS: [&str; 7] = [
    "LastUpdated",
    "Stage",
    "Status",
    "SIG",
    "Authors",
    "Title",
    "Link",
];

fn table_row(proposal: &Proposal) -> [String; 7] {
    [
        proposal.last_updated_str().to_string(),
        proposal.stage_str().to_string(),
        proposal.status.clone(),
        proposal.owning_sig.clone(),
        proposal.authors.join(", "),
        proposal.title.clone(),
        proposal.link.clone().unwrap_or_default(),
    ]
}

/// Render proposals as a left-aligned table, one line per proposal.
fn render_table(proposals: &[Proposal]) -> String {
    let rows: Vec<[String; 7]> = proposals.iter().map(table_row).collect();

    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = table_line(COLUMNS.iter().copied(), &widths);
    for row in &rows {
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}

#[derive(Serialize)]
struct RegistryView<'a> {
    groups: &'a [String],
    prr_approvers: &'a [String],
}

fn cmd_registry(registry: &Registry, output: OutputFormat) -> Result<()> {
    let view = RegistryView {
        groups: registry.groups(),
        prr_approvers: registry.approvers(),
    };
    match output {
        OutputFormat::Table => {
            println!("Groups ({}):", view.groups.len());
            for group in view.groups {
                println!("  {}", group);
            }
            println!("PRR approvers ({}):", view.prr_approvers.len());
            for approver in view.prr_approvers {
                println!("  {}", approver);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&view)?),
    }
    Ok(())
}
