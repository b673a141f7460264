use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use shroud::config::{Config, ReportSection};
use shroud::git::{ChangeProvider, ChangeSet, GitDiff};
use shroud::review::{publish_all, ConsoleSurface, GithubCommentSurface, MarkdownFileSurface, ReviewSurface};
use shroud::{Outcome, ReportRequest};

const DEFAULT_MODULE_NAME: &str = "Project";

#[derive(Parser)]
#[command(name = "shroud")]
#[command(about = "Check Jacoco/Kover coverage of the files touched by a change")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: shroud.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report coverage of touched files and enforce thresholds
    Report {
        /// Coverage report XML (glob patterns allowed)
        file: Option<PathBuf>,

        /// Display name of the module being reported on
        #[arg(short, long)]
        module: Option<String>,

        /// Report format: jacoco or kover
        #[arg(long)]
        format: Option<String>,

        /// Required whole-project coverage percentage (default: 90)
        #[arg(long)]
        project_threshold: Option<f64>,

        /// Required coverage percentage for each touched file (default: 90)
        #[arg(long)]
        file_threshold: Option<f64>,

        /// Fail when project coverage is under threshold, otherwise warn (default: true)
        #[arg(long, value_name = "BOOL")]
        fail_under_project: Option<bool>,

        /// Fail when a touched file is under threshold (default: same as --fail-under-project)
        #[arg(long, value_name = "BOOL")]
        fail_under_file: Option<bool>,

        #[command(flatten)]
        changes: ChangeArgs,

        /// Also write the markdown report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Post the markdown report as a comment on this pull request
        #[arg(long, value_name = "PR")]
        github_comment: Option<u64>,

        /// Print only the summary, not the markdown report
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the touched files a run would check
    Files {
        #[command(flatten)]
        changes: ChangeArgs,
    },
}

#[derive(clap::Args)]
struct ChangeArgs {
    /// Git reference to diff against (default: uncommitted changes)
    #[arg(long)]
    base: Option<String>,

    /// Include uncommitted changes on top of the diff against --base
    #[arg(long)]
    include_uncommitted: bool,

    /// Modified file paths; replaces git discovery
    #[arg(long, num_args = 1..)]
    modified: Vec<String>,

    /// Added file paths; replaces git discovery
    #[arg(long, num_args = 1..)]
    added: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(Outcome::Fatal) => std::process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<Outcome> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let config = Config::discover(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Report {
            file,
            module,
            format,
            project_threshold,
            file_threshold,
            fail_under_project,
            fail_under_file,
            changes,
            output,
            github_comment,
            quiet,
        } => {
            let overrides = ReportSection {
                module,
                file,
                format,
                total_project_threshold: project_threshold,
                modified_file_threshold: file_threshold,
                fail_if_under_project_threshold: fail_under_project,
                fail_if_under_file_threshold: fail_under_file,
            };
            let settings = config.report.merge(&overrides);

            let mut surfaces: Vec<Box<dyn ReviewSurface>> = vec![Box::new(ConsoleSurface { quiet })];
            if let Some(path) = output {
                surfaces.push(Box::new(MarkdownFileSurface::new(path)));
            }
            if let Some(pr) = github_comment {
                let mut surface = GithubCommentSurface::new(pr);
                surface.repository = config.github.repository.clone();
                if let Some(ref api_url) = config.github.api_url {
                    surface.api_url = api_url.clone();
                }
                surfaces.push(Box::new(surface));
            }

            let provider = change_provider(&config, &changes, &cwd)?;
            cmd_report(&settings, provider.as_ref(), &mut surfaces)
        }
        Commands::Files { changes } => {
            let provider = change_provider(&config, &changes, &cwd)?;
            cmd_files(provider.as_ref())?;
            Ok(Outcome::Clean)
        }
    }
}

fn change_provider(config: &Config, args: &ChangeArgs, cwd: &Path) -> Result<Box<dyn ChangeProvider>> {
    if !args.modified.is_empty() || !args.added.is_empty() {
        return Ok(Box::new(ChangeSet::new(
            args.modified.clone(),
            args.added.clone(),
        )));
    }

    let base = args.base.as_deref().or(config.git.base.as_deref());
    let include_uncommitted = args.include_uncommitted || config.git.include_uncommitted;
    Ok(Box::new(GitDiff::new(cwd, base, include_uncommitted)?))
}

fn cmd_report(
    settings: &ReportSection,
    provider: &dyn ChangeProvider,
    surfaces: &mut [Box<dyn ReviewSurface>],
) -> Result<Outcome> {
    let mut request = ReportRequest::new(
        settings
            .module
            .clone()
            .unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string()),
        settings.file.clone().unwrap_or_default(),
    );
    request.format = settings.format()?;
    request.policy = settings.policy();

    let evaluation = shroud::report(&request, provider)?;
    publish_all(surfaces, &evaluation)?;

    Ok(evaluation.outcome())
}

fn cmd_files(provider: &dyn ChangeProvider) -> Result<()> {
    let changes = provider.changes()?;

    if changes.is_empty() {
        println!("  {}", "No touched files".dimmed());
        return Ok(());
    }

    println!("{}", "Modified:".bold());
    for path in &changes.modified {
        println!("  {} {}", "•".yellow(), path);
    }

    println!("{}", "Added:".bold());
    for path in &changes.added {
        println!("  {} {}", "•".green(), path);
    }

    Ok(())
}
