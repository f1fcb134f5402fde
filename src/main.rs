use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repomirror::{
    CliOverrides, Config, FileConfig, GitHubLister, Lister, Preflight, PullMode, SyncEngine,
    SyncOutcome, SyncSummary,
};

#[derive(Parser)]
#[command(name = "repomirror")]
#[command(about = "One-shot GitHub account mirroring tool")]
#[command(version)]
struct Cli {
    /// Root directory for all local working copies [default: ~/github-backup]
    #[arg(short = 'd', long = "backup-destination-dir", value_name = "PATH")]
    backup_destination_dir: Option<String>,

    /// GitHub user or organization to mirror [default: Teidesat]
    #[arg(short = 'g', long = "github-user", value_name = "ID")]
    github_user: Option<String>,

    /// Only process repositories whose name matches this regex
    #[arg(short = 'i', long = "include_repositories", value_name = "REGEX")]
    include_repositories: Option<String>,

    /// Skip repositories whose name matches this regex (wins over include)
    #[arg(short = 'e', long = "exclude_repositories", value_name = "REGEX")]
    exclude_repositories: Option<String>,

    /// Clone all branches instead of only the default branch
    #[arg(short = 'b', long = "all_branches")]
    all_branches: bool,

    /// Update strategy for existing working copies [default: ff-only]
    #[arg(short = 'm', long = "pull-mode", value_enum, value_name = "MODE")]
    pull_mode: Option<PullMode>,

    /// Pass --recurse-submodules through to clone and pull
    #[arg(short = 'r', long = "recurse-submodules")]
    recurse_submodules: bool,

    /// Suppress informational messages; errors always print
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Optional YAML defaults file; explicit flags win over file values
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_overrides(self) -> CliOverrides {
        CliOverrides {
            destination_dir: self.backup_destination_dir,
            github_user: self.github_user,
            include_repositories: self.include_repositories,
            exclude_repositories: self.exclude_repositories,
            all_branches: self.all_branches,
            pull_mode: self.pull_mode,
            recurse_submodules: self.recurse_submodules,
            quiet: self.quiet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.quiet)?;

    // Resolve configuration once; everything downstream reads this value
    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = Config::resolve(cli.into_overrides(), file_config)?;

    info!("Starting repomirror v{}", env!("CARGO_PKG_VERSION"));

    // Bootstrap: required tools and destination directory, before any
    // repository processing
    let preflight = Preflight::run(&config);
    report_preflight(&preflight, config.quiet);
    if !preflight.all_passed() {
        bail!("Preflight checks failed; nothing was processed");
    }

    // Lister failure (including a nonexistent account) is fatal
    let lister = GitHubLister::new()?;
    let repositories = lister.list(&config.github_user).await?;

    if !config.quiet {
        println!(
            "🔍 Found {} repositories for {}",
            repositories.len(),
            config.github_user
        );
    }

    let engine = SyncEngine::new(config.clone())?;
    let summary = engine.run(&repositories).await?;

    if !config.quiet {
        print_summary(&summary);
    }

    // A mirror pass that is missing repositories should not report success,
    // even though each clone failure was non-fatal in-flight.
    if summary.clone_failures > 0 {
        bail!(
            "{} of {} repositories failed to clone",
            summary.clone_failures,
            summary.total_repositories
        );
    }

    Ok(())
}

/// Initialize logging. Quiet mode keeps errors visible and drops the rest.
fn init_logging(quiet: bool) -> Result<()> {
    let default_level = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Print preflight problems: errors always, warnings unless quiet
fn report_preflight(preflight: &Preflight, quiet: bool) {
    for (name, result) in preflight.all_checks() {
        if !result.passed {
            eprintln!("❌ {}: {}", name, result.message);
            if let Some(details) = &result.details {
                for line in details.lines() {
                    eprintln!("   {}", line);
                }
            }
        }
    }

    if quiet {
        return;
    }

    for warning in preflight.warnings() {
        println!("⚠️  {}", warning.message);
        if let Some(details) = &warning.details {
            println!("   {}", details);
        }
    }
}

/// Print the end-of-run summary block
fn print_summary(summary: &SyncSummary) {
    println!();
    println!("🎉 Mirror pass complete!");
    println!("   📊 Total repositories: {}", summary.total_repositories);
    println!("   📥 Cloned: {}", summary.cloned);
    println!("   🔄 Updated: {}", summary.updated);
    println!("   ⏭️  Skipped: {}", summary.skipped);
    println!("   ❌ Clone failures: {}", summary.clone_failures);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    if summary.clone_failures > 0 {
        println!();
        println!("🔍 Failed clones:");
        for outcome in &summary.outcomes {
            if let SyncOutcome::CloneFailed { name, error } = outcome {
                println!("   ❌ {}: {}", name, error);
            }
        }
    }
}
