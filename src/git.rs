use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info};

use crate::config::Config;
use crate::discovery::RepoDescriptor;

/// Git operations handler driving the system git binary.
///
/// Every subprocess receives its working directory explicitly via
/// `current_dir`; the process-level working directory is never changed.
pub struct GitClient {
    config: Config,
}

impl GitClient {
    /// Create a new Git client with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Local working copy path for a repository
    pub fn repo_path(&self, repo: &RepoDescriptor) -> PathBuf {
        repo.local_path(&self.config.destination_dir)
    }

    /// Clone a repository into `destination_dir/<name>`.
    ///
    /// Branch scope follows configuration: all branches, or only the
    /// repository's default branch via --single-branch.
    pub async fn clone_repository(&self, repo: &RepoDescriptor) -> Result<()> {
        let target_path = self.repo_path(repo);

        info!("Cloning repository: {} -> {}", repo.name, target_path.display());

        if let Some(parent) = target_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create parent directory")?;
        }

        let args = clone_args(&self.config, repo, &target_path);
        debug!("git {}", args.join(" "));

        let output = AsyncCommand::new("git")
            .args(&args)
            .output()
            .await
            .context("Failed to execute git clone")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Git clone failed: {}", stderr.trim()));
        }

        info!("Successfully cloned: {}", repo.name);
        Ok(())
    }

    /// Update an existing working copy by pulling from its clone URL.
    ///
    /// The pull strategy comes from the configured pull mode; the
    /// subprocess runs inside the working copy via `current_dir`.
    pub async fn pull_repository(&self, repo: &RepoDescriptor) -> Result<()> {
        let target_path = self.repo_path(repo);

        info!("Pulling repository: {} at {}", repo.name, target_path.display());

        let args = pull_args(&self.config, repo);
        debug!("git {} (in {})", args.join(" "), target_path.display());

        let output = AsyncCommand::new("git")
            .args(&args)
            .current_dir(&target_path)
            .output()
            .await
            .context("Failed to execute git pull")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Git pull failed: {}", stderr.trim()));
        }

        info!("Successfully pulled: {}", repo.name);
        Ok(())
    }
}

/// Build the argument list for cloning a repository
fn clone_args(config: &Config, repo: &RepoDescriptor, target: &Path) -> Vec<String> {
    let mut args = vec!["clone".to_string()];

    if config.quiet {
        args.push("--quiet".to_string());
    }
    if config.recurse_submodules {
        args.push("--recurse-submodules".to_string());
    }
    if !config.all_branches {
        args.push("--single-branch".to_string());
        // Without a known default branch, --single-branch alone tracks the
        // remote HEAD, which is that branch.
        if let Some(branch) = &repo.default_branch {
            args.push("--branch".to_string());
            args.push(branch.clone());
        }
    }

    args.push(repo.clone_url.clone());
    args.push(target.to_string_lossy().into_owned());
    args
}

/// Build the argument list for pulling an existing working copy
fn pull_args(config: &Config, repo: &RepoDescriptor) -> Vec<String> {
    let mut args = vec!["pull".to_string()];

    if config.quiet {
        args.push("--quiet".to_string());
    }
    if config.recurse_submodules {
        args.push("--recurse-submodules".to_string());
    }

    args.push(config.pull_mode.git_flag().to_string());
    args.push(repo.clone_url.clone());
    args
}
