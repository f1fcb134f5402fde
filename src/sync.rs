//! Sync Engine - the per-repository synchronization state machine
//!
//! Each repository moves through admission, a single presence probe, and a
//! clone/pull step sequence. Clone failures are isolated to their repository;
//! pull failures abort the whole run, since a divergent or conflicting
//! working copy is unsafe to silently skip past.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::discovery::RepoDescriptor;
use crate::filter::RepoFilter;
use crate::git::GitClient;

/// Presence of a local working copy, derived once per repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalState {
    /// No working copy at the target path
    Absent,
    /// A working copy (directory with .git) exists at the target path
    Present,
}

impl LocalState {
    /// Probe the filesystem for a working copy at the given path.
    ///
    /// A directory without a `.git` entry is not a working copy; cloning
    /// into it will fail and surface as a per-repository clone error.
    pub fn probe(path: &Path) -> Self {
        if path.join(".git").exists() {
            LocalState::Present
        } else {
            LocalState::Absent
        }
    }
}

/// Steps the engine executes for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Clone,
    Pull,
}

/// Step sequence for a given local state.
///
/// A fresh clone still pulls afterwards: a single-branch clone may need an
/// up-to-date pull against its branch to be fully current.
pub fn steps_for(state: LocalState) -> &'static [SyncStep] {
    match state {
        LocalState::Absent => &[SyncStep::Clone, SyncStep::Pull],
        LocalState::Present => &[SyncStep::Pull],
    }
}

/// Outcome of processing one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Repository was cloned (and brought current)
    Cloned { name: String },
    /// Existing working copy was updated
    Updated { name: String },
    /// Repository was not admitted by the filters
    Skipped { name: String, reason: String },
    /// Clone failed; the repository was skipped, the run continued
    CloneFailed { name: String, error: String },
}

/// Results from a complete sync pass
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub cloned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub clone_failures: usize,
    pub duration: Duration,
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncSummary {
    fn from_outcomes(outcomes: Vec<SyncOutcome>, duration: Duration) -> Self {
        let total_repositories = outcomes.len();
        let mut cloned = 0;
        let mut updated = 0;
        let mut skipped = 0;
        let mut clone_failures = 0;

        for outcome in &outcomes {
            match outcome {
                SyncOutcome::Cloned { .. } => cloned += 1,
                SyncOutcome::Updated { .. } => updated += 1,
                SyncOutcome::Skipped { .. } => skipped += 1,
                SyncOutcome::CloneFailed { .. } => clone_failures += 1,
            }
        }

        Self {
            total_repositories,
            cloned,
            updated,
            skipped,
            clone_failures,
            duration,
            outcomes,
        }
    }
}

/// The main sync engine applying the state machine to each repository in turn
pub struct SyncEngine {
    config: Config,
    filter: RepoFilter,
    git: GitClient,
}

impl SyncEngine {
    /// Create a new sync engine, compiling the configured filters.
    ///
    /// A malformed pattern fails here, before any repository is touched.
    pub fn new(config: Config) -> Result<Self> {
        let filter = RepoFilter::from_config(&config)?;
        let git = GitClient::new(config.clone());

        Ok(Self {
            config,
            filter,
            git,
        })
    }

    /// Process the listed repositories sequentially, in listing order.
    ///
    /// Returns `Err` only on run-fatal conditions (pull failure); clone
    /// failures are recorded in the summary and processing continues.
    pub async fn run(&self, repositories: &[RepoDescriptor]) -> Result<SyncSummary> {
        let start_time = Instant::now();

        info!(
            "Synchronizing {} repositories into {}",
            repositories.len(),
            self.config.destination_dir.display()
        );

        let mut outcomes = Vec::with_capacity(repositories.len());

        for repo in repositories {
            outcomes.push(self.sync_repository(repo).await?);
        }

        let summary = SyncSummary::from_outcomes(outcomes, start_time.elapsed());

        info!(
            "Sync completed in {:.2}s: {} cloned, {} updated, {} skipped, {} clone failures",
            summary.duration.as_secs_f64(),
            summary.cloned,
            summary.updated,
            summary.skipped,
            summary.clone_failures
        );

        Ok(summary)
    }

    /// Run one repository through the state machine
    async fn sync_repository(&self, repo: &RepoDescriptor) -> Result<SyncOutcome> {
        // Admission
        let admission = self.filter.admit(&repo.name);
        if let Some(reason) = admission.skip_reason() {
            info!("Skipping {}: {}", repo.name, reason);
            return Ok(SyncOutcome::Skipped {
                name: repo.name.clone(),
                reason: reason.to_string(),
            });
        }

        // Presence check, derived exactly once
        let path = self.git.repo_path(repo);
        let state = LocalState::probe(&path);
        debug!("Repository {} is {:?} at {}", repo.name, state, path.display());

        for step in steps_for(state) {
            match step {
                SyncStep::Clone => {
                    if let Err(e) = self.git.clone_repository(repo).await {
                        error!("Failed to clone {}: {:#}", repo.name, e);
                        return Ok(SyncOutcome::CloneFailed {
                            name: repo.name.clone(),
                            error: format!("{:#}", e),
                        });
                    }
                }
                SyncStep::Pull => {
                    // Fatal: an unresolved divergent or conflicting state is
                    // unsafe to skip past, so the whole run stops here.
                    if let Err(e) = self.git.pull_repository(repo).await {
                        error!("Failed to pull {}: {:#}", repo.name, e);
                        return Err(e)
                            .with_context(|| format!("Pull failed for repository '{}'", repo.name));
                    }
                }
            }
        }

        Ok(match state {
            LocalState::Absent => SyncOutcome::Cloned {
                name: repo.name.clone(),
            },
            LocalState::Present => SyncOutcome::Updated {
                name: repo.name.clone(),
            },
        })
    }

    /// Configuration for external inspection
    pub fn config(&self) -> &Config {
        &self.config
    }
}
