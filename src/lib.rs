//! repomirror - One-shot GitHub Account Mirroring
//!
//! repomirror enumerates the repositories of a GitHub account (user or
//! organization) and brings a local directory tree into sync with them:
//! missing repositories are cloned, existing ones are pulled.
//!
//! ## Core Features
//!
//! - **Account Discovery**: repository enumeration via the GitHub API
//! - **Admission Filtering**: regex include/exclude patterns, exclude wins
//! - **Branch Scope**: default-branch-only or all-branches clones
//! - **Pull Strategies**: fast-forward-only, rebase, or merge updates
//! - **Failure Isolation**: a failed clone skips one repository; a failed
//!   pull stops the run
//!
//! ## Modules
//!
//! - [`config`]: run configuration resolution and pull-mode selection
//! - [`filter`]: compiled include/exclude admission predicates
//! - [`discovery`]: provider-agnostic repository listing seam
//! - [`github`]: GitHub-backed lister and authentication detection
//! - [`git`]: clone/pull operations through the git binary
//! - [`sync`]: the per-repository synchronization state machine
//! - [`health`]: preflight environment checks

pub mod config;
pub mod discovery;
pub mod filter;
pub mod git;
pub mod github;
pub mod health;
pub mod sync;

pub use config::{CliOverrides, Config, FileConfig, PullMode};
pub use discovery::{Lister, RepoDescriptor};
pub use filter::{Admission, RepoFilter};
pub use git::GitClient;
pub use github::GitHubLister;
pub use health::Preflight;
pub use sync::{LocalState, SyncEngine, SyncOutcome, SyncSummary};
