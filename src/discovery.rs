//! Repository listing abstraction layer
//!
//! This module provides a provider-agnostic interface for enumerating the
//! repositories owned by an account, so the sync engine can be driven by
//! any listing source (GitHub today, a fixture list in tests).

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Everything the sync engine needs to know about one remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDescriptor {
    /// Bare repository name (e.g. "docs"); filters match against this
    pub name: String,

    /// URL used for both clone and pull
    pub clone_url: String,

    /// Default branch, when the provider reports one. A single-branch clone
    /// without a known name tracks the remote HEAD instead, which resolves
    /// to the same branch.
    pub default_branch: Option<String>,
}

impl RepoDescriptor {
    /// Local working copy path under the destination root
    pub fn local_path(&self, destination_dir: &Path) -> PathBuf {
        destination_dir.join(&self.name)
    }
}

/// Trait for account-aware repository listing.
///
/// A failing listing is fatal to the whole run: without the repository set
/// there is nothing to synchronize.
#[async_trait]
pub trait Lister: Send + Sync {
    /// List the repositories owned by the given account
    async fn list(&self, account: &str) -> Result<Vec<RepoDescriptor>>;

    /// Provider name for display/logging
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_is_destination_joined_with_name() {
        let repo = RepoDescriptor {
            name: "docs".to_string(),
            clone_url: "https://github.com/acme/docs.git".to_string(),
            default_branch: Some("main".to_string()),
        };

        assert_eq!(
            repo.local_path(Path::new("/backups")),
            PathBuf::from("/backups/docs")
        );
    }
}
