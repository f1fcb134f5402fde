use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use octocrab::models::Repository;
use octocrab::Octocrab;
use std::env;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::discovery::{Lister, RepoDescriptor};

/// GitHub-backed repository lister with automatic authentication detection
pub struct GitHubLister {
    client: Octocrab,
}

/// GitHub authentication strategies
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// Use GitHub CLI authentication
    GitHubCli,
    /// Use environment variable token
    EnvironmentToken,
    /// No credentials; public listing only, subject to low rate limits
    Anonymous,
}

impl GitHubLister {
    /// Create a lister, preferring an available token over anonymous access
    pub fn new() -> Result<Self> {
        let (strategy, token) = Self::detect_authentication();

        info!("Using authentication strategy: {:?}", strategy);

        let client = match token {
            Some(token) => Octocrab::builder()
                .personal_token(token)
                .build()
                .context("Failed to create GitHub client")?,
            None => {
                warn!("No GitHub credentials found; listing anonymously (rate-limited)");
                Octocrab::builder()
                    .build()
                    .context("Failed to create GitHub client")?
            }
        };

        Ok(Self { client })
    }

    /// Detect GitHub authentication: GitHub CLI first, then environment
    fn detect_authentication() -> (AuthStrategy, Option<String>) {
        if let Ok(token) = Self::try_github_cli() {
            (AuthStrategy::GitHubCli, Some(token))
        } else if let Ok(token) = Self::try_environment_token() {
            (AuthStrategy::EnvironmentToken, Some(token))
        } else {
            (AuthStrategy::Anonymous, None)
        }
    }

    /// Try to get a token from the GitHub CLI
    fn try_github_cli() -> Result<String> {
        debug!("Attempting GitHub CLI authentication");

        if !Self::is_command_available("gh") {
            return Err(anyhow!("GitHub CLI (gh) is not installed"));
        }

        let token_output = Command::new("gh")
            .args(["auth", "token"])
            .output()
            .context("Failed to get GitHub CLI token")?;

        if !token_output.status.success() {
            return Err(anyhow!(
                "Failed to retrieve token from GitHub CLI: {}",
                String::from_utf8_lossy(&token_output.stderr)
            ));
        }

        let token = String::from_utf8(token_output.stdout)
            .context("GitHub CLI token is not valid UTF-8")?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(anyhow!("GitHub CLI returned empty token"));
        }

        debug!("Successfully obtained token from GitHub CLI");
        Ok(token)
    }

    /// Try to get a token from the environment
    fn try_environment_token() -> Result<String> {
        debug!("Attempting environment variable authentication");

        let token =
            env::var("GITHUB_TOKEN").context("GITHUB_TOKEN environment variable not set")?;

        if token.is_empty() {
            return Err(anyhow!("GITHUB_TOKEN is empty"));
        }

        debug!("Successfully found GITHUB_TOKEN environment variable");
        Ok(token)
    }

    /// Check if a command is available in PATH
    fn is_command_available(command: &str) -> bool {
        Command::new("which")
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// List repositories treating the account as a user
    async fn list_as_user(&self, account: &str) -> Result<Vec<Repository>> {
        debug!("Fetching repositories for user: {}", account);

        let mut repositories = Vec::new();
        let mut page = 1u8;

        loop {
            let page_repos = self
                .client
                .users(account)
                .repos()
                .per_page(100)
                .page(page)
                .send()
                .await
                .with_context(|| {
                    format!("Failed to fetch repositories for user {} page {}", account, page)
                })?;

            let items = page_repos.items;
            if items.is_empty() {
                break;
            }

            repositories.extend(items);

            // GitHub API pagination limit for u8
            if page >= 255 {
                warn!("Reached maximum pagination limit (255 pages)");
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }

    /// List repositories treating the account as an organization
    async fn list_as_organization(&self, account: &str) -> Result<Vec<Repository>> {
        debug!("Fetching repositories for organization: {}", account);

        let mut repositories = Vec::new();
        let mut page = 1u8;

        loop {
            let page_repos = self
                .client
                .orgs(account)
                .list_repos()
                .per_page(100)
                .page(page)
                .send()
                .await
                .with_context(|| {
                    format!(
                        "Failed to fetch repositories for organization {} page {}",
                        account, page
                    )
                })?;

            let items = page_repos.items;
            if items.is_empty() {
                break;
            }

            repositories.extend(items);

            // GitHub API pagination limit for u8
            if page >= 255 {
                warn!("Reached maximum pagination limit (255 pages) for org: {}", account);
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }

    fn to_descriptor(account: &str, repo: Repository) -> RepoDescriptor {
        let clone_url = select_clone_url(
            repo.clone_url.as_ref().map(|u| u.to_string()),
            repo.ssh_url.clone(),
            account,
            &repo.name,
        );

        RepoDescriptor {
            name: repo.name,
            clone_url,
            default_branch: repo.default_branch,
        }
    }
}

#[async_trait]
impl Lister for GitHubLister {
    /// List the repositories owned by an account, trying it as a user
    /// first and falling back to an organization lookup. An account that
    /// resolves as neither is fatal to the run.
    async fn list(&self, account: &str) -> Result<Vec<RepoDescriptor>> {
        let repositories = match self.list_as_user(account).await {
            Ok(repos) => repos,
            Err(user_err) => {
                debug!(
                    "User listing failed for {}, retrying as organization: {}",
                    account, user_err
                );
                self.list_as_organization(account).await.map_err(|_| {
                    anyhow!(
                        "GitHub account '{}' does not exist or is not accessible",
                        account
                    )
                })?
            }
        };

        info!("Found {} repositories for account: {}", repositories.len(), account);

        Ok(repositories
            .into_iter()
            .map(|repo| Self::to_descriptor(account, repo))
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "GitHub"
    }
}

/// Pick a clone URL, preferring HTTPS, then SSH, then the canonical form
fn select_clone_url(
    clone_url: Option<String>,
    ssh_url: Option<String>,
    account: &str,
    name: &str,
) -> String {
    clone_url
        .or(ssh_url)
        .unwrap_or_else(|| format!("https://github.com/{}/{}.git", account, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_url_prefers_https() {
        let url = select_clone_url(
            Some("https://github.com/acme/app.git".to_string()),
            Some("git@github.com:acme/app.git".to_string()),
            "acme",
            "app",
        );
        assert_eq!(url, "https://github.com/acme/app.git");
    }

    #[test]
    fn test_clone_url_falls_back_to_ssh() {
        let url = select_clone_url(
            None,
            Some("git@github.com:acme/app.git".to_string()),
            "acme",
            "app",
        );
        assert_eq!(url, "git@github.com:acme/app.git");
    }

    #[test]
    fn test_clone_url_constructed_when_absent() {
        let url = select_clone_url(None, None, "acme", "app");
        assert_eq!(url, "https://github.com/acme/app.git");
    }
}
