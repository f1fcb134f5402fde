//! Preflight checks for repomirror
//!
//! Validates the environment before any repository work: the git binary
//! must be present and the backup destination must exist or be creatable.

use anyhow::{Context, Result};
use std::process::Command;

use crate::config::Config;

/// Result of the preflight checks
#[derive(Debug, Clone)]
pub struct Preflight {
    /// Git installation status
    pub git: CheckResult,
    /// Backup destination directory status
    pub destination: CheckResult,
    /// GitHub credential status (warning only, public listing works without)
    pub credentials: CheckResult,
}

/// Result of an individual check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

#[allow(dead_code)]
impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl Preflight {
    /// Run all checks. The destination directory is created here if absent,
    /// before any repository processing begins.
    pub fn run(config: &Config) -> Self {
        Self {
            git: Self::check_git(),
            destination: Self::check_destination(config),
            credentials: Self::check_credentials(),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.git.passed && self.destination.passed
        // Credentials are optional, not included in required checks
    }

    /// All checks with display names, in report order
    pub fn all_checks(&self) -> Vec<(&'static str, &CheckResult)> {
        vec![
            ("Git", &self.git),
            ("Destination directory", &self.destination),
            ("GitHub credentials", &self.credentials),
        ]
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        [&self.git, &self.destination, &self.credentials]
            .into_iter()
            .filter(|r| r.is_warning)
            .collect()
    }

    fn check_git() -> CheckResult {
        match Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                CheckResult::ok_with_details("git is installed", version)
            }
            Ok(_) => CheckResult::error("git is installed but not working"),
            Err(_) => CheckResult::error_with_details(
                "git is not installed",
                "Install git and ensure it is on PATH",
            ),
        }
    }

    fn check_destination(config: &Config) -> CheckResult {
        match ensure_destination(config) {
            Ok(created) => {
                if created {
                    CheckResult::ok_with_details(
                        "Destination directory created",
                        config.destination_dir.display().to_string(),
                    )
                } else {
                    CheckResult::ok_with_details(
                        "Destination directory exists",
                        config.destination_dir.display().to_string(),
                    )
                }
            }
            Err(e) => CheckResult::error_with_details(
                "Destination directory is not usable",
                format!("{:#}", e),
            ),
        }
    }

    fn check_credentials() -> CheckResult {
        let has_env_token = std::env::var("GITHUB_TOKEN")
            .map(|t| !t.is_empty())
            .unwrap_or(false);

        let has_gh_token = Command::new("gh")
            .args(["auth", "token"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false);

        if has_env_token || has_gh_token {
            CheckResult::ok("GitHub credentials available")
        } else {
            CheckResult::warning_with_details(
                "No GitHub credentials found",
                "Listing will be anonymous and rate-limited; set GITHUB_TOKEN or run: gh auth login",
            )
        }
    }
}

/// Create the destination directory if absent. Returns whether it was created.
fn ensure_destination(config: &Config) -> Result<bool> {
    let dir = &config.destination_dir;

    if dir.is_dir() {
        return Ok(false);
    }

    if dir.exists() {
        anyhow::bail!("{} exists but is not a directory", dir.display());
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create destination directory: {}", dir.display()))?;

    Ok(true)
}
