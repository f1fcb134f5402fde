use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Update strategy applied when pulling an existing working copy.
///
/// Unrecognized values are rejected at argument-parsing (or config-parsing)
/// time, before any network or filesystem work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PullMode {
    /// Accept only fast-forward updates; divergence is a failure
    FfOnly,
    /// Replay local commits on top of the fetched branch tip
    Rebase,
    /// Merge fetched changes; a conflicting merge is a failure
    Merge,
}

impl PullMode {
    /// The `git pull` flag implementing this strategy
    pub fn git_flag(&self) -> &'static str {
        match self {
            PullMode::FfOnly => "--ff-only",
            PullMode::Rebase => "--rebase",
            PullMode::Merge => "--no-rebase",
        }
    }
}

impl fmt::Display for PullMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PullMode::FfOnly => "ff-only",
            PullMode::Rebase => "rebase",
            PullMode::Merge => "merge",
        };
        write!(f, "{}", name)
    }
}

/// Resolved run configuration.
///
/// Built exactly once at startup from CLI arguments layered over an optional
/// defaults file, then passed by reference into the filter and sync engine.
/// Nothing reads configuration ambiently after this point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for all local working copies
    pub destination_dir: PathBuf,

    /// GitHub user or organization to mirror
    pub github_user: String,

    /// Whitelist regex matched against bare repository names
    pub include_repositories: Option<String>,

    /// Blacklist regex, takes precedence over the whitelist
    pub exclude_repositories: Option<String>,

    /// Clone all branches instead of only the default branch
    pub all_branches: bool,

    /// Update strategy for existing working copies
    pub pull_mode: PullMode,

    /// Pass --recurse-submodules to clone and pull
    pub recurse_submodules: bool,

    /// Suppress informational output; errors always print
    pub quiet: bool,
}

/// Optional YAML defaults file.
///
/// Every field is optional; explicit CLI values win over file values, which
/// win over built-in defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub destination_dir: Option<String>,
    pub github_user: Option<String>,
    pub include_repositories: Option<String>,
    pub exclude_repositories: Option<String>,
    pub all_branches: Option<bool>,
    pub pull_mode: Option<PullMode>,
    pub recurse_submodules: Option<bool>,
    pub quiet: Option<bool>,
}

impl FileConfig {
    /// Load a defaults file, failing on unreadable or malformed content
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

/// CLI-supplied values before merging; `None` means the flag was not given
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub destination_dir: Option<String>,
    pub github_user: Option<String>,
    pub include_repositories: Option<String>,
    pub exclude_repositories: Option<String>,
    pub all_branches: bool,
    pub pull_mode: Option<PullMode>,
    pub recurse_submodules: bool,
    pub quiet: bool,
}

pub const DEFAULT_GITHUB_USER: &str = "Teidesat";
pub const DEFAULT_DESTINATION_SUBDIR: &str = "github-backup";

impl Config {
    /// Merge CLI overrides over file defaults over built-in defaults
    pub fn resolve(cli: CliOverrides, file: FileConfig) -> Result<Self> {
        let destination = match cli.destination_dir.or(file.destination_dir) {
            Some(raw) => expand_path(&raw)?,
            None => default_destination_dir()?,
        };

        let github_user = cli
            .github_user
            .or(file.github_user)
            .unwrap_or_else(|| DEFAULT_GITHUB_USER.to_string());

        Ok(Self {
            destination_dir: destination,
            github_user,
            include_repositories: normalize_pattern(
                cli.include_repositories.or(file.include_repositories),
            ),
            exclude_repositories: normalize_pattern(
                cli.exclude_repositories.or(file.exclude_repositories),
            ),
            all_branches: cli.all_branches || file.all_branches.unwrap_or(false),
            pull_mode: cli
                .pull_mode
                .or(file.pull_mode)
                .unwrap_or(PullMode::FfOnly),
            recurse_submodules: cli.recurse_submodules || file.recurse_submodules.unwrap_or(false),
            quiet: cli.quiet || file.quiet.unwrap_or(false),
        })
    }

    /// Local working copy path for a repository name
    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.destination_dir.join(name)
    }
}

/// Expand `~` and environment variables in a configured path
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand destination path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn default_destination_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(DEFAULT_DESTINATION_SUBDIR))
}

/// An empty pattern means "no filter configured", never "matches nothing"
fn normalize_pattern(pattern: Option<String>) -> Option<String> {
    pattern.filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_resolve_defaults() {
        let config = Config::resolve(CliOverrides::default(), FileConfig::default())
            .expect("Failed to resolve config");

        assert_eq!(config.github_user, "Teidesat");
        assert!(config
            .destination_dir
            .to_string_lossy()
            .ends_with("github-backup"));
        assert!(config.include_repositories.is_none());
        assert!(config.exclude_repositories.is_none());
        assert!(!config.all_branches);
        assert_eq!(config.pull_mode, PullMode::FfOnly);
        assert!(!config.recurse_submodules);
        assert!(!config.quiet);
    }

    #[test]
    fn test_cli_wins_over_file() {
        let cli = CliOverrides {
            github_user: Some("cli-user".to_string()),
            pull_mode: Some(PullMode::Rebase),
            ..Default::default()
        };
        let file = FileConfig {
            github_user: Some("file-user".to_string()),
            pull_mode: Some(PullMode::Merge),
            exclude_repositories: Some("archived-.*".to_string()),
            ..Default::default()
        };

        let config = Config::resolve(cli, file).expect("Failed to resolve config");

        assert_eq!(config.github_user, "cli-user");
        assert_eq!(config.pull_mode, PullMode::Rebase);
        // File values survive where the CLI is silent
        assert_eq!(
            config.exclude_repositories,
            Some("archived-.*".to_string())
        );
    }

    #[test]
    fn test_empty_pattern_means_no_filter() {
        let cli = CliOverrides {
            include_repositories: Some(String::new()),
            exclude_repositories: Some(String::new()),
            ..Default::default()
        };

        let config =
            Config::resolve(cli, FileConfig::default()).expect("Failed to resolve config");

        assert!(config.include_repositories.is_none());
        assert!(config.exclude_repositories.is_none());
    }

    #[test]
    fn test_boolean_flags_combine_with_file() {
        let file = FileConfig {
            all_branches: Some(true),
            ..Default::default()
        };

        let config = Config::resolve(CliOverrides::default(), file)
            .expect("Failed to resolve config");

        assert!(config.all_branches);
        assert!(!config.recurse_submodules);
    }

    #[test]
    #[serial]
    fn test_destination_path_expansion() {
        env::set_var("REPOMIRROR_TEST_ROOT", "/test/root");

        let cli = CliOverrides {
            destination_dir: Some("${REPOMIRROR_TEST_ROOT}/mirrors".to_string()),
            ..Default::default()
        };

        let config =
            Config::resolve(cli, FileConfig::default()).expect("Failed to resolve config");

        assert_eq!(config.destination_dir, PathBuf::from("/test/root/mirrors"));

        env::remove_var("REPOMIRROR_TEST_ROOT");
    }

    #[test]
    fn test_repo_path_layout() {
        let cli = CliOverrides {
            destination_dir: Some("/backups".to_string()),
            ..Default::default()
        };
        let config =
            Config::resolve(cli, FileConfig::default()).expect("Failed to resolve config");

        assert_eq!(config.repo_path("docs"), PathBuf::from("/backups/docs"));
    }

    #[test]
    fn test_pull_mode_git_flags() {
        assert_eq!(PullMode::FfOnly.git_flag(), "--ff-only");
        assert_eq!(PullMode::Rebase.git_flag(), "--rebase");
        assert_eq!(PullMode::Merge.git_flag(), "--no-rebase");
    }

    #[test]
    fn test_pull_mode_display() {
        assert_eq!(PullMode::FfOnly.to_string(), "ff-only");
        assert_eq!(PullMode::Rebase.to_string(), "rebase");
        assert_eq!(PullMode::Merge.to_string(), "merge");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
destination_dir: "/srv/mirrors"
github_user: "acme"
exclude_repositories: "internal"
all_branches: true
pull_mode: "rebase"
recurse_submodules: true
"#;

        let file: FileConfig = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(file.destination_dir, Some("/srv/mirrors".to_string()));
        assert_eq!(file.github_user, Some("acme".to_string()));
        assert_eq!(file.exclude_repositories, Some("internal".to_string()));
        assert_eq!(file.all_branches, Some(true));
        assert_eq!(file.pull_mode, Some(PullMode::Rebase));
        assert_eq!(file.recurse_submodules, Some(true));
        assert_eq!(file.quiet, None);
    }

    #[test]
    fn test_yaml_rejects_unknown_pull_mode() {
        let yaml_content = r#"
pull_mode: "force-push"
"#;

        let result: std::result::Result<FileConfig, _> = serde_yaml::from_str(yaml_content);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = FileConfig::load(Path::new("/nonexistent/path/config.yml"));
        assert!(result.is_err());
    }
}
