//! Repository admission filtering
//!
//! Include/exclude patterns are compiled once at startup into a predicate
//! pair; admission is then a pure function of the bare repository name.

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::Config;

/// Why a repository was or was not admitted for processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Repository passes both filters and will be processed
    Admitted,
    /// Name matched the exclude pattern (exclude wins over include)
    Excluded,
    /// An include pattern is configured and the name did not match it
    NotIncluded,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// Human-readable skip reason for reporting; `None` when admitted
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            Admission::Admitted => None,
            Admission::Excluded => Some("matches exclude pattern"),
            Admission::NotIncluded => Some("does not match include pattern"),
        }
    }
}

/// Compiled include/exclude predicate pair
#[derive(Debug)]
pub struct RepoFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl RepoFilter {
    /// Compile the configured patterns; a malformed pattern is a
    /// configuration error and aborts before any repository is touched
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.include_repositories.as_deref(),
            config.exclude_repositories.as_deref(),
        )
    }

    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        let include = include
            .map(|p| {
                Regex::new(p).with_context(|| format!("Invalid include pattern: {}", p))
            })
            .transpose()?;
        let exclude = exclude
            .map(|p| {
                Regex::new(p).with_context(|| format!("Invalid exclude pattern: {}", p))
            })
            .transpose()?;

        Ok(Self { include, exclude })
    }

    /// Decide admission for a bare repository name.
    ///
    /// Exclude wins regardless of include; with no include pattern the
    /// baseline is admit-all.
    pub fn admit(&self, name: &str) -> Admission {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(name) {
                return Admission::Excluded;
            }
        }

        if let Some(include) = &self.include {
            if !include.is_match(name) {
                return Admission::NotIncluded;
            }
        }

        Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_no_patterns_admits_everything() {
        let filter = RepoFilter::new(None, None).unwrap();

        assert_eq!(filter.admit("anything"), Admission::Admitted);
        assert_eq!(filter.admit(""), Admission::Admitted);
    }

    #[test]
    fn test_exclude_rejects_matching_names() {
        let filter = RepoFilter::new(None, Some("internal")).unwrap();

        assert_eq!(filter.admit("app-internal"), Admission::Excluded);
        assert_eq!(filter.admit("app"), Admission::Admitted);
    }

    #[test]
    fn test_include_rejects_non_matching_names() {
        let filter = RepoFilter::new(Some("^app"), None).unwrap();

        assert_eq!(filter.admit("app"), Admission::Admitted);
        assert_eq!(filter.admit("app-internal"), Admission::Admitted);
        assert_eq!(filter.admit("docs"), Admission::NotIncluded);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        // Name matches both patterns; exclude takes precedence
        let filter = RepoFilter::new(Some("^app"), Some("internal")).unwrap();

        assert_eq!(filter.admit("app-internal"), Admission::Excluded);
        assert_eq!(filter.admit("app"), Admission::Admitted);
    }

    #[test]
    fn test_acme_exclude_scenario() {
        let repos = ["app", "app-internal", "docs"];
        let filter = RepoFilter::new(None, Some("internal")).unwrap();

        let admitted: Vec<&str> = repos
            .iter()
            .copied()
            .filter(|name| filter.admit(name).is_admitted())
            .collect();

        assert_eq!(admitted, vec!["app", "docs"]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(RepoFilter::new(Some("("), None).is_err());
        assert!(RepoFilter::new(None, Some("[")).is_err());
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(Admission::Admitted.skip_reason(), None);
        assert!(Admission::Excluded.skip_reason().unwrap().contains("exclude"));
        assert!(Admission::NotIncluded
            .skip_reason()
            .unwrap()
            .contains("include"));
    }

    #[quickcheck]
    fn prop_excluded_names_never_admitted(name: String) -> bool {
        // Exclude matches everything, include matches everything: exclude
        // must still win for every name.
        let filter = RepoFilter::new(Some(".*"), Some(".*")).unwrap();
        filter.admit(&name) == Admission::Excluded
    }

    #[quickcheck]
    fn prop_no_include_never_rejects_for_inclusion(name: String) -> bool {
        let filter = RepoFilter::new(None, None).unwrap();
        filter.admit(&name) == Admission::Admitted
    }
}
