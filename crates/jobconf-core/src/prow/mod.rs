//! Controller-level configuration
//!
//! [`ProwConfig`] is the non-job half of the primary document. It is
//! defaulted and validated before any job fragment is merged.

mod deck;
mod plank;
mod reporter;

pub use deck::{Branding, Deck, LensConfig, LensFileConfig, Spyglass};
pub use plank::{Controller, Plank, WILDCARD};
pub use reporter::{DEFAULT_SLACK_TEMPLATE, GitHubReporter, ProwJobState, SlackReporter};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::duration::Duration;
use crate::error::{Error, Result};

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_GITHUB_LINK: &str = "https://github.com";
pub const DEFAULT_STATUS_ERROR_LINK: &str = "https://github.com/kubernetes/test-infra/issues";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Directories always excluded from ownership file discovery
const PRECONFIGURED_OWNERS_BLACKLIST: [&str; 3] = ["\\.git$", "_output$", "vendor/.*/.*"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProwConfig {
    #[serde(default)]
    pub plank: Plank,

    #[serde(default)]
    pub sinker: Sinker,

    #[serde(default)]
    pub deck: Deck,

    #[serde(default)]
    pub gerrit: Gerrit,

    #[serde(default)]
    pub github_reporter: GitHubReporter,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_reporter: Option<SlackReporter>,

    #[serde(default)]
    pub in_repo_config: InRepoConfig,

    /// Namespace holding job records; defaults to `default`
    #[serde(default)]
    pub prowjob_namespace: String,

    /// Namespace test pods run in; defaults to `default`
    #[serde(default)]
    pub pod_namespace: String,

    #[serde(default)]
    pub log_level: String,

    #[serde(default)]
    pub push_gateway: PushGateway,

    #[serde(default)]
    pub owners_dir_blacklist: OwnersDirBlacklist,

    /// Cloud project to topic subscriptions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pubsub_subscriptions: BTreeMap<String, Vec<String>>,

    #[serde(default, rename = "github")]
    pub github_options: GitHubOptions,

    #[serde(default)]
    pub status_error_link: String,

    /// Deadline for jobs without their own timeout; defaults to one day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_job_timeout: Option<Duration>,

    #[serde(skip)]
    level: Option<LevelFilter>,
}

impl ProwConfig {
    /// Fill controller defaults and reject invalid controller settings
    pub(crate) fn default_and_validate(&mut self) -> Result<()> {
        self.plank.default_and_validate()?;
        self.gerrit.default_values();
        self.github_reporter.default_and_validate()?;
        self.deck.default_and_validate()?;
        self.push_gateway.interval.get_or_insert(Duration::from_mins(1));
        self.sinker.default_values();

        if self.prowjob_namespace.is_empty() {
            self.prowjob_namespace = DEFAULT_NAMESPACE.to_string();
        }
        if self.pod_namespace.is_empty() {
            self.pod_namespace = DEFAULT_NAMESPACE.to_string();
        }

        self.github_options.default_and_parse()?;

        if self.status_error_link.is_empty() {
            self.status_error_link = DEFAULT_STATUS_ERROR_LINK.to_string();
        }

        if self.log_level.is_empty() {
            self.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
        let level = parse_log_level(&self.log_level)
            .map_err(|message| Error::controller("log_level", message))?;
        self.level = Some(level);

        self.default_job_timeout.get_or_insert(Duration::from_hours(24));
        Ok(())
    }

    /// Checks that need the whole configuration to be assembled
    pub(crate) fn validate_components(&mut self) -> Result<()> {
        for (key, prefix) in &self.plank.job_url_prefix_config {
            Url::parse(prefix).map_err(|e| {
                Error::controller(
                    "plank",
                    format!("invalid value for job_url_prefix_config[\"{key}\"]: {e}"),
                )
            })?;
        }
        if let Some(slack) = self.slack_reporter.as_mut() {
            slack.default_and_validate()?;
        }
        Ok(())
    }

    /// The configured log level, for the caller to apply
    pub fn log_level(&self) -> LevelFilter {
        self.level.unwrap_or(LevelFilter::INFO)
    }
}

/// Parse a log level name
///
/// `fatal` and `panic` have no counterpart and map to `ERROR`.
pub fn parse_log_level(name: &str) -> std::result::Result<LevelFilter, String> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "fatal" | "panic" => Ok(LevelFilter::ERROR),
        _ => Err(format!("not a valid log level: {name:?}")),
    }
}

/// Check the action delimiters of a report template
///
/// Templates are stored verbatim and rendered elsewhere. Only the structure
/// is checked here: every `{{` is closed before the next one opens, and no
/// action is empty.
pub(crate) fn check_template(text: &str) -> std::result::Result<(), String> {
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| "unclosed action".to_string())?;
        let action = &after[..close];
        if action.contains("{{") {
            return Err("unexpected \"{{\" in action".to_string());
        }
        if action.trim_matches(|c: char| c == '-' || c.is_whitespace()).is_empty() {
            return Err("missing value for command".to_string());
        }
        rest = &after[close + 2..];
    }
    Ok(())
}

/// Garbage collection of finished jobs and pods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sinker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resync_period: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_prowjob_age: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pod_age: Option<Duration>,
}

impl Sinker {
    fn default_values(&mut self) {
        self.resync_period.get_or_insert(Duration::from_hours(1));
        self.max_prowjob_age.get_or_insert(Duration::from_hours(7 * 24));
        self.max_pod_age.get_or_insert(Duration::from_hours(24));
    }
}

/// Code review host polling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gerrit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_interval: Option<Duration>,

    /// Changes fetched per query
    #[serde(default)]
    pub ratelimit: i64,
}

impl Gerrit {
    fn default_values(&mut self) {
        self.tick_interval.get_or_insert(Duration::from_mins(1));
        if self.ratelimit == 0 {
            self.ratelimit = 5;
        }
    }
}

/// Metrics push target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushGateway {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,

    #[serde(default)]
    pub serve_metrics: bool,
}

/// Where ownership file discovery should not look
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnersDirBlacklist {
    /// Patterns keyed by `org` or `org/repo`
    #[serde(default)]
    pub repos: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub default: Vec<String>,

    #[serde(default)]
    pub ignore_preconfigured_defaults: bool,
}

impl OwnersDirBlacklist {
    /// Directory patterns to skip in `org/repo`
    pub fn dir_blacklist(&self, org: &str, repo: &str) -> Vec<String> {
        let mut blacklist = self.default.clone();
        if let Some(patterns) = self.repos.get(org) {
            blacklist.extend(patterns.iter().cloned());
        }
        if let Some(patterns) = self.repos.get(&format!("{org}/{repo}")) {
            blacklist.extend(patterns.iter().cloned());
        }
        if !self.ignore_preconfigured_defaults {
            blacklist.extend(PRECONFIGURED_OWNERS_BLACKLIST.iter().map(|p| p.to_string()));
        }
        blacklist
    }
}

/// Per-repository opt-in for job definitions stored in the repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InRepoConfig {
    /// Keyed by `org/repo`, `org` or `*`; the narrowest key wins
    #[serde(default)]
    pub enabled: BTreeMap<String, bool>,
}

impl InRepoConfig {
    pub fn enabled_for(&self, identifier: &str) -> bool {
        if let Some(enabled) = self.enabled.get(identifier) {
            return *enabled;
        }
        if let Some((org, _)) = identifier.split_once('/') {
            if let Some(enabled) = self.enabled.get(org) {
                return *enabled;
            }
        }
        self.enabled.get(WILDCARD).copied().unwrap_or(false)
    }
}

/// How links to the code host are rendered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubOptions {
    #[serde(default, rename = "link_url")]
    pub link_url_from_config: String,

    #[serde(skip)]
    link_url: Option<Url>,
}

impl GitHubOptions {
    fn default_and_parse(&mut self) -> Result<()> {
        if self.link_url_from_config.is_empty() {
            self.link_url_from_config = DEFAULT_GITHUB_LINK.to_string();
        }
        let url = Url::parse(&self.link_url_from_config).map_err(|e| {
            Error::controller(
                "github",
                format!("unable to parse github.link_url, might not be a valid url: {e}"),
            )
        })?;
        self.link_url = Some(url);
        Ok(())
    }

    /// The parsed link URL, available once the config has been loaded
    pub fn link_url(&self) -> Option<&Url> {
        self.link_url.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults_applied() {
        let mut config = ProwConfig::default();
        config.default_and_validate().unwrap();

        assert_eq!(config.pod_namespace, "default");
        assert_eq!(config.prowjob_namespace, "default");
        assert_eq!(config.plank.pod_pending_timeout, Some(Duration::from_hours(24)));
        assert_eq!(config.plank.pod_running_timeout, Some(Duration::from_hours(48)));
        assert_eq!(config.plank.controller.max_goroutines, 20);
        assert_eq!(config.gerrit.tick_interval, Some(Duration::from_mins(1)));
        assert_eq!(config.gerrit.ratelimit, 5);
        assert_eq!(config.deck.tide_update_period, Some(Duration::from_secs(10)));
        assert_eq!(config.deck.spyglass.size_limit, 100_000_000);
        assert_eq!(config.push_gateway.interval, Some(Duration::from_mins(1)));
        assert_eq!(config.sinker.resync_period, Some(Duration::from_hours(1)));
        assert_eq!(config.sinker.max_prowjob_age, Some(Duration::from_hours(168)));
        assert_eq!(config.sinker.max_pod_age, Some(Duration::from_hours(24)));
        assert_eq!(config.default_job_timeout, Some(Duration::from_hours(24)));
        assert_eq!(config.status_error_link, DEFAULT_STATUS_ERROR_LINK);
        assert_eq!(
            config.github_options.link_url().map(Url::as_str),
            Some("https://github.com/")
        );
        assert_eq!(config.log_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = ProwConfig {
            log_level: "chatty".into(),
            ..ProwConfig::default()
        };
        assert!(matches!(
            config.default_and_validate(),
            Err(Error::Controller { component: "log_level", .. })
        ));
    }

    #[rstest]
    #[case("trace", LevelFilter::TRACE)]
    #[case("debug", LevelFilter::DEBUG)]
    #[case("INFO", LevelFilter::INFO)]
    #[case("warning", LevelFilter::WARN)]
    #[case("fatal", LevelFilter::ERROR)]
    fn test_parse_log_level(#[case] name: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_log_level(name), Ok(expected));
    }

    #[rstest]
    #[case("", true)]
    #[case("plain text }} is fine", true)]
    #[case("{{.Spec.Job}} and {{- .Status.State -}}", true)]
    #[case("{{.Spec.Job", false)]
    #[case("{{ {{.x}} }}", false)]
    #[case("{{ }}", false)]
    fn test_check_template(#[case] template: &str, #[case] valid: bool) {
        assert_eq!(check_template(template).is_ok(), valid, "{template:?}");
    }

    #[test]
    fn test_invalid_job_url_prefix() {
        let mut config = ProwConfig::default();
        config
            .plank
            .job_url_prefix_config
            .insert("*".into(), "not a url".into());
        assert!(config.validate_components().is_err());
    }

    #[test]
    fn test_dir_blacklist() {
        let blacklist = OwnersDirBlacklist {
            repos: BTreeMap::from([
                ("acme".to_string(), vec!["docs".to_string()]),
                ("acme/widgets".to_string(), vec!["third_party".to_string()]),
            ]),
            default: vec!["hack".to_string()],
            ignore_preconfigured_defaults: false,
        };
        assert_eq!(
            blacklist.dir_blacklist("acme", "widgets"),
            vec!["hack", "docs", "third_party", "\\.git$", "_output$", "vendor/.*/.*"]
        );

        let bare = OwnersDirBlacklist {
            ignore_preconfigured_defaults: true,
            ..OwnersDirBlacklist::default()
        };
        assert!(bare.dir_blacklist("acme", "widgets").is_empty());
    }

    #[test]
    fn test_in_repo_config_precedence() {
        let config = InRepoConfig {
            enabled: BTreeMap::from([
                ("*".to_string(), true),
                ("acme".to_string(), false),
                ("acme/widgets".to_string(), true),
            ]),
        };
        assert!(config.enabled_for("acme/widgets"));
        assert!(!config.enabled_for("acme/gadgets"));
        assert!(config.enabled_for("other/repo"));
        assert!(!InRepoConfig::default().enabled_for("acme/widgets"));
    }
}
