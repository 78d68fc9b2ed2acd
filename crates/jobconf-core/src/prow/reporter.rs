//! Status and chat reporting settings

use std::fmt;

use serde::{Deserialize, Serialize};

use super::check_template;
use crate::error::{Error, Result};
use crate::jobs::ProwJobType;

/// Lifecycle state of a job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProwJobState {
    Scheduling,
    Triggered,
    Pending,
    Success,
    Failure,
    Aborted,
    Error,
}

impl fmt::Display for ProwJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduling => "scheduling",
            Self::Triggered => "triggered",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Which job kinds report status back to the code host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubReporter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_types_to_report: Vec<ProwJobType>,
}

impl GitHubReporter {
    pub(crate) fn default_and_validate(&mut self) -> Result<()> {
        if self.job_types_to_report.is_empty() {
            self.job_types_to_report = vec![ProwJobType::Presubmit, ProwJobType::Postsubmit];
        }
        if let Some(invalid) = self
            .job_types_to_report
            .iter()
            .find(|t| !matches!(t, ProwJobType::Presubmit | ProwJobType::Postsubmit))
        {
            return Err(Error::controller(
                "github_reporter",
                format!("invalid job_types_to_report: {invalid}"),
            ));
        }
        Ok(())
    }

    pub fn reports(&self, job_type: ProwJobType) -> bool {
        self.job_types_to_report.contains(&job_type)
    }
}

pub const DEFAULT_SLACK_TEMPLATE: &str = "Job {{.Spec.Job}} of type {{.Spec.Type}} ended with state {{.Status.State}}. <{{.Status.URL}}|View logs>";

/// Chat notifications for finished jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackReporter {
    #[serde(default)]
    pub job_types_to_report: Vec<ProwJobType>,

    #[serde(default)]
    pub job_states_to_report: Vec<ProwJobState>,

    #[serde(default)]
    pub channel: String,

    #[serde(default)]
    pub report_template: String,
}

impl SlackReporter {
    pub(crate) fn default_and_validate(&mut self) -> Result<()> {
        if self.report_template.is_empty() {
            self.report_template = DEFAULT_SLACK_TEMPLATE.to_string();
        }
        if self.channel.is_empty() {
            return Err(Error::controller("slack_reporter", "channel must be set"));
        }
        check_template(&self.report_template).map_err(|e| {
            Error::controller("slack_reporter", format!("failed to parse template: {e}"))
        })
    }

    pub fn reports(&self, job_type: ProwJobType, state: ProwJobState) -> bool {
        self.job_types_to_report.contains(&job_type) && self.job_states_to_report.contains(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_reporter_defaults() {
        let mut reporter = GitHubReporter::default();
        reporter.default_and_validate().unwrap();
        assert!(reporter.reports(ProwJobType::Presubmit));
        assert!(reporter.reports(ProwJobType::Postsubmit));
        assert!(!reporter.reports(ProwJobType::Periodic));
    }

    #[test]
    fn test_github_reporter_rejects_periodic() {
        let mut reporter = GitHubReporter {
            job_types_to_report: vec![ProwJobType::Periodic],
        };
        let err = reporter.default_and_validate().unwrap_err();
        assert!(err.to_string().contains("invalid job_types_to_report: periodic"));
    }

    #[test]
    fn test_slack_requires_channel() {
        let mut reporter = SlackReporter::default();
        assert!(reporter.default_and_validate().is_err());
        assert_eq!(reporter.report_template, DEFAULT_SLACK_TEMPLATE);
    }

    #[test]
    fn test_slack_template_checked() {
        let mut reporter = SlackReporter {
            channel: "ci".into(),
            report_template: "Job {{.Spec.Job ended".into(),
            ..SlackReporter::default()
        };
        assert!(reporter.default_and_validate().is_err());
    }

    #[test]
    fn test_slack_parses_states() {
        let reporter: SlackReporter = serde_yaml::from_str(
            "channel: ci\njob_types_to_report: [periodic]\njob_states_to_report: [failure, error]\n",
        )
        .unwrap();
        assert!(reporter.reports(ProwJobType::Periodic, ProwJobState::Failure));
        assert!(!reporter.reports(ProwJobType::Periodic, ProwJobState::Success));
    }
}
