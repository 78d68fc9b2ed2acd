use serde::{Deserialize, Serialize};

use super::{JobBase, Reporter};
use crate::brancher::{Brancher, RegexpChangeMatcher};
use crate::matcher::Matcher;

/// A job that runs against proposed changes before they merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presubmit {
    #[serde(flatten)]
    pub base: JobBase,

    /// Run on every change, regardless of which files it touches
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_run: bool,

    /// A failure does not block merging
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    /// Comment pattern that triggers the job
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trigger: String,

    /// Comment that re-runs the job; must match `trigger`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rerun_command: String,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub change_matcher: RegexpChangeMatcher,

    #[serde(flatten)]
    pub reporter: Reporter,

    #[serde(skip)]
    pub(crate) trigger_re: Option<Matcher>,
}

impl Presubmit {
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// True if `body` would trigger this job
    pub fn trigger_matches(&self, body: &str) -> bool {
        self.trigger_re.as_ref().is_some_and(|re| re.is_match(body))
    }

    /// True if the job can run against changes targeting `branch`
    pub fn could_run(&self, branch: &str) -> bool {
        self.brancher.should_run(branch)
    }

    /// True if the job should run on its own for a change to `branch`
    /// touching `changes`
    pub fn should_run<S: AsRef<str>>(&self, branch: &str, changes: &[S]) -> bool {
        if !self.could_run(branch) {
            return false;
        }
        if self.always_run {
            return true;
        }
        self.runs_against_changes(changes)
    }

    /// True if any of `changes` matches the job's change filter
    pub fn runs_against_changes<S: AsRef<str>>(&self, changes: &[S]) -> bool {
        self.change_matcher.runs_against_changes(changes)
    }

    /// True if the job reports a status context
    pub fn reports(&self) -> bool {
        !self.reporter.skip_report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::set_presubmit_regexes;

    #[test]
    fn test_parse_flattened_fields() {
        let yaml = r#"
name: verify
always_run: true
skip_branches: ["^release-.*"]
context: ci/verify
skip_report: false
spec:
  containers:
    - image: alpine
"#;
        let job: Presubmit = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(job.name(), "verify");
        assert!(job.always_run);
        assert_eq!(job.brancher.skip_branches, vec!["^release-.*".to_string()]);
        assert_eq!(job.reporter.context, "ci/verify");
        assert!(job.base.spec.is_some());
    }

    #[test]
    fn test_should_run() {
        let yaml = r#"
name: docs
run_if_changed: "^docs/"
branches: ["^main$"]
trigger: "(?m)^/test docs$"
rerun_command: "/test docs"
"#;
        let job: Presubmit = serde_yaml::from_str(yaml).unwrap();
        let mut jobs = vec![job];
        set_presubmit_regexes(&mut jobs).unwrap();
        let job = &jobs[0];

        assert!(job.should_run("main", &["docs/readme.md"]));
        assert!(!job.should_run("main", &["src/lib.rs"]));
        assert!(!job.should_run("dev", &["docs/readme.md"]));
        assert!(job.trigger_matches("/test docs"));
    }
}
