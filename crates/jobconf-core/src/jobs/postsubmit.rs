use serde::{Deserialize, Serialize};

use super::{JobBase, Reporter};
use crate::brancher::{Brancher, RegexpChangeMatcher};

/// A job that runs after changes merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Postsubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub change_matcher: RegexpChangeMatcher,

    #[serde(flatten)]
    pub reporter: Reporter,
}

impl Postsubmit {
    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn could_run(&self, branch: &str) -> bool {
        self.brancher.should_run(branch)
    }

    /// True if a push to `branch` touching `changes` should run the job
    pub fn should_run<S: AsRef<str>>(&self, branch: &str, changes: &[S]) -> bool {
        if !self.could_run(branch) {
            return false;
        }
        !self.change_matcher.can_run_based_on_changes() || self.runs_against_changes(changes)
    }

    pub fn runs_against_changes<S: AsRef<str>>(&self, changes: &[S]) -> bool {
        self.change_matcher.runs_against_changes(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::set_postsubmit_regexes;

    #[test]
    fn test_should_run_without_change_filter() {
        let job: Postsubmit = serde_yaml::from_str("name: publish\nbranches: [\"^main$\"]\n").unwrap();
        let mut jobs = vec![job];
        set_postsubmit_regexes(&mut jobs).unwrap();

        assert!(jobs[0].should_run::<&str>("main", &[]));
        assert!(!jobs[0].should_run::<&str>("feature", &[]));
    }

    #[test]
    fn test_should_run_with_change_filter() {
        let job: Postsubmit =
            serde_yaml::from_str("name: images\nrun_if_changed: \"^images/\"\n").unwrap();
        let mut jobs = vec![job];
        set_postsubmit_regexes(&mut jobs).unwrap();

        assert!(jobs[0].should_run("main", &["images/base/Dockerfile"]));
        assert!(!jobs[0].should_run("main", &["README.md"]));
    }
}
