//! Branch and changed-file filters
//!
//! A [`Brancher`] decides which target branches a job runs against, and a
//! [`RegexpChangeMatcher`] decides whether a set of changed files is relevant
//! to it. Both carry their patterns as configured text and a compiled form
//! that is populated during load.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;
use crate::matcher::Matcher;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brancher {
    /// Branches the job must not run against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_branches: Vec<String>,

    /// Branches the job may run against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    #[serde(skip)]
    re: Option<Matcher>,

    #[serde(skip)]
    re_skip: Option<Matcher>,
}

impl Brancher {
    /// Build a compiled brancher
    pub fn new(branches: Vec<String>, skip_branches: Vec<String>) -> Result<Self, PatternError> {
        let brancher = Self {
            branches,
            skip_branches,
            ..Self::default()
        };
        brancher.compile()
    }

    /// Compile the branch patterns, each list joined into one alternation
    pub fn compile(mut self) -> Result<Self, PatternError> {
        self.re = join_patterns(&self.branches, "positive branch")?;
        self.re_skip = join_patterns(&self.skip_branches, "negative branch")?;
        Ok(self)
    }

    /// True if the brancher has no filters at all
    pub fn runs_against_all_branches(&self) -> bool {
        self.branches.is_empty() && self.skip_branches.is_empty()
    }

    /// True if a job with this brancher should run against `branch`
    pub fn should_run(&self, branch: &str) -> bool {
        if self.runs_against_all_branches() {
            return true;
        }
        if self.re_skip.as_ref().is_some_and(|re| re.is_match(branch)) {
            return false;
        }
        if self.branches.is_empty() {
            return true;
        }
        self.re.as_ref().is_some_and(|re| re.is_match(branch))
    }

    /// True if some branch exists that both branchers would run against
    ///
    /// This is what makes two same-named jobs on one repository collide.
    pub fn intersects(&self, other: &Brancher) -> bool {
        if self.runs_against_all_branches() || other.runs_against_all_branches() {
            return true;
        }

        if !self.branches.is_empty() {
            if !other.branches.is_empty() {
                return self.branches.iter().any(|b| other.branches.contains(b));
            }
            return self.branches.iter().any(|b| other.should_run(b));
        }

        if other.branches.is_empty() {
            // Two skip-only branchers both run against any unlisted branch.
            return true;
        }
        other.intersects(self)
    }
}

/// Filter over the files touched by a change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegexpChangeMatcher {
    /// Pattern a changed file must match for the job to run
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_if_changed: String,

    #[serde(skip)]
    re_changes: Option<Matcher>,
}

impl RegexpChangeMatcher {
    pub fn new(run_if_changed: impl Into<String>) -> Result<Self, PatternError> {
        Self {
            run_if_changed: run_if_changed.into(),
            re_changes: None,
        }
        .compile()
    }

    pub fn compile(mut self) -> Result<Self, PatternError> {
        self.re_changes = if self.run_if_changed.is_empty() {
            None
        } else {
            Some(
                Matcher::new(&self.run_if_changed).map_err(|source| PatternError {
                    what: "run_if_changed",
                    source,
                })?,
            )
        };
        Ok(self)
    }

    /// True if the job only runs when matching files change
    pub fn can_run_based_on_changes(&self) -> bool {
        !self.run_if_changed.is_empty()
    }

    /// True if any of `changes` matches the pattern
    pub fn runs_against_changes<S: AsRef<str>>(&self, changes: &[S]) -> bool {
        match &self.re_changes {
            Some(re) => changes.iter().any(|c| re.is_match(c.as_ref())),
            None => false,
        }
    }
}

fn join_patterns(patterns: &[String], what: &'static str) -> Result<Option<Matcher>, PatternError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    Matcher::new(&patterns.join("|"))
        .map(Some)
        .map_err(|source| PatternError { what, source })
}
