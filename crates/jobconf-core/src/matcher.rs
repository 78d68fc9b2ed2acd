//! Compiled job matchers
//!
//! Trigger, branch and change patterns are compiled once per load and stored
//! on the job that owns them. A reload compiles a fresh set.

use regex::Regex;

use crate::error::{Error, PatternError, Result};
use crate::jobs::{Postsubmit, Presubmit};

/// A regex compiled from configuration; compares by its source pattern
#[derive(Debug, Clone)]
pub struct Matcher(Regex);

impl Matcher {
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// The comment pattern that triggers a job named `name` by default
///
/// Matches a line starting with `/test` followed, somewhere in the same
/// line, by the whole job name with an optional trailing comma.
pub fn default_trigger_for(name: &str) -> String {
    format!(r"(?m)^/test( | .* ){},?($|\s.*)", regex::escape(name))
}

/// The comment that re-runs a job named `name` by default
pub fn default_rerun_command_for(name: &str) -> String {
    format!("/test {name}")
}

/// Compile the trigger, branch and change patterns of each presubmit
///
/// Fails if any pattern does not compile, or if a job's rerun command would
/// not itself trigger the job.
pub fn set_presubmit_regexes(jobs: &mut [Presubmit]) -> Result<()> {
    for job in jobs.iter_mut() {
        let name = job.base.name.clone();
        let compile_err = |source: PatternError| Error::Compile {
            job: name.clone(),
            source,
        };

        let trigger = Matcher::new(&job.trigger).map_err(|source| {
            compile_err(PatternError {
                what: "trigger",
                source,
            })
        })?;
        if !trigger.is_match(&job.rerun_command) {
            return Err(Error::RerunCommandMismatch {
                job: name.clone(),
                rerun_command: job.rerun_command.clone(),
                trigger: job.trigger.clone(),
            });
        }
        job.trigger_re = Some(trigger);

        job.brancher = std::mem::take(&mut job.brancher)
            .compile()
            .map_err(compile_err)?;
        job.change_matcher = std::mem::take(&mut job.change_matcher)
            .compile()
            .map_err(compile_err)?;
    }
    Ok(())
}

/// Compile the branch and change patterns of each postsubmit
pub fn set_postsubmit_regexes(jobs: &mut [Postsubmit]) -> Result<()> {
    for job in jobs.iter_mut() {
        let name = &job.base.name;
        let compile_err = |source: PatternError| Error::Compile {
            job: name.clone(),
            source,
        };

        let brancher = std::mem::take(&mut job.brancher)
            .compile()
            .map_err(compile_err)?;
        let change_matcher = std::mem::take(&mut job.change_matcher)
            .compile()
            .map_err(compile_err)?;
        job.brancher = brancher;
        job.change_matcher = change_matcher;
    }
    Ok(())
}
