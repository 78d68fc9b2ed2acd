//! Per-job and cross-job validation
//!
//! Runs on the defaulted configuration and stops at the first violation.
//! Repositories are visited in key order so the reported error is stable.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::brancher::Brancher;
use crate::duration::Duration;
use crate::error::{Error, JobError, Result};
use crate::job_config::JobConfig;
use crate::jobs::{Agent, JobBase, Periodic, Postsubmit, Presubmit, ProwJobType};
use crate::labels::validate_labels;
use crate::pod::PodSpec;

const JOB_NAME_PATTERN: &str = r"^[A-Za-z0-9-._]+$";

static JOB_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(JOB_NAME_PATTERN).expect("valid job name regex"));

/// Validate every job, then cache each periodic's parsed interval
pub(crate) fn validate_job_config(jobs: &mut JobConfig, pod_namespace: &str) -> Result<()> {
    for presubmits in jobs.presubmits.values() {
        validate_presubmits(presubmits, pod_namespace)?;
    }
    for postsubmits in jobs.postsubmits.values() {
        validate_postsubmits(postsubmits, pod_namespace)?;
    }
    validate_periodics(&jobs.periodics, pod_namespace)?;

    for job in &mut jobs.periodics {
        job.interval_duration = check_schedule(job).map_err(|source| Error::InvalidJob {
            kind: ProwJobType::Periodic,
            name: job.base.name.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Validate the presubmits of one repository
///
/// Two presubmits may share a name only if their branch filters cannot both
/// accept the same branch.
pub fn validate_presubmits(presubmits: &[Presubmit], pod_namespace: &str) -> Result<()> {
    let mut accepted: BTreeMap<&str, Vec<&Brancher>> = BTreeMap::new();
    for job in presubmits {
        let name = job.base.name.as_str();
        reject_overlap(&accepted, ProwJobType::Presubmit, name, &job.brancher)?;

        let invalid = |source| Error::InvalidJob {
            kind: ProwJobType::Presubmit,
            name: name.to_string(),
            source,
        };
        validate_job_base(&job.base, pod_namespace).map_err(invalid)?;
        validate_triggering(job).map_err(invalid)?;

        accepted.entry(name).or_default().push(&job.brancher);
    }
    Ok(())
}

/// Validate the postsubmits of one repository
pub fn validate_postsubmits(postsubmits: &[Postsubmit], pod_namespace: &str) -> Result<()> {
    let mut accepted: BTreeMap<&str, Vec<&Brancher>> = BTreeMap::new();
    for job in postsubmits {
        let name = job.base.name.as_str();
        reject_overlap(&accepted, ProwJobType::Postsubmit, name, &job.brancher)?;

        validate_job_base(&job.base, pod_namespace).map_err(|source| Error::InvalidJob {
            kind: ProwJobType::Postsubmit,
            name: name.to_string(),
            source,
        })?;

        accepted.entry(name).or_default().push(&job.brancher);
    }
    Ok(())
}

/// Validate periodics; names must be unique across the whole configuration
pub fn validate_periodics(periodics: &[Periodic], pod_namespace: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for job in periodics {
        let name = job.base.name.as_str();
        if !seen.insert(name) {
            return Err(Error::DuplicatedJob {
                kind: ProwJobType::Periodic,
                name: name.to_string(),
            });
        }
        validate_job_base(&job.base, pod_namespace).map_err(|source| Error::InvalidJob {
            kind: ProwJobType::Periodic,
            name: name.to_string(),
            source,
        })?;
    }
    Ok(())
}

fn reject_overlap(
    accepted: &BTreeMap<&str, Vec<&Brancher>>,
    kind: ProwJobType,
    name: &str,
    brancher: &Brancher,
) -> Result<()> {
    let overlaps = accepted
        .get(name)
        .is_some_and(|existing| existing.iter().any(|b| b.intersects(brancher)));
    if overlaps {
        return Err(Error::DuplicatedJob {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Rules shared by every job kind
pub fn validate_job_base(base: &JobBase, pod_namespace: &str) -> std::result::Result<(), JobError> {
    if !JOB_NAME.is_match(&base.name) {
        return Err(JobError::InvalidName {
            pattern: JOB_NAME_PATTERN,
        });
    }
    if base.max_concurrency < 0 {
        return Err(JobError::NegativeConcurrency(base.max_concurrency));
    }
    validate_agent(base, pod_namespace)?;
    if let Some(spec) = &base.spec {
        validate_pod_spec(spec)?;
    }
    validate_labels(&base.labels)?;

    if base
        .rerun_auth_config
        .as_ref()
        .is_some_and(|auth| auth.is_ambiguous())
    {
        return Err(JobError::AmbiguousRerunAuth);
    }

    // Jobs for agents without a pod have nothing further to check.
    let Some(container) = base.spec.as_ref().and_then(|s| s.containers.first()) else {
        return Ok(());
    };
    if let Some(decoration) = &base.utility_config.decoration_config {
        decoration.validate().map_err(JobError::Decoration)?;
        if !container.has_entrypoint() {
            return Err(JobError::DecoratedWithoutCommand);
        }
    }
    Ok(())
}

/// Check the agent against the rest of the job, in a fixed order
fn validate_agent(base: &JobBase, pod_namespace: &str) -> std::result::Result<(), JobError> {
    let agent = base.agent();
    let found = || agent.as_str().to_string();

    if !agent.is_known() {
        tracing::warn!(job = %base.name, %agent, "Agent is unknown and cannot be validated");
        return Ok(());
    }
    if base.spec.is_some() && agent != Agent::Kubernetes {
        return Err(JobError::SpecRequiresKubernetes { found: found() });
    }
    if agent == Agent::Kubernetes && base.spec.is_none() {
        return Err(JobError::MissingSpec);
    }
    if base.utility_config.decoration_config.is_some() && !agent.supports_decoration() {
        return Err(JobError::DecorationAgent { found: found() });
    }
    if base.error_on_eviction && agent != Agent::Kubernetes {
        return Err(JobError::ErrorOnEviction { found: found() });
    }
    let namespace = base.namespace.as_deref().unwrap_or_default();
    if namespace.is_empty() {
        return Err(JobError::MissingNamespace);
    }
    if namespace != pod_namespace && !agent.supports_custom_namespace() {
        return Err(JobError::NamespaceAgent { found: found() });
    }

    if agent == Agent::KnativeBuild {
        tracing::warn!(job = %base.name, "knative-build jobs are deprecated");
    }
    Ok(())
}

fn validate_pod_spec(spec: &PodSpec) -> std::result::Result<(), JobError> {
    if !spec.init_containers.is_empty() {
        return Err(JobError::InitContainers);
    }
    if spec.containers.len() != 1 {
        return Err(JobError::ContainerCount(spec.containers.len()));
    }
    Ok(())
}

/// Presubmit-only rules on when the job runs and reports
pub fn validate_triggering(job: &Presubmit) -> std::result::Result<(), JobError> {
    if job.always_run && !job.change_matcher.run_if_changed.is_empty() {
        return Err(JobError::AlwaysRunWithChanges);
    }
    if !job.reporter.skip_report && job.reporter.context.is_empty() {
        return Err(JobError::MissingContext);
    }
    if job.trigger.is_empty() != job.rerun_command.is_empty() {
        return Err(JobError::TriggerWithoutRerunCommand);
    }
    Ok(())
}

/// Exactly one of cron and interval; returns the parsed interval
fn check_schedule(job: &Periodic) -> std::result::Result<Option<Duration>, JobError> {
    match (job.cron.is_empty(), job.interval.is_empty()) {
        (false, false) => Err(JobError::CronAndInterval),
        (true, true) => Err(JobError::NoSchedule),
        (false, true) => Ok(None),
        (true, false) => job
            .interval
            .parse::<Duration>()
            .map(Some)
            .map_err(JobError::InvalidInterval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::DecorationConfig;
    use crate::jobs::RerunAuthConfig;
    use crate::pod::Container;
    use rstest::rstest;

    fn kube_job(name: &str) -> JobBase {
        JobBase {
            agent: Some(Agent::Kubernetes),
            namespace: Some("default".into()),
            cluster: "default".into(),
            spec: Some(PodSpec::with_container(Container::new("golang"))),
            ..JobBase::named(name)
        }
    }

    fn presubmit(name: &str, branches: &[&str]) -> Presubmit {
        Presubmit {
            base: kube_job(name),
            trigger: "(?m)^/test".into(),
            rerun_command: "/test".into(),
            brancher: Brancher::new(branches.iter().map(|b| b.to_string()).collect(), vec![])
                .unwrap(),
            reporter: crate::jobs::Reporter {
                context: name.into(),
                skip_report: false,
            },
            ..Presubmit::default()
        }
    }

    #[rstest]
    #[case("unit-test")]
    #[case("e2e.gce_1")]
    fn test_valid_names(#[case] name: &str) {
        assert_eq!(validate_job_base(&kube_job(name), "default"), Ok(()));
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("slash/name")]
    fn test_invalid_names(#[case] name: &str) {
        assert!(matches!(
            validate_job_base(&kube_job(name), "default"),
            Err(JobError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_negative_max_concurrency() {
        let mut base = kube_job("unit");
        base.max_concurrency = -1;
        assert_eq!(
            validate_job_base(&base, "default"),
            Err(JobError::NegativeConcurrency(-1))
        );
    }

    #[test]
    fn test_unknown_agent_is_accepted() {
        let base = JobBase {
            agent: Some(Agent::Other("nomad".into())),
            namespace: Some("elsewhere".into()),
            ..JobBase::named("unit")
        };
        assert_eq!(validate_job_base(&base, "default"), Ok(()));
    }

    #[test]
    fn test_agent_rules() {
        let mut base = kube_job("unit");
        base.agent = Some(Agent::Jenkins);
        assert!(matches!(
            validate_job_base(&base, "default"),
            Err(JobError::SpecRequiresKubernetes { .. })
        ));

        let mut base = kube_job("unit");
        base.spec = None;
        assert_eq!(validate_job_base(&base, "default"), Err(JobError::MissingSpec));

        let mut base = kube_job("unit");
        base.spec = None;
        base.agent = Some(Agent::Jenkins);
        base.utility_config.decoration_config = Some(DecorationConfig::default());
        assert!(matches!(
            validate_job_base(&base, "default"),
            Err(JobError::DecorationAgent { .. })
        ));

        let mut base = kube_job("unit");
        base.spec = None;
        base.agent = Some(Agent::TektonPipeline);
        base.error_on_eviction = true;
        assert!(matches!(
            validate_job_base(&base, "default"),
            Err(JobError::ErrorOnEviction { .. })
        ));
    }

    #[test]
    fn test_namespace_rules() {
        let mut base = kube_job("unit");
        base.namespace = None;
        assert_eq!(validate_job_base(&base, "default"), Err(JobError::MissingNamespace));

        let mut base = kube_job("unit");
        base.namespace = Some("other".into());
        assert!(matches!(
            validate_job_base(&base, "default"),
            Err(JobError::NamespaceAgent { .. })
        ));

        let base = JobBase {
            agent: Some(Agent::TektonPipeline),
            namespace: Some("pipelines".into()),
            ..JobBase::named("unit")
        };
        assert_eq!(validate_job_base(&base, "default"), Ok(()));
    }

    #[test]
    fn test_pod_spec_shape() {
        let mut base = kube_job("unit");
        if let Some(spec) = base.spec.as_mut() {
            spec.containers.push(Container::new("sidecar"));
        }
        assert_eq!(validate_job_base(&base, "default"), Err(JobError::ContainerCount(2)));

        let mut base = kube_job("unit");
        if let Some(spec) = base.spec.as_mut() {
            spec.init_containers.push(Container::new("init"));
        }
        assert_eq!(validate_job_base(&base, "default"), Err(JobError::InitContainers));
    }

    #[test]
    fn test_ambiguous_rerun_auth() {
        let mut base = kube_job("unit");
        base.rerun_auth_config = Some(RerunAuthConfig {
            allow_anyone: true,
            github_users: vec!["alice".into()],
            ..RerunAuthConfig::default()
        });
        assert_eq!(validate_job_base(&base, "default"), Err(JobError::AmbiguousRerunAuth));
    }

    #[test]
    fn test_decorated_job_needs_command() {
        let mut base = kube_job("unit");
        base.utility_config.decoration_config = Some(DecorationConfig::default());
        assert!(matches!(
            validate_job_base(&base, "default"),
            Err(JobError::Decoration(_))
        ));
    }

    #[test]
    fn test_triggering_rules() {
        let mut job = presubmit("unit", &[]);
        job.always_run = true;
        job.change_matcher.run_if_changed = "^src/".into();
        assert_eq!(validate_triggering(&job), Err(JobError::AlwaysRunWithChanges));

        let mut job = presubmit("unit", &[]);
        job.reporter.context.clear();
        assert_eq!(validate_triggering(&job), Err(JobError::MissingContext));
        job.reporter.skip_report = true;
        assert_eq!(validate_triggering(&job), Ok(()));

        let mut job = presubmit("unit", &[]);
        job.rerun_command.clear();
        assert_eq!(
            validate_triggering(&job),
            Err(JobError::TriggerWithoutRerunCommand)
        );
    }

    #[test]
    fn test_same_name_on_disjoint_branches() {
        let jobs = vec![presubmit("unit", &["main"]), presubmit("unit", &["release"])];
        assert!(validate_presubmits(&jobs, "default").is_ok());
    }

    #[test]
    fn test_same_name_on_overlapping_branches() {
        let jobs = vec![presubmit("unit", &["main"]), presubmit("unit", &[])];
        let err = validate_presubmits(&jobs, "default").unwrap_err();
        assert_eq!(err.to_string(), "duplicated presubmit job: unit");
    }

    #[test]
    fn test_duplicate_periodic() {
        let job = Periodic {
            base: kube_job("nightly"),
            interval: "24h".into(),
            ..Periodic::default()
        };
        let err = validate_periodics(&[job.clone(), job], "default").unwrap_err();
        assert!(matches!(err, Error::DuplicatedJob { kind: ProwJobType::Periodic, .. }));
    }

    #[rstest]
    #[case("0 * * * *", "1h", Err(JobError::CronAndInterval))]
    #[case("", "", Err(JobError::NoSchedule))]
    #[case("0 * * * *", "", Ok(None))]
    #[case("", "90m", Ok(Some(Duration::from_mins(90))))]
    fn test_schedule(
        #[case] cron: &str,
        #[case] interval: &str,
        #[case] expected: std::result::Result<Option<Duration>, JobError>,
    ) {
        let job = Periodic {
            cron: cron.into(),
            interval: interval.into(),
            ..Periodic::default()
        };
        assert_eq!(check_schedule(&job), expected);
    }

    #[test]
    fn test_validate_job_config_caches_interval() {
        let mut jobs = JobConfig {
            periodics: vec![Periodic {
                base: kube_job("nightly"),
                interval: "12h".into(),
                ..Periodic::default()
            }],
            ..JobConfig::default()
        };
        validate_job_config(&mut jobs, "default").unwrap();
        assert_eq!(jobs.periodics[0].interval(), Some(Duration::from_hours(12)));
    }
}
