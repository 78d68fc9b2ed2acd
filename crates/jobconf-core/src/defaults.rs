//! Default cascade
//!
//! Fills in what jobs leave unset: decoration settings from the defaults for
//! their repository, preset injections, agent, namespace, cluster, status
//! context and trigger. Compiles each change-scoped job's matchers after its
//! fields have been defaulted.

use crate::error::Result;
use crate::job_config::JobConfig;
use crate::jobs::{JobBase, Periodic, Postsubmit, Presubmit};
use crate::matcher::{
    default_rerun_command_for, default_trigger_for, set_postsubmit_regexes, set_presubmit_regexes,
};
use crate::preset::resolve_presets;
use crate::prow::{Plank, ProwConfig};

pub const DEFAULT_CLUSTER: &str = "default";

/// Run the default cascade over every job
pub(crate) fn finalize_job_config(jobs: &mut JobConfig, prow: &mut ProwConfig) -> Result<()> {
    if jobs.decoration_requested() {
        prow.plank.finalize_decoration_defaults()?;
        for job in &mut jobs.periodics {
            let repo = job.decoration_repo();
            set_decoration_defaults(&prow.plank, &mut job.base, &repo);
        }
    }

    for (repo, presubmits) in &mut jobs.presubmits {
        for job in presubmits.iter_mut() {
            set_decoration_defaults(&prow.plank, &mut job.base, repo);
            resolve_presets(
                &job.base.name,
                &job.base.labels,
                job.base.spec.as_mut(),
                &jobs.presets,
            )?;
        }
        for job in presubmits.iter_mut() {
            default_presubmit(job, &prow.pod_namespace);
        }
        set_presubmit_regexes(presubmits)?;
        tracing::debug!(%repo, count = presubmits.len(), "Defaulted presubmits");
    }

    for (repo, postsubmits) in &mut jobs.postsubmits {
        for job in postsubmits.iter_mut() {
            set_decoration_defaults(&prow.plank, &mut job.base, repo);
            resolve_presets(
                &job.base.name,
                &job.base.labels,
                job.base.spec.as_mut(),
                &jobs.presets,
            )?;
        }
        for job in postsubmits.iter_mut() {
            default_postsubmit(job, &prow.pod_namespace);
        }
        set_postsubmit_regexes(postsubmits)?;
        tracing::debug!(%repo, count = postsubmits.len(), "Defaulted postsubmits");
    }

    for job in &mut jobs.periodics {
        default_periodic(job, &prow.pod_namespace);
        resolve_presets(
            &job.base.name,
            &job.base.labels,
            job.base.spec.as_mut(),
            &jobs.presets,
        )?;
    }
    Ok(())
}

/// Layer a decorated job's own settings over the defaults for `repo`
fn set_decoration_defaults(plank: &Plank, base: &mut JobBase, repo: &str) {
    if !base.decorates() {
        return;
    }
    let Some(defaults) = plank.default_decoration_config_for(repo) else {
        return;
    };
    let own = base
        .utility_config
        .decoration_config
        .take()
        .unwrap_or_default();
    base.utility_config.decoration_config = Some(own.apply_default(&defaults));
}

fn default_job_base(base: &mut JobBase, pod_namespace: &str) {
    if base.agent.is_none() {
        base.agent = Some(Default::default());
    }
    if base.namespace.as_deref().is_none_or(str::is_empty) {
        base.namespace = Some(pod_namespace.to_string());
    }
    if base.cluster.is_empty() {
        base.cluster = DEFAULT_CLUSTER.to_string();
    }
}

pub(crate) fn default_presubmit(job: &mut Presubmit, pod_namespace: &str) {
    default_job_base(&mut job.base, pod_namespace);
    if job.reporter.context.is_empty() {
        job.reporter.context = job.base.name.clone();
    }
    // Only default when both are unset; one without the other fails validation.
    if job.trigger.is_empty() && job.rerun_command.is_empty() {
        job.trigger = default_trigger_for(&job.base.name);
        job.rerun_command = default_rerun_command_for(&job.base.name);
    }
}

pub(crate) fn default_postsubmit(job: &mut Postsubmit, pod_namespace: &str) {
    default_job_base(&mut job.base, pod_namespace);
    if job.reporter.context.is_empty() {
        job.reporter.context = job.base.name.clone();
    }
}

pub(crate) fn default_periodic(job: &mut Periodic, pod_namespace: &str) {
    default_job_base(&mut job.base, pod_namespace);
}
