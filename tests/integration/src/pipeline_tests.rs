//! Cross-crate tests: fragment retrieval feeding the resolution engine

use jobconf_core::{Agent, Error, from_documents, load, load_with, read_job_config};
use jobconf_fs::{FragmentSource, RawDocument, SourcePath};
use jobconf_test_utils::ConfigTree;
use jobconf_test_utils::docs::{DECORATION_CONFIG, MINIMAL_CONFIG, UNIT_TEST_PRESUBMIT};
use pretty_assertions::assert_eq;

/// Serves a fixed list of documents regardless of path
struct InMemorySource(Vec<RawDocument>);

impl FragmentSource for InMemorySource {
    fn load_fragments(&self, _path: &SourcePath) -> jobconf_fs::Result<Vec<RawDocument>> {
        Ok(self.0.clone())
    }
}

const POSTSUBMIT_AND_PERIODIC: &str = r#"
postsubmits:
  org/repo:
  - name: publish
    branches: [main]
    run_if_changed: "^docs/"
    spec:
      containers:
      - image: alpine
periodics:
- name: cleanup
  interval: 6h
  extra_refs:
  - org: org
    repo: tools
    base_ref: main
  decorate: true
  spec:
    containers:
    - image: alpine
      command: ["./cleanup.sh"]
"#;

#[test]
fn test_custom_fragment_source() {
    let tree = ConfigTree::new();
    tree.write("config.yaml", MINIMAL_CONFIG);
    let source = InMemorySource(vec![RawDocument::new(
        UNIT_TEST_PRESUBMIT.as_bytes().to_vec(),
        "virtual/presubmits.yaml",
    )]);

    let config = load_with(&source, &tree.path("config.yaml"), Some("unused".as_ref())).unwrap();
    let job = &config.presubmits("org/repo")[0];
    assert_eq!(job.base.source_path.as_str(), "virtual/presubmits.yaml");
}

#[test]
fn test_full_tree_resolves() {
    let tree = ConfigTree::new();
    tree.write("config.yaml", DECORATION_CONFIG);
    tree.write("jobs/org/repo/presubmits.yaml", UNIT_TEST_PRESUBMIT);
    tree.write("jobs/org/repo/jobs.yaml", POSTSUBMIT_AND_PERIODIC);

    let config = load(tree.path("config.yaml"), Some(&tree.path("jobs"))).unwrap();

    let publish = &config.postsubmits("org/repo")[0];
    assert!(publish.should_run("main", &["docs/index.md"]));
    assert!(!publish.should_run("main", &["src/lib.rs"]));
    assert!(!publish.should_run("dev", &["docs/index.md"]));

    let cleanup = &config.periodics()[0];
    assert_eq!(cleanup.decoration_repo(), "org/tools");
    assert!(cleanup.base.utility_config.decoration_config.is_some());
    assert!(config.is_decoration_enabled("org/tools"));
    assert!(!config.is_decoration_enabled("org/repo"));

    assert_eq!(config.all_repos().len(), 1);
}

#[test]
fn test_load_is_deterministic() {
    let tree = ConfigTree::new();
    tree.write("config.yaml", DECORATION_CONFIG);
    tree.write("jobs/org/repo/presubmits.yaml", UNIT_TEST_PRESUBMIT);
    tree.write("jobs/org/repo/jobs.yaml", POSTSUBMIT_AND_PERIODIC);

    let first = load(tree.path("config.yaml"), Some(&tree.path("jobs"))).unwrap();
    let second = load(tree.path("config.yaml"), Some(&tree.path("jobs"))).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_read_job_config_skips_defaulting() {
    let tree = ConfigTree::new();
    tree.write("jobs/org/repo/presubmits.yaml", UNIT_TEST_PRESUBMIT);

    let jobs = read_job_config(tree.path("jobs")).unwrap();
    let job = &jobs.presubmits["org/repo"][0];
    assert_eq!(job.base.agent, None);
    assert!(job.trigger.is_empty());
    assert!(job.reporter.context.is_empty());
}

#[test]
fn test_json_primary_config() {
    let tree = ConfigTree::new();
    tree.write(
        "config.json",
        r#"{"pod_namespace": "test-pods", "sinker": {"resync_period": "30m"}}"#,
    );

    let config = load(tree.path("config.json"), None).unwrap();
    assert_eq!(config.prow_config().pod_namespace, "test-pods");
}

#[test]
fn test_in_memory_documents() {
    let primary = RawDocument::new(MINIMAL_CONFIG.as_bytes().to_vec(), "config.yaml");
    let broken = RawDocument::new(b"presubmits: [not, a, map]".to_vec(), "broken.yaml");

    let err = from_documents(primary, vec![broken]).unwrap_err();
    assert!(matches!(err, Error::Fs(jobconf_fs::Error::ConfigParse { .. })));
}

#[test]
fn test_decorated_periodic_needs_defaults() {
    let primary = RawDocument::new(MINIMAL_CONFIG.as_bytes().to_vec(), "config.yaml");
    let fragment = RawDocument::new(POSTSUBMIT_AND_PERIODIC.as_bytes().to_vec(), "jobs.yaml");

    let err = from_documents(primary, vec![fragment]).unwrap_err();
    // The decorated periodic needs a wildcard decoration default.
    assert!(matches!(err, Error::MissingWildcardDecoration));

    let primary = RawDocument::new(DECORATION_CONFIG.as_bytes().to_vec(), "config.yaml");
    let fragment = RawDocument::new(POSTSUBMIT_AND_PERIODIC.as_bytes().to_vec(), "jobs.yaml");
    let config = from_documents(primary, vec![fragment]).unwrap();
    assert!(config.all_postsubmits().all(|j| j.base.agent == Some(Agent::Kubernetes)));
}

#[cfg(unix)]
#[test]
fn test_mounted_config_map_layout() {
    use std::os::unix::fs::symlink;

    let tree = ConfigTree::new();
    tree.write("config.yaml", MINIMAL_CONFIG);
    tree.write("jobs/..2024_06_01/presubmits.yaml", UNIT_TEST_PRESUBMIT);
    symlink(tree.path("jobs/..2024_06_01"), tree.path("jobs/..data")).unwrap();
    symlink(
        tree.path("jobs/..data/presubmits.yaml"),
        tree.path("jobs/presubmits.yaml"),
    )
    .unwrap();

    let config = load(tree.path("config.yaml"), Some(&tree.path("jobs"))).unwrap();
    assert_eq!(config.presubmits("org/repo").len(), 1);
}
