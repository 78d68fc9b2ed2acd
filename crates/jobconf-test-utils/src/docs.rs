//! Canned documents shared by test suites.

/// A primary config with nothing but a pod namespace.
pub const MINIMAL_CONFIG: &str = "pod_namespace: default\n";

/// A primary config carrying a complete wildcard decoration default.
pub const DECORATION_CONFIG: &str = r#"
plank:
  default_decoration_configs:
    "*":
      timeout: 2h
      grace_period: 15s
      utility_images:
        clonerefs: "clonerefs:v1"
        initupload: "initupload:v1"
        entrypoint: "entrypoint:v1"
        sidecar: "sidecar:v1"
      gcs_configuration:
        bucket: "ci-logs"
        path_strategy: "explicit"
      gcs_credentials_secret: "gcs-creds"
"#;

/// A fragment with one undecorated presubmit, `unit-test`, on `org/repo`.
pub const UNIT_TEST_PRESUBMIT: &str = r#"
presubmits:
  org/repo:
  - name: unit-test
    branches:
    - main
    spec:
      containers:
      - image: golang:1.22
        command: ["make", "test"]
"#;
