//! Label key and value syntax
//!
//! Keys are qualified names: an optional DNS subdomain prefix followed by a
//! slash and a short name. Values are short names that may also be empty.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::JobError;

const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const LABEL_VALUE_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid regex")
});

static LABEL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").expect("valid regex")
});

static DNS1123_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

/// Check that `value` is a valid label key
pub fn check_qualified_name(value: &str) -> Result<(), String> {
    let (prefix, name) = match value.split('/').collect::<Vec<_>>().as_slice() {
        [name] => (None, *name),
        [prefix, name] => (Some(*prefix), *name),
        _ => {
            return Err(
                "a qualified name must consist of alphanumeric characters, '-', '_' or '.', \
                 with an optional DNS subdomain prefix and '/'"
                    .to_string(),
            );
        }
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err("prefix part must be non-empty".to_string());
        }
        if prefix.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
            return Err(format!(
                "prefix part must be no more than {DNS1123_SUBDOMAIN_MAX_LENGTH} characters"
            ));
        }
        if !DNS1123_SUBDOMAIN.is_match(prefix) {
            return Err(
                "prefix part must consist of lower case alphanumeric characters, '-' or '.'"
                    .to_string(),
            );
        }
    }

    if name.is_empty() {
        return Err("name part must be non-empty".to_string());
    }
    if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        return Err(format!(
            "name part must be no more than {QUALIFIED_NAME_MAX_LENGTH} characters"
        ));
    }
    if !QUALIFIED_NAME.is_match(name) {
        return Err(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Check that `value` is a valid label value
pub fn check_label_value(value: &str) -> Result<(), String> {
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        return Err(format!(
            "must be no more than {LABEL_VALUE_MAX_LENGTH} characters"
        ));
    }
    if !LABEL_VALUE.is_match(value) {
        return Err(
            "a valid label must be an empty string or consist of alphanumeric characters, \
             '-', '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    Ok(())
}

/// Validate every key and value in a label map, reporting the first failure
pub(crate) fn validate_labels(labels: &BTreeMap<String, String>) -> Result<(), JobError> {
    for (label, value) in labels {
        check_qualified_name(label).map_err(|reason| JobError::InvalidLabelKey {
            label: label.clone(),
            reason,
        })?;
        check_label_value(value).map_err(|reason| JobError::InvalidLabelValue {
            label: label.clone(),
            value: value.clone(),
            reason,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("app")]
    #[case("preset-service-account")]
    #[case("example.com/team")]
    #[case("a.b-c_d")]
    fn test_valid_keys(#[case] key: &str) {
        assert!(check_qualified_name(key).is_ok(), "{key}");
    }

    #[rstest]
    #[case("")]
    #[case("-leading")]
    #[case("trailing.")]
    #[case("/name")]
    #[case("Example.com/name")]
    #[case("a/b/c")]
    #[case("has space")]
    fn test_invalid_keys(#[case] key: &str) {
        assert!(check_qualified_name(key).is_err(), "{key}");
    }

    #[test]
    fn test_key_length_limit() {
        assert!(check_qualified_name(&"a".repeat(63)).is_ok());
        assert!(check_qualified_name(&"a".repeat(64)).is_err());
    }

    #[rstest]
    #[case("", true)]
    #[case("true", true)]
    #[case("v1.2.3", true)]
    #[case("-x", false)]
    #[case("a b", false)]
    fn test_label_values(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(check_label_value(value).is_ok(), valid, "{value}");
    }

    #[test]
    fn test_validate_labels_reports_offending_label() {
        let labels = BTreeMap::from([("ok".to_string(), "not ok!".to_string())]);
        let err = validate_labels(&labels).unwrap_err();
        assert!(matches!(err, JobError::InvalidLabelValue { ref label, .. } if label == "ok"));
    }
}
