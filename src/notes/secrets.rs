use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Marker that points into the external secret store instead of holding a value.
pub const REFERENCE_PREFIX: &str = "secret://";

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"secret://([A-Za-z0-9_/-]+)").expect("valid secret reference regex")
});

// Template output keeps `secret://{VM_NAME}-root-pass` until the name is filled in.
static PLACEHOLDER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{[A-Z][A-Z0-9_]*\}").expect("valid placeholder regex"));

/// Collect secret store identifiers in first-appearance order.
///
/// Multi-segment paths such as `api/production-key` are one reference.
/// Duplicates are collapsed by exact string equality.
pub fn extract_references(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for caps in REFERENCE.captures_iter(text) {
        let Some(id) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if seen.insert(id) {
            refs.push(id.to_string());
        }
    }
    refs
}

/// True when `value` starts with a well-formed reference marker. The name may
/// still begin with an unfilled `{PLACEHOLDER}`.
pub fn is_reference(value: &str) -> bool {
    let Some(rest) = value.strip_prefix(REFERENCE_PREFIX) else {
        return false;
    };
    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'))
        || PLACEHOLDER_NAME.is_match(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order() {
        let text = "VM: Production Server\n  Credentials: secret://vm-341-ssh-key\n  API Key: secret://api/production-key\n";
        assert_eq!(
            extract_references(text),
            vec!["vm-341-ssh-key".to_string(), "api/production-key".to_string()]
        );
    }

    #[test]
    fn duplicates_collapse_to_first() {
        let text = "secret://b secret://a secret://b secret://a/x";
        assert_eq!(extract_references(text), vec!["b", "a", "a/x"]);
    }

    #[test]
    fn dedup_is_case_sensitive() {
        assert_eq!(extract_references("secret://Key secret://key"), vec!["Key", "key"]);
    }

    #[test]
    fn stops_at_non_path_characters() {
        assert_eq!(extract_references("(secret://db-pass)."), vec!["db-pass"]);
        assert_eq!(
            extract_references("<code>secret://web/tls</code>"),
            vec!["web/tls"]
        );
    }

    #[test]
    fn no_markers() {
        assert!(extract_references("").is_empty());
        assert!(extract_references("secret:// nothing").is_empty());
        assert!(extract_references("password stored elsewhere").is_empty());
    }

    #[test]
    fn reference_detection() {
        assert!(is_reference("secret://vm-key"));
        assert!(!is_reference("secret://"));
        assert!(!is_reference("hunter2"));
    }

    #[test]
    fn placeholder_names_are_references() {
        assert!(is_reference("secret://{VM_NAME}-root-pass"));
        assert!(is_reference("secret://{DB}"));
        assert!(!is_reference("secret://{lower}"));
        assert!(!is_reference("secret://{"));
    }
}
