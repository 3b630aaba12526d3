//! Pure validation for session and archived-session names.
//!
//! No directory creation, no filesystem reads beyond what callers pass in —
//! these functions only look at the string itself. Whether a name already
//! exists on disk is a separate question, answered in `store.rs`.

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 200;
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Validates a session name against the naming policy: a
/// non-empty string up to 200 characters, free of path-hostile characters,
/// control characters, and leading/trailing/consecutive whitespace, and not
/// `.` or `..`. Deliberately permissive otherwise — e.g. embedded single
/// spaces are allowed — since every consumer either shell-quotes the name
/// or uses it as a single, already-validated path component.
pub fn validate_session_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input(name, "name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::FilesystemLimit {
            path: name.to_string(),
        });
    }
    if name == "." || name == ".." {
        return Err(Error::invalid_input(name, "name must not be '.' or '..'"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(Error::invalid_input(
            name,
            format!("name must not contain '{c}'"),
        ));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::invalid_input(
            name,
            "name must not contain control characters",
        ));
    }
    if name.starts_with(char::is_whitespace) || name.ends_with(char::is_whitespace) {
        return Err(Error::invalid_input(
            name,
            "name must not start or end with whitespace",
        ));
    }
    if name
        .chars()
        .zip(name.chars().skip(1))
        .any(|(a, b)| a.is_whitespace() && b.is_whitespace())
    {
        return Err(Error::invalid_input(
            name,
            "name must not contain consecutive whitespace",
        ));
    }
    Ok(())
}

/// Archived names follow `<name>-<YYYYMMDD-HHMMSS>[-NN]`; validated the same
/// way as a session name since they are just a derived, still-filesystem-safe
/// identifier.
pub fn validate_archived_name(name: &str) -> Result<()> {
    validate_session_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        assert!(validate_session_name("work").is_ok());
        assert!(validate_session_name("work-2024_01").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_session_name("").is_err());
    }

    #[test]
    fn rejects_dot_and_dotdot() {
        assert!(validate_session_name(".").is_err());
        assert!(validate_session_name("..").is_err());
    }

    #[test]
    fn rejects_path_separators() {
        assert!(validate_session_name("a/b").is_err());
        assert!(validate_session_name("a\\b").is_err());
        assert!(validate_session_name("../escape").is_err());
    }

    #[test]
    fn rejects_other_forbidden_characters() {
        for bad in ['<', '>', ':', '"', '|', '?', '*'] {
            let name = format!("work{bad}name");
            assert!(validate_session_name(&name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn accepts_a_single_embedded_space() {
        assert!(validate_session_name("my session").is_ok());
    }

    #[test]
    fn rejects_leading_trailing_and_consecutive_whitespace() {
        assert!(validate_session_name(" work").is_err());
        assert!(validate_session_name("work ").is_err());
        assert!(validate_session_name("my  session").is_err());
    }

    #[test]
    fn rejects_control_characters() {
        assert!(validate_session_name("work\u{0007}name").is_err());
    }

    #[test]
    fn name_at_exactly_max_length_is_accepted_one_past_is_rejected_as_filesystem_limit() {
        let at_max = "a".repeat(MAX_NAME_LEN);
        let over_max = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_session_name(&at_max).is_ok());
        let err = validate_session_name(&over_max).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FilesystemLimit);
    }

    #[test]
    fn length_limit_counts_characters_not_bytes() {
        let at_max = "é".repeat(MAX_NAME_LEN);
        assert!(validate_session_name(&at_max).is_ok());
        let over_max = "é".repeat(MAX_NAME_LEN + 1);
        let err = validate_session_name(&over_max).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FilesystemLimit);
    }
}
