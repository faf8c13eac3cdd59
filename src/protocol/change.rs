//! Change-kind normalization for payloads pushed by the hub.
//!
//! Hub events such as `AttackUpdate` carry an `eventType` that arrives
//! either as a name (`"Added"`) or as an enum ordinal (`0`). Handlers should
//! not have to care which.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// ChangeKind
// ============================================================================

/// What happened to the entity carried by a pushed event.
///
/// | Wire | Kind |
/// |------|------|
/// | `0`, `"Added"` | [`ChangeKind::Added`] |
/// | `1`, `"Updated"` | [`ChangeKind::Updated`] |
/// | `2`, `"Done"` | [`ChangeKind::Done`] |
/// | anything else | [`ChangeKind::Unknown`] |
///
/// A missing field deserializes as [`ChangeKind::Added`] via `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    /// Entity was created.
    #[default]
    Added,
    /// Entity changed.
    Updated,
    /// Entity is finished and should be dismissed.
    Done,
    /// Unrecognized code or name.
    Unknown,
}

impl ChangeKind {
    /// Maps an ordinal to a kind.
    #[inline]
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Added,
            1 => Self::Updated,
            2 => Self::Done,
            _ => Self::Unknown,
        }
    }

    /// Maps a name to a kind (case-sensitive, as sent by the hub).
    #[inline]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Added" => Self::Added,
            "Updated" => Self::Updated,
            "Done" => Self::Done,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` if the entity should be dismissed.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "Added",
            Self::Updated => "Updated",
            Self::Done => "Done",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChangeKind {
    Code(i64),
    Name(String),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for ChangeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawChangeKind::deserialize(deserializer)? {
            RawChangeKind::Code(code) => Self::from_code(code),
            RawChangeKind::Name(name) => Self::from_name(&name),
            RawChangeKind::Other(_) => Self::Unknown,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct AttackEvent {
        #[serde(default)]
        event_type: ChangeKind,
    }

    fn parse(json: &str) -> ChangeKind {
        serde_json::from_str::<AttackEvent>(json)
            .expect("parse")
            .event_type
    }

    #[test]
    fn test_numeric_codes() {
        assert_eq!(parse(r#"{"eventType":0}"#), ChangeKind::Added);
        assert_eq!(parse(r#"{"eventType":1}"#), ChangeKind::Updated);
        assert_eq!(parse(r#"{"eventType":2}"#), ChangeKind::Done);
    }

    #[test]
    fn test_out_of_range_code_is_unknown() {
        assert_eq!(parse(r#"{"eventType":3}"#), ChangeKind::Unknown);
        assert_eq!(parse(r#"{"eventType":-1}"#), ChangeKind::Unknown);
    }

    #[test]
    fn test_names() {
        assert_eq!(parse(r#"{"eventType":"Updated"}"#), ChangeKind::Updated);
        assert_eq!(parse(r#"{"eventType":"Removed"}"#), ChangeKind::Unknown);
    }

    #[test]
    fn test_missing_defaults_to_added() {
        assert_eq!(parse("{}"), ChangeKind::Added);
    }

    #[test]
    fn test_is_terminal() {
        assert!(ChangeKind::Done.is_terminal());
        assert!(!ChangeKind::Unknown.is_terminal());
    }
}
