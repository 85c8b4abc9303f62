//! Friend domain model.
//!
//! # Responsibility
//! - Define the canonical contact record and its embedded interaction log.
//! - Provide identity validation shared by every storage backend.
//!
//! # Invariants
//! - `id` is assigned once by the caller and never changes afterwards.
//! - Interactions are owned by exactly one friend and have no identity of
//!   their own.
//! - Storage imposes no ordering on `facts` or `interactions`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier for a friend record.
///
/// Kept as a type alias because ids are caller-assigned strings and double as
/// storage keys.
pub type FriendId = String;

/// One logged contact event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub title: String,
    pub description: String,
    /// Undated interactions are kept but ignored by reconnect reports.
    pub date: Option<DateTime<Utc>>,
    /// Set-like labels; order is preserved as given.
    pub tags: Vec<String>,
}

impl Interaction {
    /// Creates an interaction with empty description and tags.
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            date: Some(date),
            tags: Vec::new(),
        }
    }
}

/// Canonical contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    /// Sole storage key. Immutable after creation.
    pub id: FriendId,
    /// The only field matched by name filters.
    pub name: String,
    /// Only month/day matter for recurrence; the year is kept for display.
    pub birthday: Option<NaiveDate>,
    pub facts: Vec<String>,
    pub interactions: Vec<Interaction>,
    /// Free-text provenance ("met at climbing gym").
    pub knows_because: String,
}

impl Friend {
    /// Creates a friend with a caller-provided id and no optional data.
    pub fn new(id: impl Into<FriendId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birthday: None,
            facts: Vec::new(),
            interactions: Vec::new(),
            knows_because: String::new(),
        }
    }

    /// Returns the latest interaction date, or `None` without dated
    /// interactions.
    pub fn most_recent_interaction(&self) -> Option<DateTime<Utc>> {
        self.interactions.iter().filter_map(|item| item.date).max()
    }

    /// Validates the id before it is used as a storage key.
    pub fn validate(&self) -> Result<(), InvalidFriendId> {
        validate_friend_id(&self.id)
    }
}

/// Rejected friend id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("friend id is invalid: `{0}`")]
pub struct InvalidFriendId(pub String);

/// Checks that an id can be used as a single path segment.
///
/// Empty ids, `.`/`..`, path separators and NUL are rejected.
pub fn validate_friend_id(id: &str) -> Result<(), InvalidFriendId> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.chars().any(|c| c == '/' || c == '\\' || c == '\0');
    if invalid {
        return Err(InvalidFriendId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_friend_id, Friend, Interaction};
    use chrono::{TimeZone, Utc};

    #[test]
    fn most_recent_interaction_picks_latest_date() {
        let mut friend = Friend::new("f1", "Anna");
        assert!(friend.most_recent_interaction().is_none());

        let older = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 3, 4, 18, 30, 0).unwrap();
        friend.interactions.push(Interaction::new("call", newer));
        friend.interactions.push(Interaction::new("coffee", older));

        assert_eq!(friend.most_recent_interaction(), Some(newer));
    }

    #[test]
    fn most_recent_interaction_ignores_undated_entries() {
        let mut friend = Friend::new("f1", "Anna");
        let mut undated = Interaction::new("letter", Utc::now());
        undated.date = None;
        friend.interactions.push(undated);
        assert!(friend.most_recent_interaction().is_none());

        let dated = Utc.with_ymd_and_hms(2024, 5, 6, 7, 0, 0).unwrap();
        friend.interactions.push(Interaction::new("call", dated));
        assert_eq!(friend.most_recent_interaction(), Some(dated));
    }

    #[test]
    fn json_form_roundtrips_and_uses_field_names() {
        let mut friend = Friend::new("f1", "Anna");
        friend.birthday = chrono::NaiveDate::from_ymd_opt(1990, 5, 17);
        friend.interactions.push(Interaction::new(
            "call",
            Utc.with_ymd_and_hms(2024, 3, 4, 18, 30, 0).unwrap(),
        ));

        let json = serde_json::to_value(&friend).expect("friend should serialize");
        assert_eq!(json["birthday"], "1990-05-17");
        assert_eq!(json["interactions"][0]["title"], "call");

        let parsed: Friend = serde_json::from_value(json).expect("friend should deserialize");
        assert_eq!(parsed, friend);
    }

    #[test]
    fn validate_friend_id_rejects_path_like_values() {
        assert!(validate_friend_id("0192f6a8-1c2b-7d3e-8f90-123456789abc").is_ok());
        assert!(validate_friend_id("").is_err());
        assert!(validate_friend_id("..").is_err());
        assert!(validate_friend_id("a/b").is_err());
        assert!(validate_friend_id("a\\b").is_err());
    }
}
