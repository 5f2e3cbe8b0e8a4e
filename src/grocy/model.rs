//! Wire types for the Grocy chores and users endpoints.

use serde::{Deserialize, Deserializer, Serialize};

/// A chore as returned by `GET /chores`.
///
/// Grocy sends `null` for several of these fields when a chore has never been
/// tracked or has nobody assigned, so they are modelled as `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chore {
    pub chore_id: i64,
    pub chore_name: String,
    #[serde(default)]
    pub last_tracked_time: Option<String>,
    #[serde(default, deserialize_with = "bool_from_int")]
    pub track_date_only: bool,
    /// `YYYY-MM-DD HH:MM:SS`, or empty when the chore is unscheduled.
    #[serde(default)]
    pub next_estimated_execution_time: Option<String>,
    #[serde(default)]
    pub next_execution_assigned_to_user_id: Option<i64>,
    #[serde(default, deserialize_with = "bool_from_int")]
    pub is_rescheduled: bool,
    #[serde(default, deserialize_with = "bool_from_int")]
    pub is_reassigned: bool,
    #[serde(default)]
    pub next_execution_assigned_user: Option<User>,
}

impl Chore {
    /// Username of the user the next execution is assigned to, if any.
    pub fn assigned_username(&self) -> Option<&str> {
        self.next_execution_assigned_user
            .as_ref()
            .map(|u| u.username.as_str())
    }

    /// The next execution time, treating an empty string as unscheduled.
    pub fn next_execution(&self) -> Option<&str> {
        self.next_estimated_execution_time
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

/// A user as returned by `GET /users` and embedded in [`Chore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub picture_file_name: Option<String>,
    #[serde(default)]
    pub row_created_timestamp: Option<String>,
}

impl User {
    /// Best human-readable name: display name, then "first last", then username.
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|s| !s.is_empty()) {
            return name.to_string();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

/// Any JSON integer, signed or unsigned.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireInt {
    Signed(i64),
    Unsigned(u64),
}

/// Decode Grocy's 0/1 integer flags. Zero is false, any other integer is true,
/// `null` is false, and anything that is not an integer is rejected.
pub fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<WireInt> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(WireInt::Signed(n)) => n != 0,
        Some(WireInt::Unsigned(n)) => n != 0,
        None => false,
    })
}
