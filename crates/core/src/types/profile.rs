//! Local-only customer profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Email;

/// The signed-in customer, stored only in local storage.
///
/// There is no server-side account; the profile prefills checkout fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: Email,
    /// When the profile was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    /// When the profile was last edited.
    #[serde(
        default,
        rename = "updatedAt",
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// The first word of the name, or `there` if the name is blank.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }
}
