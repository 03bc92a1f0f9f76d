//! User and address records

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity of a user row (`users.id`)
pub type UserId = i32;

/// Address fields as submitted by the form UI.
///
/// Every field is optional; a missing or `null` field is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

impl AddressInput {
    /// True when at least one field holds a non-empty value.
    pub fn has_content(&self) -> bool {
        [&self.street, &self.city, &self.province, &self.postal_code]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }
}

/// A user to insert. The create body carries the address fields flat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub birthdate: Option<String>,
    #[serde(flatten)]
    pub address: AddressInput,
}

impl NewUser {
    /// Birthdate text, with an empty string read as "no date".
    pub fn birthdate(&self) -> Option<&str> {
        non_empty(&self.birthdate)
    }
}

/// Replacement values for an existing user.
///
/// Absent or `null` names keep their stored value. `birthdate` is
/// tri-state: absent keeps it, `null` or `""` clears it, a date sets it.
/// `address: None` leaves the user's address row alone; `Some` updates it
/// in place or creates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub birthdate: Option<Option<String>>,
    pub address: Option<AddressInput>,
}

impl UserUpdate {
    /// `None` when the birthdate is left alone, `Some(None)` when it is
    /// cleared, `Some(Some(text))` when it is replaced.
    pub fn birthdate(&self) -> Option<Option<&str>> {
        self.birthdate.as_ref().map(non_empty)
    }
}

/// One listing row: a user left-joined with its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRow {
    pub id: UserId,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Deserialize a field that distinguishes "absent" (`None`, via
/// `#[serde(default)]`) from an explicit `null` (`Some(None)`).
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialize an optional user id sent either as a JSON number or as a
/// numeric string (the edit form echoes the id from its query string).
/// A blank string counts as absent.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(n)) => UserId::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("user id {n} out of range"))),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid user id '{s}'"))),
    }
}
