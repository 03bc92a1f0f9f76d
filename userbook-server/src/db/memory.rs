//! In-process user store
//!
//! Mirrors the Postgres store's semantics (left join, date typing, not-found
//! checks) over two maps behind one async mutex. Each operation holds the
//! lock for its whole duration and validates before mutating, so writes are
//! all-or-nothing like a committed transaction.
//!
//! Birthdates are accepted only as ISO `YYYY-MM-DD`. Postgres' `::date` cast
//! also takes other input styles (`Jan 1 1990`, `1990/01/01`), which this
//! store rejects as invalid.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::db::{DbError, UserFilter, UserStore};
use crate::models::{AddressInput, NewUser, Paginated, Pagination, UserId, UserRow, UserUpdate};

#[derive(Debug, Clone, Default)]
struct StoredUser {
    firstname: Option<String>,
    lastname: Option<String>,
    birthdate: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
struct StoredAddress {
    user_id: UserId,
    fields: AddressInput,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, StoredUser>,
    addresses: BTreeMap<i32, StoredAddress>,
    last_user_id: UserId,
    last_address_id: i32,
}

impl Tables {
    fn insert_address(&mut self, user_id: UserId, fields: AddressInput) {
        self.last_address_id += 1;
        self.addresses
            .insert(self.last_address_id, StoredAddress { user_id, fields });
    }

    fn addresses_of(&self, user_id: UserId) -> impl Iterator<Item = &StoredAddress> {
        self.addresses
            .values()
            .filter(move |address| address.user_id == user_id)
    }
}

/// User store kept in memory; cloning shares the same tables
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Number of address rows referencing `user_id`.
    pub async fn address_count(&self, user_id: UserId) -> usize {
        self.tables.lock().await.addresses_of(user_id).count()
    }
}

/// Parse a birthdate the way a `DATE` column would accept it.
fn parse_birthdate(value: Option<&str>) -> Result<Option<NaiveDate>, DbError> {
    value
        .map(|text| {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| DbError::Invalid {
                field: "birthdate",
                reason: format!("'{text}' is not a date: {e}"),
            })
        })
        .transpose()
}

fn merge(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(
        &self,
        filter: &UserFilter,
        page: Pagination,
    ) -> Result<Paginated<UserRow>, DbError> {
        let tables = self.tables.lock().await;

        let matching: Vec<(&UserId, &StoredUser)> = tables
            .users
            .iter()
            .filter(|(id, user)| filter.matches(**id, user.firstname.as_deref()))
            .collect();
        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);

        let rows = matching.into_iter().flat_map(|(&id, user)| {
            let row = UserRow {
                id,
                firstname: user.firstname.clone(),
                lastname: user.lastname.clone(),
                birthdate: user.birthdate,
                street: None,
                city: None,
                province: None,
                postal_code: None,
            };
            let joined: Vec<UserRow> = tables
                .addresses_of(id)
                .map(|address| UserRow {
                    street: address.fields.street.clone(),
                    city: address.fields.city.clone(),
                    province: address.fields.province.clone(),
                    postal_code: address.fields.postal_code.clone(),
                    ..row.clone()
                })
                .collect();
            if joined.is_empty() {
                vec![row]
            } else {
                joined
            }
        });

        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let items = rows.skip(skip).take(take).collect();

        Ok(Paginated {
            items,
            total,
            page: page.page,
        })
    }

    async fn create(&self, user: &NewUser) -> Result<UserId, DbError> {
        let birthdate = parse_birthdate(user.birthdate())?;
        let mut tables = self.tables.lock().await;

        tables.last_user_id += 1;
        let id = tables.last_user_id;
        tables.users.insert(
            id,
            StoredUser {
                firstname: user.firstname.clone(),
                lastname: user.lastname.clone(),
                birthdate,
            },
        );

        if user.address.has_content() {
            tables.insert_address(id, user.address.clone());
        }

        tracing::info!(user_id = id, "Created user");
        Ok(id)
    }

    async fn update(&self, id: UserId, changes: &UserUpdate) -> Result<(), DbError> {
        let mut tables = self.tables.lock().await;

        if !tables.users.contains_key(&id) {
            return Err(DbError::user_not_found(id));
        }
        let birthdate = changes.birthdate().map(parse_birthdate).transpose()?;

        if let Some(user) = tables.users.get_mut(&id) {
            merge(&mut user.firstname, &changes.firstname);
            merge(&mut user.lastname, &changes.lastname);
            if let Some(birthdate) = birthdate {
                user.birthdate = birthdate;
            }
        }

        if let Some(address) = &changes.address {
            let mut updated = false;
            for stored in tables.addresses.values_mut().filter(|a| a.user_id == id) {
                merge(&mut stored.fields.street, &address.street);
                merge(&mut stored.fields.city, &address.city);
                merge(&mut stored.fields.province, &address.province);
                merge(&mut stored.fields.postal_code, &address.postal_code);
                updated = true;
            }
            if !updated {
                tables.insert_address(id, address.clone());
            }
        }

        tracing::info!(user_id = id, address = changes.address.is_some(), "Updated user");
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), DbError> {
        let mut tables = self.tables.lock().await;

        if tables.users.remove(&id).is_none() {
            return Err(DbError::user_not_found(id));
        }
        let before = tables.addresses.len();
        tables.addresses.retain(|_, address| address.user_id != id);

        tracing::info!(
            user_id = id,
            addresses = before - tables.addresses.len(),
            "Deleted user"
        );
        Ok(())
    }
}
