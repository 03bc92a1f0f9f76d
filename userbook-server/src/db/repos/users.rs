//! User repository backed by Postgres
//!
//! Handles user CRUD with:
//! - Atomic creation with optional address (transaction)
//! - User row locked (FOR UPDATE) before any update/upsert or deletion
//! - Address-then-user deletion inside one transaction

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::db::{DbError, UserFilter, UserStore};
use crate::models::{AddressInput, NewUser, Paginated, Pagination, UserId, UserRow, UserUpdate};

const SELECT_ROWS: &str = r#"
    SELECT
        u.id,
        u.firstname,
        u.lastname,
        u.birthdate,
        a.street,
        a.city,
        a.province,
        a.postal_code
    FROM users u
    LEFT JOIN addresses a ON a.user_id = u.id"#;

const COUNT_USERS: &str = "SELECT COUNT(*) FROM users u";

/// User store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(
        &self,
        filter: &UserFilter,
        page: Pagination,
    ) -> Result<Paginated<UserRow>, DbError> {
        let mut rows_query = QueryBuilder::<Postgres>::new(SELECT_ROWS);
        filter.push_where(&mut rows_query);
        rows_query
            .push(" ORDER BY u.id, a.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        tracing::debug!(sql = rows_query.sql(), page = page.page, "Listing users");
        let items: Vec<UserRow> = rows_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut count_query = QueryBuilder::<Postgres>::new(COUNT_USERS);
        filter.push_where(&mut count_query);
        let (total,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&self.pool)
            .await?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
        })
    }

    async fn create(&self, user: &NewUser) -> Result<UserId, DbError> {
        let mut tx = self.pool.begin().await?;

        // RETURNING is scoped to this statement, so concurrent creators
        // can never observe each other's id
        let id: UserId = sqlx::query_scalar(
            r#"
            INSERT INTO users (firstname, lastname, birthdate)
            VALUES ($1, $2, $3::date)
            RETURNING id
            "#,
        )
        .bind(user.firstname.as_deref())
        .bind(user.lastname.as_deref())
        .bind(user.birthdate())
        .fetch_one(&mut *tx)
        .await?;

        if user.address.has_content() {
            insert_address(&mut tx, id, &user.address).await?;
        }

        tx.commit().await?;
        tracing::info!(user_id = id, "Created user");
        Ok(id)
    }

    async fn update(&self, id: UserId, changes: &UserUpdate) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, id).await?;

        sqlx::query(
            r#"
            UPDATE users SET
                firstname = COALESCE($2, firstname),
                lastname = COALESCE($3, lastname),
                birthdate = CASE WHEN $4 THEN $5::date ELSE birthdate END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.firstname.as_deref())
        .bind(changes.lastname.as_deref())
        .bind(changes.birthdate().is_some())
        .bind(changes.birthdate().flatten())
        .execute(&mut *tx)
        .await?;

        if let Some(address) = &changes.address {
            let existing: Option<i32> = sqlx::query_scalar(
                "SELECT id FROM addresses WHERE user_id = $1 ORDER BY id LIMIT 1",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            if existing.is_some() {
                sqlx::query(
                    r#"
                    UPDATE addresses SET
                        street = COALESCE($2, street),
                        city = COALESCE($3, city),
                        province = COALESCE($4, province),
                        postal_code = COALESCE($5, postal_code)
                    WHERE user_id = $1
                    "#,
                )
                .bind(id)
                .bind(address.street.as_deref())
                .bind(address.city.as_deref())
                .bind(address.province.as_deref())
                .bind(address.postal_code.as_deref())
                .execute(&mut *tx)
                .await?;
            } else {
                insert_address(&mut tx, id, address).await?;
            }
        }

        tx.commit().await?;
        tracing::info!(user_id = id, address = changes.address.is_some(), "Updated user");
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, id).await?;

        let removed = sqlx::query("DELETE FROM addresses WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(user_id = id, addresses = removed, "Deleted user");
        Ok(())
    }
}

/// Lock the user row for the rest of the transaction.
///
/// Concurrent update/delete of the same user queue here, so an address can
/// never be written for a user another transaction is deleting.
async fn lock_user(conn: &mut PgConnection, id: UserId) -> Result<(), DbError> {
    let locked: Option<UserId> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    locked.map(|_| ()).ok_or_else(|| DbError::user_not_found(id))
}

async fn insert_address(
    conn: &mut PgConnection,
    user_id: UserId,
    address: &AddressInput,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO addresses (user_id, street, city, province, postal_code)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(address.street.as_deref())
    .bind(address.city.as_deref())
    .bind(address.province.as_deref())
    .bind(address.postal_code.as_deref())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, schema};

    // Integration tests - run with DATABASE_URL set
    // cargo test -p userbook-server -- --ignored

    async fn store() -> PgUserStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        schema::ensure(&pool).await.expect("schema failed");
        PgUserStore::new(pool)
    }

    async fn address_count(store: &PgUserStore, id: UserId) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
            .bind(id)
            .fetch_one(store.pool())
            .await
            .expect("count failed");
        count
    }

    fn ana() -> NewUser {
        NewUser {
            firstname: Some("Ana".into()),
            lastname: Some("Putri".into()),
            birthdate: Some("1990-01-01".into()),
            address: AddressInput::default(),
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_returns_inserted_id() {
        let store = store().await;
        let id = store.create(&ana()).await.expect("create failed");

        let page = store
            .list(&UserFilter::new().with_id(id), Pagination::default())
            .await
            .expect("list failed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, id);
        assert_eq!(page.items[0].street, None);
        assert_eq!(address_count(&store, id).await, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_rolls_back_when_address_fails() {
        let store = store().await;
        let mut user = ana();
        user.firstname = Some("RollbackMarker".into());
        // postal_code is VARCHAR(20)
        user.address.postal_code = Some("x".repeat(64));

        assert!(store.create(&user).await.is_err());

        let page = store
            .list(
                &UserFilter::new().with_name_containing("RollbackMarker"),
                Pagination::default(),
            )
            .await
            .expect("list failed");
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_upserts_single_address() {
        let store = store().await;
        let id = store.create(&ana()).await.expect("create failed");
        let changes = UserUpdate {
            address: Some(AddressInput {
                street: Some("Jl. A".into()),
                city: Some("Jakarta".into()),
                province: Some("DKI".into()),
                postal_code: Some("12345".into()),
            }),
            ..UserUpdate::default()
        };

        store.update(id, &changes).await.expect("first update failed");
        store.update(id, &changes).await.expect("second update failed");
        assert_eq!(address_count(&store, id).await, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_clears_birthdate_only_when_sent() {
        let store = store().await;
        let id = store.create(&ana()).await.expect("create failed");
        let birthdate = |page: Paginated<UserRow>| page.items[0].birthdate;
        let by_id = UserFilter::new().with_id(id);

        let rename = UserUpdate {
            firstname: Some("Ani".into()),
            ..UserUpdate::default()
        };
        store.update(id, &rename).await.expect("rename failed");
        let page = store.list(&by_id, Pagination::default()).await.expect("list failed");
        assert!(birthdate(page).is_some());

        let clear = UserUpdate {
            birthdate: Some(None),
            ..UserUpdate::default()
        };
        store.update(id, &clear).await.expect("clear failed");
        let page = store.list(&by_id, Pagination::default()).await.expect("list failed");
        assert_eq!(birthdate(page), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires database"]
    async fn concurrent_update_and_delete_leave_no_orphan_address() {
        let store = store().await;
        let with_city = UserUpdate {
            address: Some(AddressInput {
                city: Some("Surabaya".into()),
                ..AddressInput::default()
            }),
            ..UserUpdate::default()
        };

        for _ in 0..50 {
            let id = store.create(&ana()).await.expect("create failed");
            let (updated, deleted) = tokio::join!(
                store.update(id, &with_city),
                store.delete(id)
            );
            deleted.expect("delete failed");
            // Update either ran first or saw the user gone
            if let Err(e) = updated {
                assert!(matches!(e, DbError::NotFound { .. }), "unexpected error: {e}");
            }
            assert_eq!(address_count(&store, id).await, 0);
        }

        let (orphans,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM addresses a WHERE NOT EXISTS (SELECT 1 FROM users u WHERE u.id = a.user_id)",
        )
        .fetch_one(store.pool())
        .await
        .expect("orphan count failed");
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_removes_address() {
        let store = store().await;
        let mut user = ana();
        user.address.city = Some("Bandung".into());
        let id = store.create(&user).await.expect("create failed");

        store.delete(id).await.expect("delete failed");
        assert_eq!(address_count(&store, id).await, 0);
        assert!(matches!(
            store.delete(id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
