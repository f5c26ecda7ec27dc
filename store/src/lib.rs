// Copyright 2026 The Airtime Voucher Service Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Relational persistence layer (spec.md S4.1): connection/transaction
//! management plus the handful of primitives the Voucher Pool composes
//! into idempotent, concurrency-safe operations.
//!
//! Backed by SQLite through `sqlx`, in line with the "single writer over
//! a relational store" scope spec.md S1 assumes — SQLite's serialized
//! writer gives the same atomic-claim guarantee a `SELECT ... FOR UPDATE
//! SKIP LOCKED` would under Postgres, without requiring an external
//! database process for tests.

mod error;
mod models;

pub use error::StoreError;
pub use models::{
    AuditField, AuditRecordRow, NewAuditRecord, NewVoucher, Shortfall, VoucherCountRow, VoucherRow,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Handle to the backing database. Cheap to clone (wraps a connection
/// pool); one `Store` is built at process startup and shared across
/// requests.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens the database and runs embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Store, StoreError> {
        Store::connect_with_timeout(database_url, None).await
    }

    /// Opens the database and runs embedded migrations, applying
    /// `statement_timeout` as SQLite's per-connection busy timeout
    /// (spec.md S5: "implementations SHOULD enforce a connection-level
    /// statement timeout") — the closest SQLite primitive to a Postgres
    /// `statement_timeout`, since it is the only point at which a
    /// connection ever blocks waiting on another writer.
    pub async fn connect_with_timeout(
        database_url: &str,
        statement_timeout: Option<std::time::Duration>,
    ) -> Result<Store, StoreError> {
        let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        if let Some(timeout) = statement_timeout {
            options = options.busy_timeout(timeout);
        }
        let pool = SqlitePoolOptions::new()
            // SQLite serializes writers regardless; one connection keeps
            // "claim" races honest without relying on busy-retry.
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Store { pool })
    }

    /// Begins a new transaction. Every mutating Voucher Pool operation
    /// runs its audit insert, state mutation and audit-outcome update
    /// inside exactly one of these (spec.md S5).
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

/// Bulk-inserts `rows` into `pool`. Aborts (and the caller's transaction
/// rolls back) on the first collision with an existing
/// `(pool, operator, denomination, voucher)` triple.
pub async fn insert_vouchers(
    tx: &mut Transaction<'_, Sqlite>,
    pool: &str,
    rows: &[NewVoucher],
) -> Result<(), StoreError> {
    for row in rows {
        let result = sqlx::query(
            "INSERT INTO vouchers (pool, operator, denomination, voucher) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(pool)
        .bind(&row.operator)
        .bind(&row.denomination)
        .bind(&row.voucher)
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(StoreError::DuplicateVoucher),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Atomically claims exactly one unused voucher matching `(pool,
/// operator, denomination)`. Safe under concurrent callers: the
/// `UPDATE ... WHERE id = (SELECT ...) RETURNING` form is a single
/// statement, so two concurrent claims against the same predicate can
/// never observe and update the same row.
pub async fn claim_voucher<'e, E>(
    executor: E,
    pool: &str,
    operator: &str,
    denomination: &str,
) -> Result<VoucherRow, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, VoucherRow>(
        r#"
        UPDATE vouchers
        SET used = 1
        WHERE id = (
            SELECT id FROM vouchers
            WHERE pool = ?1 AND operator = ?2 AND denomination = ?3 AND used = 0
            ORDER BY id
            LIMIT 1
        )
        RETURNING pool, operator, denomination, voucher, used, created_at
        "#,
    )
    .bind(pool)
    .bind(operator)
    .bind(denomination)
    .fetch_optional(executor)
    .await?;

    row.ok_or(StoreError::NoVoucherAvailable)
}

/// Atomically claims up to `count` unused vouchers for each
/// `(operator, denomination)` pair in the cross product of `operators`
/// and `denominations` (each defaulting to every value currently present
/// among unused vouchers in the pool when omitted). Returns the claimed
/// rows plus, for each pair that came up short, how many of `count`
/// could not be supplied.
pub async fn claim_many(
    tx: &mut Transaction<'_, Sqlite>,
    pool: &str,
    count: u32,
    operators: Option<&[String]>,
    denominations: Option<&[String]>,
) -> Result<(Vec<VoucherRow>, Vec<Shortfall>), StoreError> {
    let effective_operators = match operators {
        Some(ops) if !ops.is_empty() => ops.iter().cloned().collect::<BTreeSet<_>>(),
        _ => distinct_column(&mut **tx, pool, "operator").await?,
    };
    let effective_denominations = match denominations {
        Some(denoms) if !denoms.is_empty() => denoms.iter().cloned().collect::<BTreeSet<_>>(),
        _ => distinct_column(&mut **tx, pool, "denomination").await?,
    };

    let mut claimed = Vec::new();
    let mut shortfalls = Vec::new();

    for operator in &effective_operators {
        for denomination in &effective_denominations {
            let mut available_for_pair = 0u32;
            for _ in 0..count {
                match claim_voucher(&mut **tx, pool, operator, denomination).await {
                    Ok(row) => {
                        claimed.push(row);
                        available_for_pair += 1;
                    }
                    Err(StoreError::NoVoucherAvailable) => break,
                    Err(e) => return Err(e),
                }
            }
            if available_for_pair < count {
                shortfalls.push(Shortfall {
                    operator: operator.clone(),
                    denomination: denomination.clone(),
                    requested: count,
                    available: available_for_pair,
                });
            }
        }
    }

    Ok((claimed, shortfalls))
}

/// Claims every unused voucher matching the (optionally filtered) cross
/// product, with no per-pair cap. Used when `export_vouchers` is called
/// without a `count`.
pub async fn claim_all(
    tx: &mut Transaction<'_, Sqlite>,
    pool: &str,
    operators: Option<&[String]>,
    denominations: Option<&[String]>,
) -> Result<Vec<VoucherRow>, StoreError> {
    let mut query = String::from("UPDATE vouchers SET used = 1 WHERE pool = ?1 AND used = 0");
    let mut binds: Vec<String> = Vec::new();
    if let Some(ops) = operators.filter(|o| !o.is_empty()) {
        query.push_str(&format!(
            " AND operator IN ({})",
            placeholders(binds.len() + 2, ops.len())
        ));
        binds.extend(ops.iter().cloned());
    }
    if let Some(denoms) = denominations.filter(|d| !d.is_empty()) {
        query.push_str(&format!(
            " AND denomination IN ({})",
            placeholders(binds.len() + 2, denoms.len())
        ));
        binds.extend(denoms.iter().cloned());
    }
    query.push_str(" RETURNING pool, operator, denomination, voucher, used, created_at");

    let mut q = sqlx::query_as::<_, VoucherRow>(&query).bind(pool);
    for b in &binds {
        q = q.bind(b);
    }
    Ok(q.fetch_all(&mut **tx).await?)
}

fn placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn distinct_column<'e, E>(
    executor: E,
    pool: &str,
    column: &str,
) -> Result<BTreeSet<String>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    // `column` is only ever "operator" or "denomination", both fixed
    // literals from call sites above — never caller-controlled input.
    let query = format!("SELECT DISTINCT {column} FROM vouchers WHERE pool = ?1 AND used = 0");
    let values: Vec<(String,)> = sqlx::query_as(&query)
        .bind(pool)
        .fetch_all(executor)
        .await?;
    Ok(values.into_iter().map(|(v,)| v).collect())
}

/// Returns the `(operator, denomination, used) -> count` grouping for
/// `pool`. Does not distinguish "pool never imported into" — callers
/// must check `pool_exists` first (spec.md S4.3).
pub async fn count_vouchers<'e, E>(
    executor: E,
    pool: &str,
) -> Result<Vec<VoucherCountRow>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, VoucherCountRow>(
        "SELECT operator, denomination, used, COUNT(*) as count FROM vouchers \
         WHERE pool = ?1 GROUP BY operator, denomination, used",
    )
    .bind(pool)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Inserts a new audit record. Fails with [`StoreError::DuplicateRequest`]
/// if `request_id` already exists for this pool; the caller inspects the
/// existing record via [`find_audit`] to classify replay vs. conflict.
pub async fn insert_audit<'e, E>(
    executor: E,
    pool: &str,
    record: &NewAuditRecord,
) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO audit_records (pool, request_id, transaction_id, user_id, fingerprint, request_data) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(pool)
    .bind(&record.request_id)
    .bind(&record.transaction_id)
    .bind(&record.user_id)
    .bind(&record.fingerprint)
    .bind(&record.request_data)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateRequest),
        Err(e) => Err(e.into()),
    }
}

/// Records the terminal outcome (success or error) of the operation an
/// audit record was opened for.
pub async fn update_audit_outcome<'e, E>(
    executor: E,
    pool: &str,
    request_id: &str,
    response_data: Option<&str>,
    error: Option<&str>,
) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE audit_records SET response_data = ?1, error = ?2 WHERE pool = ?3 AND request_id = ?4",
    )
    .bind(response_data)
    .bind(error)
    .bind(pool)
    .bind(request_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Looks up the audit record for `request_id`, if any. Used to classify
/// a `DuplicateRequest` as replay vs. conflict.
pub async fn find_audit<'e, E>(
    executor: E,
    pool: &str,
    request_id: &str,
) -> Result<Option<AuditRecordRow>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, AuditRecordRow>(
        "SELECT request_id, transaction_id, user_id, fingerprint, request_data, response_data, error, created_at \
         FROM audit_records WHERE pool = ?1 AND request_id = ?2",
    )
    .bind(pool)
    .bind(request_id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Returns every audit record where `field` equals `value`.
pub async fn query_audit<'e, E>(
    executor: E,
    pool: &str,
    field: AuditField,
    value: &str,
) -> Result<Vec<AuditRecordRow>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!(
        "SELECT request_id, transaction_id, user_id, fingerprint, request_data, response_data, error, created_at \
         FROM audit_records WHERE pool = ?1 AND {field} = ?2"
    );
    let rows = sqlx::query_as::<_, AuditRecordRow>(&query)
        .bind(pool)
        .bind(value)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Reports whether any schema/state has been established for `pool`
/// (spec.md S4.1) — true once a successful import has run, even if the
/// pool's inventory is currently empty.
pub async fn pool_exists<'e, E>(executor: E, pool: &str) -> Result<bool, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM pools WHERE name = ?1")
        .bind(pool)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

/// Registers `pool` as having been imported into. Idempotent.
pub async fn touch_pool<'e, E>(executor: E, pool: &str) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT OR IGNORE INTO pools (name) VALUES (?1)")
        .bind(pool)
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn claim_voucher_is_exhausted_after_one_claim() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();
        touch_pool(&mut *tx, "p").await.unwrap();
        insert_vouchers(
            &mut tx,
            "p",
            &[NewVoucher {
                operator: "tank".into(),
                denomination: "red".into(),
                voucher: "v1".into(),
            }],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let claimed = claim_voucher(&mut *tx, "p", "tank", "red").await.unwrap();
        assert_eq!(claimed.voucher, "v1");
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = claim_voucher(&mut *tx, "p", "tank", "red")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoVoucherAvailable));
    }

    #[tokio::test]
    async fn two_concurrent_claims_never_return_the_same_row() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();
        touch_pool(&mut *tx, "p").await.unwrap();
        insert_vouchers(
            &mut tx,
            "p",
            &[
                NewVoucher {
                    operator: "tank".into(),
                    denomination: "red".into(),
                    voucher: "v1".into(),
                },
                NewVoucher {
                    operator: "tank".into(),
                    denomination: "red".into(),
                    voucher: "v2".into(),
                },
            ],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let first = tokio::spawn({
            let store = store.clone();
            async move { claim_voucher(store.pool(), "p", "tank", "red").await }
        });
        let second = tokio::spawn({
            let store = store.clone();
            async move { claim_voucher(store.pool(), "p", "tank", "red").await }
        });

        let claimed_first = first.await.unwrap().unwrap();
        let claimed_second = second.await.unwrap().unwrap();
        assert_ne!(claimed_first.voucher, claimed_second.voucher);
    }

    #[tokio::test]
    async fn duplicate_voucher_insert_fails() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();
        let rows = [NewVoucher {
            operator: "tank".into(),
            denomination: "red".into(),
            voucher: "v1".into(),
        }];
        insert_vouchers(&mut tx, "p", &rows).await.unwrap();
        let err = insert_vouchers(&mut tx, "p", &rows).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateVoucher));
    }

    #[tokio::test]
    async fn duplicate_audit_request_id_is_rejected() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();
        let record = NewAuditRecord {
            request_id: "req-0".into(),
            transaction_id: "t0".into(),
            user_id: "u0".into(),
            fingerprint: "{}".into(),
            request_data: "{}".into(),
        };
        insert_audit(&mut *tx, "p", &record).await.unwrap();
        let err = insert_audit(&mut *tx, "p", &record).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRequest));
    }

    #[tokio::test]
    async fn pool_exists_only_after_touch() {
        let store = test_store().await;
        let mut conn = store.pool().acquire().await.unwrap();
        assert!(!pool_exists(&mut *conn, "p").await.unwrap());
        touch_pool(&mut *conn, "p").await.unwrap();
        assert!(pool_exists(&mut *conn, "p").await.unwrap());
    }
}
