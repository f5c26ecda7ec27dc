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

//! The Voucher Pool (spec.md S4.3): the per-pool domain object that
//! composes [`voucher_store`] and [`voucher_audit`] into the five
//! externally visible operations, enforcing every idempotency,
//! concurrency and audit invariant spec.md describes.
//!
//! A `VoucherPool` is a transient handle scoped to a single logical
//! operation — it carries no state of its own beyond the pool's name;
//! everything durable lives in the Store (spec.md S3).

mod error;
mod fingerprint;
mod types;

pub use error::PoolError;
pub use types::{
    AuditQueryField, AuditRecord, ExportParams, ExportResponse, ExportedVoucher, ImportResponse,
    ImportRow, IssueParams, IssueResponse, VoucherCount,
};

use serde_json::json;
use voucher_audit::{self as audit, AuditDecision};
use voucher_store::{self as store, NewVoucher, Store};

/// Handle to a single named pool. Cheap to construct; holds a clone of
/// the shared [`Store`] connection pool.
pub struct VoucherPool {
    store: Store,
    name: String,
}

impl VoucherPool {
    pub fn new(store: Store, name: impl Into<String>) -> VoucherPool {
        VoucherPool {
            store,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically issues one unused voucher for `(operator,
    /// denomination)`. Replay-safe and idempotent under `request_id`.
    pub async fn issue_voucher(
        &self,
        request_id: &str,
        params: IssueParams,
    ) -> Result<IssueResponse, PoolError> {
        if !store::pool_exists(self.store.pool(), &self.name).await? {
            return Err(PoolError::NoVoucherPool);
        }

        let fp = fingerprint::issue(&params.operator, &params.denomination);
        let request_data = json!({
            "operator": params.operator,
            "denomination": params.denomination,
        })
        .to_string();

        let mut tx = self.store.begin().await?;
        let decision = audit::open(
            &mut tx,
            &self.name,
            request_id,
            &params.transaction_id,
            &params.user_id,
            &fp,
            &request_data,
        )
        .await?;

        let replay = match decision {
            AuditDecision::Replay(record) => Some(record),
            AuditDecision::Proceed => None,
        };

        if let Some(record) = replay {
            return replayed(record);
        }

        match store::claim_voucher(&mut *tx, &self.name, &params.operator, &params.denomination)
            .await
        {
            Ok(row) => {
                let response = IssueResponse {
                    voucher: row.voucher,
                };
                audit::record_success(&mut tx, &self.name, request_id, &response).await?;
                tx.commit().await.map_err(store::StoreError::from)?;
                Ok(response)
            }
            Err(store::StoreError::NoVoucherAvailable) => {
                audit::record_audited_error(
                    &mut tx,
                    &self.name,
                    request_id,
                    "No voucher available.",
                )
                .await?;
                tx.commit().await.map_err(store::StoreError::from)?;
                Err(PoolError::NoVoucherAvailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bulk-imports `rows`. All rows are persisted, or none are.
    pub async fn import_vouchers(
        &self,
        request_id: &str,
        content_md5: &str,
        rows: Vec<ImportRow>,
    ) -> Result<ImportResponse, PoolError> {
        let fp = fingerprint::import(content_md5);
        let request_data = json!({ "content_md5": content_md5 }).to_string();

        let mut tx = self.store.begin().await?;
        // import carries no transaction_id/user_id of its own (spec.md S6);
        // leave those columns empty rather than aliasing request_id into
        // them, which would make every import spuriously match an
        // unrelated request's transaction_id/user_id audit query.
        let decision = audit::open(&mut tx, &self.name, request_id, "", "", &fp, &request_data)
            .await?;

        if let AuditDecision::Replay(record) = decision {
            return replayed(record);
        }

        store::touch_pool(&mut *tx, &self.name).await?;
        let new_rows: Vec<NewVoucher> = rows
            .into_iter()
            .map(|r| NewVoucher {
                operator: r.operator,
                denomination: r.denomination,
                voucher: r.voucher,
            })
            .collect();

        match store::insert_vouchers(&mut tx, &self.name, &new_rows).await {
            Ok(()) => {
                let response = ImportResponse { imported: true };
                audit::record_success(&mut tx, &self.name, request_id, &response).await?;
                tx.commit().await.map_err(store::StoreError::from)?;
                Ok(response)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically claims up to `count` unused vouchers (optionally
    /// filtered) and marks them used in the same transaction that reads
    /// them.
    pub async fn export_vouchers(
        &self,
        request_id: &str,
        params: ExportParams,
    ) -> Result<ExportResponse, PoolError> {
        if !store::pool_exists(self.store.pool(), &self.name).await? {
            return Err(PoolError::NoVoucherPool);
        }

        let fp = fingerprint::export(
            params.count,
            params.operators.as_deref(),
            params.denominations.as_deref(),
        );
        let request_data = json!({
            "count": params.count,
            "operators": params.operators,
            "denominations": params.denominations,
        })
        .to_string();

        let mut tx = self.store.begin().await?;
        // export carries no transaction_id/user_id of its own (spec.md S6);
        // same reasoning as import_vouchers above.
        let decision = audit::open(&mut tx, &self.name, request_id, "", "", &fp, &request_data)
            .await?;

        if let AuditDecision::Replay(record) = decision {
            return replayed(record);
        }

        let result = match params.count {
            Some(count) => {
                store::claim_many(
                    &mut tx,
                    &self.name,
                    count,
                    params.operators.as_deref(),
                    params.denominations.as_deref(),
                )
                .await
            }
            None => store::claim_all(
                &mut tx,
                &self.name,
                params.operators.as_deref(),
                params.denominations.as_deref(),
            )
            .await
            .map(|rows| (rows, Vec::new())),
        };

        match result {
            Ok((rows, shortfalls)) => {
                let vouchers = rows
                    .into_iter()
                    .map(|r| ExportedVoucher {
                        operator: r.operator,
                        denomination: r.denomination,
                        voucher: r.voucher,
                    })
                    .collect();
                let warnings = shortfalls
                    .into_iter()
                    .map(|s| {
                        format!(
                            "Requested {} vouchers for operator '{}' denomination '{}' but only {} were available.",
                            s.requested, s.operator, s.denomination, s.available
                        )
                    })
                    .collect();
                let response = ExportResponse { vouchers, warnings };
                audit::record_success(&mut tx, &self.name, request_id, &response).await?;
                tx.commit().await.map_err(store::StoreError::from)?;
                Ok(response)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read-only inventory grouping. Not audited.
    pub async fn count_vouchers(&self) -> Result<Vec<VoucherCount>, PoolError> {
        if !store::pool_exists(self.store.pool(), &self.name).await? {
            return Err(PoolError::NoVoucherPool);
        }
        let rows = store::count_vouchers(self.store.pool(), &self.name).await?;
        Ok(rows
            .into_iter()
            .map(|r| VoucherCount {
                operator: r.operator,
                denomination: r.denomination,
                used: r.used,
                count: r.count,
            })
            .collect())
    }

    /// Read-only audit lookup. Not audited itself.
    pub async fn query_audit(
        &self,
        field: AuditQueryField,
        value: &str,
    ) -> Result<Vec<AuditRecord>, PoolError> {
        let store_field = match field {
            AuditQueryField::RequestId => store::AuditField::RequestId,
            AuditQueryField::TransactionId => store::AuditField::TransactionId,
            AuditQueryField::UserId => store::AuditField::UserId,
        };
        let rows = store::query_audit(self.store.pool(), &self.name, store_field, value).await?;
        rows.into_iter().map(external_audit_record).collect()
    }
}

/// Turns a replayed Store-level audit row back into the operation's
/// original response (or re-raises its original error), exactly as
/// recorded — byte-identical on repeat per spec.md S8.
fn replayed<T: serde::de::DeserializeOwned>(
    record: voucher_store::AuditRecordRow,
) -> Result<T, PoolError> {
    if let Some(error) = record.error {
        return Err(match error.as_str() {
            "No voucher available." => PoolError::NoVoucherAvailable,
            other => PoolError::Internal(other.to_string().into()),
        });
    }
    let response_data = record
        .response_data
        .expect("a record with no error must carry a recorded response");
    serde_json::from_str(&response_data).map_err(|e| PoolError::Internal(Box::new(e)))
}

fn external_audit_record(row: voucher_store::AuditRecordRow) -> Result<AuditRecord, PoolError> {
    let request_data: serde_json::Value =
        serde_json::from_str(&row.request_data).map_err(|e| PoolError::Internal(Box::new(e)))?;
    let response_data = match &row.response_data {
        Some(data) => serde_json::from_str(data).map_err(|e| PoolError::Internal(Box::new(e)))?,
        None => serde_json::Value::Null,
    };
    Ok(AuditRecord {
        request_id: row.request_id,
        transaction_id: row.transaction_id,
        user_id: row.user_id,
        request_data,
        response_data,
        error: row.error.unwrap_or_default(),
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool(name: &str) -> VoucherPool {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        VoucherPool::new(store, name)
    }

    async fn import(pool: &VoucherPool, request_id: &str, rows: Vec<(&str, &str, &str)>) {
        let rows = rows
            .into_iter()
            .map(|(o, d, v)| ImportRow {
                operator: o.into(),
                denomination: d.into(),
                voucher: v.into(),
            })
            .collect();
        pool.import_vouchers(request_id, "md5-stub", rows)
            .await
            .unwrap();
    }

    fn issue_params(operator: &str, denomination: &str, t: &str, u: &str) -> IssueParams {
        IssueParams {
            operator: operator.into(),
            denomination: denomination.into(),
            transaction_id: t.into(),
            user_id: u.into(),
        }
    }

    #[tokio::test]
    async fn issue_against_missing_pool_fails() {
        let pool = test_pool("testpool").await;
        let err = pool
            .issue_voucher("req-0", issue_params("Tank", "red", "t0", "u0"))
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::NoVoucherPool));
    }

    #[tokio::test]
    async fn two_issuances_return_distinct_vouchers_then_exhaust() {
        let pool = test_pool("testpool").await;
        import(
            &pool,
            "import-0",
            vec![("Tank", "red", "Tank-red-0"), ("Tank", "red", "Tank-red-1")],
        )
        .await;

        let first = pool
            .issue_voucher("req-0", issue_params("Tank", "red", "t0", "u0"))
            .await
            .unwrap();
        let second = pool
            .issue_voucher("req-1", issue_params("Tank", "red", "t1", "u1"))
            .await
            .unwrap();
        assert_ne!(first.voucher, second.voucher);

        let err = pool
            .issue_voucher("req-2", issue_params("Tank", "red", "t2", "u2"))
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::NoVoucherAvailable));
    }

    #[tokio::test]
    async fn replaying_same_request_id_returns_identical_response() {
        let pool = test_pool("testpool").await;
        import(&pool, "import-0", vec![("Tank", "red", "Tank-red-0")]).await;

        let first = pool
            .issue_voucher("req-0", issue_params("Tank", "red", "t0", "u0"))
            .await
            .unwrap();
        let replay = pool
            .issue_voucher("req-0", issue_params("Tank", "red", "t0", "u0"))
            .await
            .unwrap();
        assert_eq!(first, replay);

        let counts = pool.count_vouchers().await.unwrap();
        let used_count: i64 = counts.iter().filter(|c| c.used).map(|c| c.count).sum();
        assert_eq!(used_count, 1);
    }

    #[tokio::test]
    async fn replaying_with_different_params_is_a_mismatch() {
        let pool = test_pool("testpool").await;
        import(&pool, "import-0", vec![("Tank", "red", "Tank-red-0")]).await;
        pool.issue_voucher("req-0", issue_params("Tank", "red", "t0", "u0"))
            .await
            .unwrap();

        let err = pool
            .issue_voucher("req-0", issue_params("Tank", "blue", "t0", "u0"))
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::AuditMismatch));
    }

    #[tokio::test]
    async fn import_md5_replay_does_not_reinsert() {
        let pool = test_pool("testpool").await;
        let rows = vec![ImportRow {
            operator: "Tank".into(),
            denomination: "red".into(),
            voucher: "Tank-red-0".into(),
        }];
        pool.import_vouchers("req-0", "abc123", rows.clone())
            .await
            .unwrap();
        let replay = pool.import_vouchers("req-0", "abc123", rows).await.unwrap();
        assert!(replay.imported);

        let counts = pool.count_vouchers().await.unwrap();
        let total: i64 = counts.iter().map(|c| c.count).sum();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn export_completeness_matches_requested_total() {
        let pool = test_pool("testpool").await;
        import(
            &pool,
            "import-0",
            vec![("Tank", "red", "v0"), ("Tank", "red", "v1")],
        )
        .await;

        let response = pool
            .export_vouchers(
                "req-0",
                ExportParams {
                    count: Some(5),
                    operators: Some(vec!["Tank".into()]),
                    denominations: Some(vec!["red".into()]),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.vouchers.len(), 2);
        assert_eq!(response.warnings.len(), 1);
    }
}
