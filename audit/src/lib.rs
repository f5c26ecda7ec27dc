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

//! The Audit Log protocol (spec.md S4.2): end-to-end idempotency for
//! every state-mutating Voucher Pool operation, keyed by a
//! caller-supplied `request_id`.
//!
//! This crate does not know what an "issue" or an "export" is — it only
//! knows how to open an audit row, read one back, and classify a
//! collision as replay or conflict. The Voucher Pool composes this with
//! [`voucher_store`] around each operation's actual side effect.

use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use thiserror::Error;
use voucher_store::{self as store, AuditRecordRow, NewAuditRecord, StoreError};

/// What the caller should do once [`open`] returns.
#[derive(Debug)]
pub enum AuditDecision {
    /// No prior record for this `request_id` — proceed with the
    /// operation, then call [`record_success`] or [`record_audited_error`]
    /// before committing.
    Proceed,
    /// A prior record with a matching fingerprint exists; return its
    /// outcome verbatim without re-running the operation.
    Replay(AuditRecordRow),
}

/// Error surfaced by the Audit Log itself, as opposed to the operation
/// it wraps.
#[derive(Debug, Error)]
pub enum AuditError {
    /// `request_id` was previously used with different semantic inputs.
    #[error("this request id was previously used with different parameters")]
    Mismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Attempts to atomically claim `request_id` for this request's
/// `fingerprint`. Must run inside the same transaction the operation's
/// side effect and the eventual outcome update run in.
pub async fn open(
    tx: &mut Transaction<'_, Sqlite>,
    pool: &str,
    request_id: &str,
    transaction_id: &str,
    user_id: &str,
    fingerprint: &str,
    request_data: &str,
) -> Result<AuditDecision, AuditError> {
    let insert = store::insert_audit(
        &mut **tx,
        pool,
        &NewAuditRecord {
            request_id: request_id.to_string(),
            transaction_id: transaction_id.to_string(),
            user_id: user_id.to_string(),
            fingerprint: fingerprint.to_string(),
            request_data: request_data.to_string(),
        },
    )
    .await;

    match insert {
        Ok(()) => Ok(AuditDecision::Proceed),
        Err(StoreError::DuplicateRequest) => {
            let existing = store::find_audit(&mut **tx, pool, request_id)
                .await?
                .expect("insert collided with a row that must exist");
            if existing.fingerprint != fingerprint {
                return Err(AuditError::Mismatch);
            }
            Ok(AuditDecision::Replay(existing))
        }
        Err(e) => Err(e.into()),
    }
}

/// Serializes `response` and records it as the successful outcome of
/// `request_id`. Caller commits the transaction afterwards.
pub async fn record_success<T: Serialize>(
    tx: &mut Transaction<'_, Sqlite>,
    pool: &str,
    request_id: &str,
    response: &T,
) -> Result<(), AuditError> {
    let response_data = serde_json::to_string(response).map_err(StoreError::from)?;
    store::update_audit_outcome(&mut **tx, pool, request_id, Some(&response_data), None).await?;
    Ok(())
}

/// Records a durable, auditable business-level failure (e.g.
/// `NoVoucherAvailable`) as the outcome of `request_id`. Unlike an
/// aborted operation, this commits: replaying the same request returns
/// the same error forever (spec.md S4.3).
pub async fn record_audited_error(
    tx: &mut Transaction<'_, Sqlite>,
    pool: &str,
    request_id: &str,
    error_message: &str,
) -> Result<(), AuditError> {
    store::update_audit_outcome(&mut **tx, pool, request_id, None, Some(error_message)).await?;
    Ok(())
}
