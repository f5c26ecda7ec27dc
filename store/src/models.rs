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

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single voucher row, as persisted in the `vouchers` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VoucherRow {
    pub pool: String,
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
    pub used: bool,
    pub created_at: String,
}

/// A single row to insert via `insert_vouchers`. Keys are normalized to
/// lowercase by the caller before reaching the Store (spec.md S4.3).
#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
}

/// `(operator, denomination, used) -> count` grouping returned by
/// `count_vouchers`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VoucherCountRow {
    pub operator: String,
    pub denomination: String,
    pub used: bool,
    pub count: i64,
}

/// An audit record as persisted in the `audit_records` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditRecordRow {
    pub request_id: String,
    pub transaction_id: String,
    pub user_id: String,
    pub fingerprint: String,
    pub request_data: String,
    pub response_data: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
}

/// A new audit record to insert before the side effect it records runs.
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub request_id: String,
    pub transaction_id: String,
    pub user_id: String,
    pub fingerprint: String,
    pub request_data: String,
}

/// The column an audit query is restricted to (spec.md S4.1, S6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditField {
    RequestId,
    TransactionId,
    UserId,
}

impl AuditField {
    pub fn parse(field: &str) -> Option<AuditField> {
        match field {
            "request_id" => Some(AuditField::RequestId),
            "transaction_id" => Some(AuditField::TransactionId),
            "user_id" => Some(AuditField::UserId),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            AuditField::RequestId => "request_id",
            AuditField::TransactionId => "transaction_id",
            AuditField::UserId => "user_id",
        }
    }
}

impl std::fmt::Display for AuditField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Per-(operator, denomination) shortfall reported by `claim_many` when
/// fewer vouchers were available than requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortfall {
    pub operator: String,
    pub denomination: String,
    pub requested: u32,
    pub available: u32,
}
