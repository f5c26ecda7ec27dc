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

/// Parameters that make an `issue_voucher` request replay-safe; carried
/// alongside `request_id` through the Audit Log.
#[derive(Debug, Clone)]
pub struct IssueParams {
    pub operator: String,
    pub denomination: String,
    pub transaction_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueResponse {
    pub voucher: String,
}

/// A single `{operator, denomination, voucher}` row from an import
/// payload. Column-name casing is normalized to lowercase by the
/// Gateway before these reach the Voucher Pool (spec.md S4.3); values
/// are passed through unchanged.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportResponse {
    pub imported: bool,
}

#[derive(Debug, Clone)]
pub struct ExportParams {
    pub count: Option<u32>,
    pub operators: Option<Vec<String>>,
    pub denominations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedVoucher {
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportResponse {
    pub vouchers: Vec<ExportedVoucher>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoucherCount {
    pub operator: String,
    pub denomination: String,
    pub used: bool,
    pub count: i64,
}

/// External representation of an audit record (spec.md S4.3): `error`
/// is an empty string on success, `created_at` is a stable ISO-8601
/// string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub request_id: String,
    pub transaction_id: String,
    pub user_id: String,
    pub request_data: serde_json::Value,
    pub response_data: serde_json::Value,
    pub error: String,
    pub created_at: String,
}

/// Which column an audit query is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditQueryField {
    RequestId,
    TransactionId,
    UserId,
}

impl AuditQueryField {
    pub fn parse(field: &str) -> Option<AuditQueryField> {
        match field {
            "request_id" => Some(AuditQueryField::RequestId),
            "transaction_id" => Some(AuditQueryField::TransactionId),
            "user_id" => Some(AuditQueryField::UserId),
            _ => None,
        }
    }
}
