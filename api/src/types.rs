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

//! Wire-level request/response bodies for the HTTP gateway. These types
//! own JSON (de)serialization only — all domain validation happens in
//! [`voucher_pool`].

use serde::{Deserialize, Serialize};
use voucher_pool::{AuditRecord, ExportedVoucher, VoucherCount};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueRequest {
    pub transaction_id: String,
    pub user_id: String,
    pub denomination: String,
}

#[derive(Debug, Serialize)]
pub struct IssueResponseBody {
    pub voucher: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponseBody {
    pub results: Vec<AuditRecord>,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportRequest {
    pub count: Option<u32>,
    pub operators: Option<Vec<String>>,
    pub denominations: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponseBody {
    pub vouchers: Vec<ExportedVoucher>,
    pub warnings: Vec<String>,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct VoucherCountsResponseBody {
    pub voucher_counts: Vec<VoucherCount>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponseBody {
    pub imported: bool,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub request_id: Option<String>,
    pub error: String,
}
