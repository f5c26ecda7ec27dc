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

use thiserror::Error;

/// Errors returned by the [`crate::Store`] primitives. Never leaks a
/// provider-specific code past this boundary (spec.md S7).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("voucher already exists for this pool/operator/denomination")]
    DuplicateVoucher,

    #[error("no matching unused voucher available")]
    NoVoucherAvailable,

    #[error("request_id already used for this pool")]
    DuplicateRequest,

    #[error(transparent)]
    Backend(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
