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
use voucher_audit::AuditError;
use voucher_store::StoreError;

/// The error taxonomy from spec.md S7, translated once at the Gateway
/// boundary into an HTTP response. Nothing downstream of this type ever
/// leaks a provider-specific error code.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("{0}")]
    ParamError(String),

    #[error("Voucher pool does not exist.")]
    NoVoucherPool,

    #[error("This request has already been performed with different parameters.")]
    AuditMismatch,

    /// Not a fault: a normal "nothing matched" outcome. Still reported
    /// as an error-shaped payload so the Gateway can apply the HTTP-200
    /// special case spec.md S9 calls for.
    #[error("No voucher available.")]
    NoVoucherAvailable,

    #[error("voucher already exists for this pool/operator/denomination")]
    DuplicateVoucher,

    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for PoolError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NoVoucherAvailable => PoolError::NoVoucherAvailable,
            StoreError::DuplicateVoucher => PoolError::DuplicateVoucher,
            StoreError::DuplicateRequest => {
                // Never expected to surface here: the Audit Log always
                // intercepts DuplicateRequest before the operation body runs.
                PoolError::Internal(Box::new(e))
            }
            other => PoolError::Internal(Box::new(other)),
        }
    }
}

impl From<AuditError> for PoolError {
    fn from(e: AuditError) -> Self {
        match e {
            AuditError::Mismatch => PoolError::AuditMismatch,
            AuditError::Store(e) => e.into(),
        }
    }
}
