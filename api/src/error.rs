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

//! Gateway-level error taxonomy and its single translation to an HTTP
//! response (spec.md S7, S9). Every other module returns a
//! [`GatewayError`]; nothing downstream of `handlers` ever builds a
//! status code directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use voucher_pool::PoolError;

use crate::types::ErrorBody;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl GatewayError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            GatewayError::Pool(PoolError::NoVoucherPool) => (
                StatusCode::NOT_FOUND,
                "Voucher pool does not exist.".to_string(),
            ),
            GatewayError::Pool(PoolError::AuditMismatch) => (
                StatusCode::BAD_REQUEST,
                "This request has already been performed with different parameters.".to_string(),
            ),
            GatewayError::Pool(PoolError::ParamError(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            // Not a fault: the caller already knows how to interpret this
            // as "nothing to issue" (spec.md S9).
            GatewayError::Pool(PoolError::NoVoucherAvailable) => {
                (StatusCode::OK, "No voucher available.".to_string())
            }
            GatewayError::Pool(PoolError::DuplicateVoucher) => (
                StatusCode::BAD_REQUEST,
                "voucher already exists for this pool/operator/denomination".to_string(),
            ),
            GatewayError::Pool(PoolError::Internal(e)) => {
                tracing::error!(error = %e, "internal error handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = ErrorBody {
            request_id: None,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

/// Attaches `request_id` to an error body built from a [`GatewayError`],
/// mirroring the successful-response convention of echoing it back —
/// `None` serializes as JSON `null`, exactly like the success path,
/// rather than coercing to an empty string.
pub fn error_response(request_id: Option<&str>, err: GatewayError) -> Response {
    let (status, message) = err.status_and_message();
    let body = ErrorBody {
        request_id: request_id.map(|s| s.to_string()),
        error: message,
    };
    (status, Json(body)).into_response()
}
