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

//! Route handlers (spec.md S6). Each mirrors one operation of
//! [`voucher_pool::VoucherPool`]; the mapping from domain error to HTTP
//! status lives entirely in [`crate::error`]. Request bodies and query
//! strings are parsed and validated by hand (spec.md S4.4) rather than
//! through axum's typed extractors, so a missing, unexpected or
//! malformed parameter always reaches the caller through the
//! `{request_id, error}` envelope instead of a framework-default
//! rejection response.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use voucher_pool::{AuditQueryField, ExportParams, IssueParams, VoucherPool};

use crate::error::{error_response, GatewayError};
use crate::import;
use crate::types::{
    AuditQueryResponseBody, ExportRequest, ExportResponseBody, IssueRequest, IssueResponseBody,
    VoucherCountsResponseBody,
};
use crate::validate::get_json_params;
use crate::AppState;

pub async fn issue_voucher(
    State(state): State<AppState>,
    Path((pool, operator, request_id)): Path<(String, String, String)>,
    body: Bytes,
) -> Response {
    let body: IssueRequest =
        match get_json_params(&body, &["transaction_id", "user_id", "denomination"], &[]).and_then(
            |map| {
                serde_json::from_value(serde_json::Value::Object(map))
                    .map_err(|e| GatewayError::BadRequest(format!("Invalid parameter: {e}")))
            },
        ) {
            Ok(body) => body,
            Err(e) => return error_response(Some(&request_id), e),
        };

    let pool = VoucherPool::new(state.store, pool);
    let params = IssueParams {
        operator,
        denomination: body.denomination,
        transaction_id: body.transaction_id,
        user_id: body.user_id,
    };
    match pool.issue_voucher(&request_id, params).await {
        Ok(response) => Json(IssueResponseBody {
            voucher: response.voucher,
            request_id,
        })
        .into_response(),
        Err(e) => error_response(Some(&request_id), GatewayError::from(e)),
    }
}

pub async fn audit_query(
    State(state): State<AppState>,
    Path(pool): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let request_id = params.get("request_id").cloned();

    if let Err(e) = crate::validate::check_params(
        params.keys().map(String::as_str),
        &["field", "value"],
        &["request_id"],
    ) {
        return error_response(request_id.as_deref(), e);
    }
    // Present by construction: `check_params` above already guarantees
    // both mandatory keys are in the map.
    let field_param = &params["field"];
    let value = &params["value"];

    let pool = VoucherPool::new(state.store, pool);
    let Some(field) = AuditQueryField::parse(field_param) else {
        return error_response(
            request_id.as_deref(),
            GatewayError::BadRequest("Invalid audit field.".to_string()),
        );
    };

    match pool.query_audit(field, value).await {
        Ok(results) => Json(AuditQueryResponseBody {
            results,
            request_id,
        })
        .into_response(),
        Err(e) => error_response(request_id.as_deref(), GatewayError::from(e)),
    }
}

pub async fn import_vouchers(
    State(state): State<AppState>,
    Path((pool_name, request_id)): Path<(String, String)>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let content_md5 = match headers.get("content-md5").and_then(|v| v.to_str().ok()) {
        Some(value) => value.to_string(),
        None => {
            return error_response(
                Some(&request_id),
                GatewayError::BadRequest("Missing Content-MD5 header.".to_string()),
            )
        }
    };

    if let Err(e) = import::verify_content_md5(&content_md5, &body) {
        return error_response(Some(&request_id), e);
    }
    let rows = match import::parse_rows(&body) {
        Ok(rows) => rows,
        Err(e) => return error_response(Some(&request_id), e),
    };

    let pool = VoucherPool::new(state.store, pool_name);
    match pool.import_vouchers(&request_id, &content_md5, rows).await {
        Ok(response) => (
            axum::http::StatusCode::CREATED,
            Json(crate::types::ImportResponseBody {
                imported: response.imported,
                request_id,
            }),
        )
            .into_response(),
        Err(e) => error_response(Some(&request_id), GatewayError::from(e)),
    }
}

pub async fn voucher_counts(
    State(state): State<AppState>,
    Path(pool_name): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let request_id = params.get("request_id").cloned();

    if let Err(e) =
        crate::validate::check_params(params.keys().map(String::as_str), &[], &["request_id"])
    {
        return error_response(request_id.as_deref(), e);
    }

    let pool = VoucherPool::new(state.store, pool_name);
    match pool.count_vouchers().await {
        Ok(counts) => Json(VoucherCountsResponseBody {
            voucher_counts: counts,
            request_id,
        })
        .into_response(),
        Err(e) => error_response(request_id.as_deref(), GatewayError::from(e)),
    }
}

pub async fn export_vouchers(
    State(state): State<AppState>,
    Path((pool_name, request_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let body: ExportRequest =
        match get_json_params(&body, &[], &["count", "operators", "denominations"]).and_then(
            |map| {
                serde_json::from_value(serde_json::Value::Object(map))
                    .map_err(|e| GatewayError::BadRequest(format!("Invalid parameter: {e}")))
            },
        ) {
            Ok(body) => body,
            Err(e) => return error_response(Some(&request_id), e),
        };

    let pool = VoucherPool::new(state.store, pool_name);
    let params = ExportParams {
        count: body.count,
        operators: body.operators,
        denominations: body.denominations,
    };
    match pool.export_vouchers(&request_id, params).await {
        Ok(response) => Json(ExportResponseBody {
            vouchers: response.vouchers,
            warnings: response.warnings,
            request_id,
        })
        .into_response(),
        Err(e) => error_response(Some(&request_id), GatewayError::from(e)),
    }
}
