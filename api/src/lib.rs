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

//! HTTP gateway for the airtime voucher pool service (spec.md S6).
//!
//! Routes are a thin translation layer: parse the request, call into
//! [`voucher_pool`], serialize the response. All business semantics —
//! idempotency, atomicity, the audit protocol — live below this crate.

mod error;
mod handlers;
mod import;
mod types;
mod validate;

use axum::routing::{get, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use voucher_store::Store;

/// Shared state handed to every handler: one [`Store`] connection pool
/// backs every named voucher pool.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

/// Builds the full route table (spec.md S6):
///
/// * `PUT  /{pool}/issue/{operator}/{request_id}`
/// * `GET  /{pool}/audit_query`
/// * `PUT  /{pool}/import/{request_id}`
/// * `GET  /{pool}/voucher_counts`
/// * `PUT  /{pool}/export/{request_id}`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/:pool/issue/:operator/:request_id",
            put(handlers::issue_voucher),
        )
        .route("/:pool/audit_query", get(handlers::audit_query))
        .route("/:pool/import/:request_id", put(handlers::import_vouchers))
        .route("/:pool/voucher_counts", get(handlers::voucher_counts))
        .route("/:pool/export/:request_id", put(handlers::export_vouchers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
