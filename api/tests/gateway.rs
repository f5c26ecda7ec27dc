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

//! End-to-end HTTP tests covering the scenarios spec.md S8 calls out by
//! name, driven straight through the axum `Router` with an in-memory
//! SQLite store — no network socket involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use md5::{Digest, Md5};
use serde_json::{json, Value};
use tower::ServiceExt;
use voucher_api::{router, AppState};
use voucher_store::Store;

async fn test_app() -> axum::Router {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    router(AppState { store })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn import_csv(app: &axum::Router, pool: &str, request_id: &str, csv_body: &str) {
    let mut hasher = Md5::new();
    hasher.update(csv_body.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/{pool}/import/{request_id}"))
                .header("content-md5", digest)
                .body(Body::from(csv_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn issuing_against_a_missing_pool_returns_404() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/nosuchpool/issue/Tank/req-0")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "transaction_id": "t0",
                        "user_id": "u0",
                        "denomination": "red",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn two_issuances_return_distinct_vouchers_then_exhaust_at_200() {
    let app = test_app().await;
    import_csv(
        &app,
        "testpool",
        "import-0",
        "operator,denomination,voucher\nTank,red,v0\nTank,red,v1\n",
    )
    .await;

    let issue = |app: axum::Router, request_id: &'static str| {
        let body = json!({"transaction_id": "t", "user_id": "u", "denomination": "red"});
        async move {
            app.oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/testpool/issue/Tank/{request_id}"))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let first = issue(app.clone(), "req-0").await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = json_body(first).await;

    let second = issue(app.clone(), "req-1").await;
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = json_body(second).await;
    assert_ne!(first_body["voucher"], second_body["voucher"]);

    let third = issue(app, "req-2").await;
    assert_eq!(third.status(), StatusCode::OK);
    let third_body = json_body(third).await;
    assert_eq!(third_body["error"], "No voucher available.");
}

#[tokio::test]
async fn replaying_the_same_request_id_returns_the_same_response() {
    let app = test_app().await;
    import_csv(
        &app,
        "testpool",
        "import-0",
        "operator,denomination,voucher\nTank,red,v0\n",
    )
    .await;

    let body = json!({"transaction_id": "t", "user_id": "u", "denomination": "red"});
    let request = || {
        Request::builder()
            .method("PUT")
            .uri("/testpool/issue/Tank/req-0")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let first = app.clone().oneshot(request()).await.unwrap();
    let first_body = json_body(first).await;

    let replay = app.oneshot(request()).await.unwrap();
    let replay_body = json_body(replay).await;

    assert_eq!(first_body["voucher"], replay_body["voucher"]);
}

#[tokio::test]
async fn replaying_a_request_id_with_different_params_is_a_400_mismatch() {
    let app = test_app().await;
    import_csv(
        &app,
        "testpool",
        "import-0",
        "operator,denomination,voucher\nTank,red,v0\nTank,blue,v1\n",
    )
    .await;

    let issue_with = |denomination: &'static str| {
        let app = app.clone();
        let body = json!({"transaction_id": "t", "user_id": "u", "denomination": denomination});
        async move {
            app.oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/testpool/issue/Tank/req-0")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let first = issue_with("red").await;
    assert_eq!(first.status(), StatusCode::OK);

    let mismatch = issue_with("blue").await;
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn import_with_a_mismatched_content_md5_is_rejected() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/testpool/import/req-0")
                .header("content-md5", "0000000000000000000000000000")
                .body(Body::from(
                    "operator,denomination,voucher\nTank,red,v0\n".to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn voucher_counts_reports_imported_inventory() {
    let app = test_app().await;
    import_csv(
        &app,
        "testpool",
        "import-0",
        "operator,denomination,voucher\nTank,red,v0\nTank,red,v1\n",
    )
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/testpool/voucher_counts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let counts = body["voucher_counts"].as_array().unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0]["count"], 2);
}

#[tokio::test]
async fn audit_query_by_request_id_finds_the_issuing_request() {
    let app = test_app().await;
    import_csv(
        &app,
        "testpool",
        "import-0",
        "operator,denomination,voucher\nTank,red,v0\n",
    )
    .await;

    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/testpool/issue/Tank/req-0")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"transaction_id": "t0", "user_id": "u0", "denomination": "red"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/testpool/audit_query?field=request_id&value=req-0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["user_id"], "u0");
}

#[tokio::test]
async fn audit_query_with_an_unrecognized_field_is_a_400() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/testpool/audit_query?field=voucher&value=x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
