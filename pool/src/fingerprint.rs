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

use serde_json::json;

/// Canonical fingerprint for an `issue_voucher` request (spec.md S4.2).
pub fn issue(operator: &str, denomination: &str) -> String {
    json!({"operator": operator, "denomination": denomination}).to_string()
}

/// Canonical fingerprint for an `import_vouchers` request.
pub fn import(content_md5: &str) -> String {
    json!({"content_md5": content_md5}).to_string()
}

/// Canonical fingerprint for an `export_vouchers` request. Operator and
/// denomination filters are sorted so that request order never affects
/// the fingerprint.
pub fn export(
    count: Option<u32>,
    operators: Option<&[String]>,
    denominations: Option<&[String]>,
) -> String {
    json!({
        "count": count,
        "operators": sorted(operators),
        "denominations": sorted(denominations),
    })
    .to_string()
}

fn sorted(values: Option<&[String]>) -> Option<Vec<String>> {
    values.map(|v| {
        let mut v = v.to_vec();
        v.sort();
        v
    })
}
