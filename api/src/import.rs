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

//! CSV parsing and `Content-MD5` verification for bulk import (spec.md
//! S4.3, S6). Column names are lowercased before reaching
//! [`voucher_pool`], matching the case-insensitive header handling the
//! original importer relied on.

use md5::{Digest, Md5};
use voucher_pool::ImportRow;

use crate::error::GatewayError;

/// Verifies `content_md5` (as supplied via the `Content-MD5` header)
/// against the actual MD5 digest of `body`, case-insensitively.
pub fn verify_content_md5(content_md5: &str, body: &[u8]) -> Result<(), GatewayError> {
    let mut hasher = Md5::new();
    hasher.update(body);
    let actual = hex::encode(hasher.finalize());
    if actual.eq_ignore_ascii_case(content_md5) {
        Ok(())
    } else {
        Err(GatewayError::BadRequest(
            "Content-MD5 header does not match content.".to_string(),
        ))
    }
}

/// Parses `body` as a CSV document with a header row, lowercasing column
/// names and requiring `operator`, `denomination` and `voucher` columns.
pub fn parse_rows(body: &[u8]) -> Result<Vec<ImportRow>, GatewayError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(body);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| GatewayError::BadRequest(format!("Invalid CSV: {e}")))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();

    let find = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            GatewayError::BadRequest(format!("Missing '{name}' column in import data."))
        })
    };
    let operator_idx = find("operator")?;
    let denomination_idx = find("denomination")?;
    let voucher_idx = find("voucher")?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| GatewayError::BadRequest(format!("Invalid CSV: {e}")))?;
        rows.push(ImportRow {
            operator: record.get(operator_idx).unwrap_or_default().to_string(),
            denomination: record.get(denomination_idx).unwrap_or_default().to_string(),
            voucher: record.get(voucher_idx).unwrap_or_default().to_string(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_md5_is_accepted() {
        let body = b"Operator,Denomination,Voucher\nTank,red,v1\n";
        let mut hasher = Md5::new();
        hasher.update(body);
        let digest = hex::encode(hasher.finalize());
        verify_content_md5(&digest, body).unwrap();
    }

    #[test]
    fn mismatched_md5_is_rejected() {
        let body = b"Operator,Denomination,Voucher\nTank,red,v1\n";
        assert!(verify_content_md5("deadbeef", body).is_err());
    }

    #[test]
    fn columns_are_matched_case_insensitively() {
        let body = b"Operator,Denomination,Voucher\nTank,red,v1\n";
        let rows = parse_rows(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].operator, "Tank");
        assert_eq!(rows[0].voucher, "v1");
    }
}
