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

//! Mandatory/optional request-parameter validation (spec.md S4.4, S7),
//! mirroring the original importer's `_get_params`: a request must
//! supply every mandatory key and no key outside mandatory+optional.
//! Runs ahead of any typed `Deserialize`, so a missing or unexpected
//! parameter always reaches the caller through the `{request_id,
//! error}` envelope rather than a framework-default rejection body.

use std::collections::BTreeSet;

use crate::error::GatewayError;

pub fn check_params<'a>(
    keys: impl Iterator<Item = &'a str>,
    mandatory: &[&str],
    optional: &[&str],
) -> Result<(), GatewayError> {
    let present: BTreeSet<&str> = keys.collect();
    let mandatory_set: BTreeSet<&str> = mandatory.iter().copied().collect();
    let allowed: BTreeSet<&str> = mandatory.iter().chain(optional.iter()).copied().collect();

    let missing: Vec<&str> = mandatory_set.difference(&present).copied().collect();
    if !missing.is_empty() {
        return Err(GatewayError::BadRequest(format!(
            "Missing request parameters: '{}'",
            missing.join("', '")
        )));
    }

    let extra: Vec<&str> = present.difference(&allowed).copied().collect();
    if !extra.is_empty() {
        return Err(GatewayError::BadRequest(format!(
            "Unexpected request parameters: '{}'",
            extra.join("', '")
        )));
    }

    Ok(())
}

/// Parses `body` as a JSON object, treating an empty body as `{}`.
pub fn parse_json_object(
    body: &[u8],
) -> Result<serde_json::Map<String, serde_json::Value>, GatewayError> {
    if body.is_empty() {
        return Ok(serde_json::Map::new());
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(GatewayError::BadRequest(
            "Request body must be a JSON object.".to_string(),
        )),
        Err(e) => Err(GatewayError::BadRequest(format!("Invalid JSON: {e}"))),
    }
}

/// Parses `body` as a JSON object and checks its key set against
/// `mandatory`/`optional` before returning it for typed deserialization.
pub fn get_json_params(
    body: &[u8],
    mandatory: &[&str],
    optional: &[&str],
) -> Result<serde_json::Map<String, serde_json::Value>, GatewayError> {
    let map = parse_json_object(body)?;
    check_params(map.keys().map(String::as_str), mandatory, optional)?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mandatory_key_is_rejected() {
        let err = check_params(["field"].into_iter(), &["field", "value"], &[]).unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }

    #[test]
    fn unexpected_key_is_rejected() {
        let err = check_params(
            ["field", "value", "extra"].into_iter(),
            &["field", "value"],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }

    #[test]
    fn mandatory_plus_optional_is_accepted() {
        check_params(
            ["field", "value", "request_id"].into_iter(),
            &["field", "value"],
            &["request_id"],
        )
        .unwrap();
    }
}
