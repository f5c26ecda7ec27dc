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

//! Process configuration: database location, listen address, logging.
//!
//! Mirrors the teacher's `GlobalConfig` shape — a struct assembled from
//! defaults, then overridden by an optional TOML file, then by
//! environment variables, in that order.

mod types;

pub use types::{ConfigError, ServiceConfig};
