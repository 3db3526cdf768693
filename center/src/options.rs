// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Configuration of a production orchestrator.

use crate::request::DEFAULT_TIMEOUT;
use iii_iv_core::env::{get_optional_var, get_required_var};
use std::time::Duration;
use url::Url;

/// Checks if `base` has the right format to be a base URL and returns an error if it is not.
fn ensure_valid_base(base: &Url) -> Result<(), String> {
    let valid = match base.join("x") {
        Ok(joined) => joined.as_str().starts_with(base.as_str()),
        Err(_) => false,
    };
    if !valid {
        return Err(format!("URL '{}' cannot be a base: missing trailing slash", base));
    }
    Ok(())
}

/// Options to configure a `ServiceCenter` backed by a real HTTP client.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceCenterOptions {
    /// Base URL against which relative service paths are resolved.
    pub base_url: Url,

    /// Timeout for requests that do not carry their own.
    pub timeout: Duration,

    /// Value of the `User-Agent` header to send, if any.
    pub user_agent: Option<String>,
}

impl ServiceCenterOptions {
    /// Creates a set of options for `base_url` with default values for everything else.
    pub fn new(base_url: Url) -> Result<Self, String> {
        ensure_valid_base(&base_url)?;
        Ok(Self { base_url, timeout: DEFAULT_TIMEOUT, user_agent: None })
    }

    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_BASE_URL`, `<prefix>_TIMEOUT` and
    /// `<prefix>_USER_AGENT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let mut opts = Self::new(get_required_var::<Url>(prefix, "BASE_URL")?)?;
        if let Some(timeout) = get_optional_var::<Duration>(prefix, "TIMEOUT")? {
            opts.timeout = timeout;
        }
        opts.user_agent = get_optional_var::<String>(prefix, "USER_AGENT")?;
        Ok(opts)
    }
}
