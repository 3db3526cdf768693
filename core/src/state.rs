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

//! Application state carried by an orchestrator.

/// Application-defined state that travels with an orchestrator so that curators can inspect it.
pub trait ServiceState {
    /// Returns the version of the application or API that this state belongs to.
    fn version(&self) -> &str;
}

/// State with nothing in it other than a placeholder version.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmptyServiceState {
    /// Version of the state.
    version: String,
}

impl Default for EmptyServiceState {
    fn default() -> Self {
        Self { version: "0.0.0".to_owned() }
    }
}

impl EmptyServiceState {
    /// Creates an empty state tagged with `version`.
    pub fn with_version<S: Into<String>>(version: S) -> Self {
        Self { version: version.into() }
    }
}

impl ServiceState for EmptyServiceState {
    fn version(&self) -> &str {
        &self.version
    }
}
