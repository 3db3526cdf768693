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

//! The `ServiceAuth` data type.

use base64::Engine;
use base64::engine::general_purpose;
use derivative::Derivative;

/// Authorization strategy used to access a service.
#[derive(Clone, Default, Derivative, Eq, PartialEq)]
#[derivative(Debug)]
pub enum ServiceAuth {
    /// No authorization at all.
    #[default]
    Nothing,

    /// HTTP basic authentication.
    Basic {
        /// Name of the user to authenticate as.
        user: String,

        /// Password of the user.
        #[derivative(Debug = "ignore")]
        password: String,
    },

    /// Bearer token authentication.
    Bearer(#[derivative(Debug = "ignore")] String),

    /// Arbitrary authentication scheme followed by its token.
    Absolute {
        /// Name of the scheme, such as `Token`.
        scheme: String,

        /// Payload for the scheme.
        #[derivative(Debug = "ignore")]
        token: String,
    },
}

impl ServiceAuth {
    /// Creates a basic authentication strategy for `user` and `password`.
    pub fn basic<U: Into<String>, P: Into<String>>(user: U, password: P) -> Self {
        Self::Basic { user: user.into(), password: password.into() }
    }

    /// Creates a bearer token authentication strategy.
    pub fn bearer<T: Into<String>>(token: T) -> Self {
        Self::Bearer(token.into())
    }

    /// Creates an authentication strategy for an arbitrary `scheme` and `token`.
    pub fn absolute<S: Into<String>, T: Into<String>>(scheme: S, token: T) -> Self {
        Self::Absolute { scheme: scheme.into(), token: token.into() }
    }

    /// Computes the value of the `Authorization` header for this strategy, if any.
    pub fn authorization(&self) -> Option<String> {
        match self {
            ServiceAuth::Nothing => None,
            ServiceAuth::Basic { user, password } => Some(format!(
                "Basic {}",
                general_purpose::STANDARD.encode(format!("{}:{}", user, password))
            )),
            ServiceAuth::Bearer(token) => Some(format!("Bearer {}", token)),
            ServiceAuth::Absolute { scheme, token } => Some(format!("{} {}", scheme, token)),
        }
    }
}
