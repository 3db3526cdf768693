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

//! Conversion of response payloads into typed models.

use crate::error::{ServiceError, ServiceResult};
use bytes::Bytes;
use iii_iv_core::codec::{self, CodecResult};
use iii_iv_core::model::Nothing;
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A type that successful payloads can be decoded into.
///
/// `Nothing` ignores the payload, `Bytes` returns it untouched, and everything else is expected to
/// go through the JSON codec.  Use the `Json` wrapper or the `json_service_model!` macro for the
/// latter.
pub trait ServiceModel: Sized {
    /// Decodes a model from the raw payload `data`.
    fn decode(data: Bytes) -> CodecResult<Self>;

    /// Renders the model as plain text for display purposes.
    fn alternative(&self) -> String;
}

impl ServiceModel for Nothing {
    fn decode(_data: Bytes) -> CodecResult<Self> {
        Ok(Nothing)
    }

    fn alternative(&self) -> String {
        String::new()
    }
}

impl ServiceModel for Bytes {
    fn decode(data: Bytes) -> CodecResult<Self> {
        Ok(data)
    }

    fn alternative(&self) -> String {
        match std::str::from_utf8(self) {
            Ok(text) => text.to_owned(),
            Err(_) => codec::to_hex(self),
        }
    }
}

impl ServiceModel for String {
    fn decode(data: Bytes) -> CodecResult<Self> {
        decode_json(&data)
    }

    fn alternative(&self) -> String {
        self.clone()
    }
}

/// Wrapper to decode any deserializable type through the JSON codec.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes the wrapper and returns the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned + Serialize> ServiceModel for Json<T> {
    fn decode(data: Bytes) -> CodecResult<Self> {
        decode_json(&data).map(Json)
    }

    fn alternative(&self) -> String {
        alternative_json(&self.0)
    }
}

/// Decodes `data` as a JSON document.
pub fn decode_json<T: DeserializeOwned>(data: &[u8]) -> CodecResult<T> {
    codec::decode(data)
}

/// Renders `value` as pretty-printed JSON, or as an empty string if it cannot be serialized.
pub fn alternative_json<T: Serialize + ?Sized>(value: &T) -> String {
    codec::encode_pretty(value)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Renders a list of models as plain text, one model per line.
pub fn join_alternatives<T: ServiceModel>(models: &[T]) -> String {
    models.iter().map(T::alternative).collect::<Vec<_>>().join("\n")
}

/// Decodes `data` into a `T`, logging the raw payload if that fails.
pub fn decode<T: ServiceModel>(data: Bytes) -> ServiceResult<T> {
    T::decode(data.clone()).map_err(|e| {
        warn!("Cannot decode payload: {}; payload was: {}", e, String::from_utf8_lossy(&data));
        ServiceError::Decode { message: e.to_string(), payload: data }
    })
}

/// Implements `ServiceModel` for a type that is decoded from JSON.
#[macro_export]
macro_rules! json_service_model {
    ( $t:ty ) => {
        impl $crate::ServiceModel for $t {
            fn decode(data: $crate::Bytes) -> $crate::CodecResult<Self> {
                $crate::decode_json(&data)
            }

            fn alternative(&self) -> String {
                $crate::alternative_json(self)
            }
        }
    };
}
