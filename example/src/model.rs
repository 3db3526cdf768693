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

//! High-level data types.

use iii_iv_center::json_service_model;
use iii_iv_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Newtype pattern for the keys of the key/value store.
#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Creates a new key after validating that it can be used as a path segment.
    pub fn new<S: Into<String>>(key: S) -> ModelResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(ModelError("Key cannot be empty".to_owned()));
        }
        if key.contains(['/', '?', '#']) {
            return Err(ModelError(format!("Key '{}' cannot contain /, ? nor #", key)));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Content of the keys stored in the key/value store.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Entry {
    /// The key's raw value.
    pub value: String,

    /// The key's current version number.
    pub version: u32,
}

json_service_model!(Entry);

/// List of keys as returned by the store.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Keys(pub Vec<Key>);

json_service_model!(Keys);

#[cfg(test)]
mod tests {
    use super::*;
    use iii_iv_center::{Bytes, ServiceModel};

    #[test]
    fn test_key_validation() {
        assert_eq!("abc", Key::new("abc").unwrap().as_str());
        assert_eq!(ModelError("Key cannot be empty".to_owned()), Key::new("").unwrap_err());
        for invalid in ["a/b", "a?b", "a#b"] {
            let err = Key::new(invalid).unwrap_err();
            assert!(err.0.contains("cannot contain"), "{}", err.0);
        }
    }

    #[test]
    fn test_entry_decode() {
        let entry = Entry::decode(Bytes::from_static(br#"{"value": "x", "version": 3}"#)).unwrap();
        assert_eq!(Entry { value: "x".to_owned(), version: 3 }, entry);
        assert_eq!("{\n  \"value\": \"x\",\n  \"version\": 3\n}", entry.alternative());
    }

    #[test]
    fn test_keys_decode() {
        let keys = Keys::decode(Bytes::from_static(br#"["a", "b"]"#)).unwrap();
        assert_eq!(Keys(vec![Key::new("a").unwrap(), Key::new("b").unwrap()]), keys);
    }
}
