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

//! JSON codec shared by all services.
//!
//! Dates travel as strings with a fixed ISO-8601 layout that always carries milliseconds and an
//! explicit offset, such as `2022-01-23T10:15:30.000+00:00`.  Binary payloads embedded in JSON
//! documents can travel as lowercase hex strings.  Both strategies are opt-in per field via the
//! `date` and `hex_bytes` modules, which are meant to be used with `#[serde(with = "...")]`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Layout of all dates exchanged with services.
const DATE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Indicates a date that does not follow the expected layout.
    #[error("Invalid date '{0}'")]
    Date(String),

    /// Indicates a malformed hex string.
    #[error("Invalid hex string: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Indicates a failure to serialize or deserialize a JSON document.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for this module.
pub type CodecResult<T> = Result<T, CodecError>;

/// Serializes `value` as compact JSON, which is what goes over the wire.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Serializes `value` as pretty-printed JSON, which is useful for diagnostics.
pub fn encode_pretty<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(value)?)
}

/// Deserializes a JSON document in `bytes` into a `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Formats `date` in UTC using the service date layout.
pub fn format_date(date: OffsetDateTime) -> CodecResult<String> {
    date.to_offset(UtcOffset::UTC)
        .format(DATE_FORMAT)
        .map_err(|e| CodecError::Date(format!("{}: {}", date, e)))
}

/// Parses a date in the service date layout.
///
/// RFC 3339 dates are accepted too because some services send `Z` instead of `+00:00`.
pub fn parse_date(s: &str) -> CodecResult<OffsetDateTime> {
    OffsetDateTime::parse(s, DATE_FORMAT)
        .or_else(|_| OffsetDateTime::parse(s, &Rfc3339))
        .map_err(|_| CodecError::Date(s.to_owned()))
}

/// Renders `bytes` as a lowercase hex string.
pub fn to_hex<B: AsRef<[u8]>>(bytes: B) -> String {
    hex::encode(bytes)
}

/// Parses a hex string into bytes.
pub fn from_hex(s: &str) -> CodecResult<Vec<u8>> {
    Ok(hex::decode(s)?)
}

/// Serde adapter for `OffsetDateTime` fields.
pub mod date {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    /// Serializes `date` using the service date layout.
    pub fn serialize<S: Serializer>(
        date: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = super::format_date(*date).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    /// Deserializes a date in the service date layout.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_date(&text).map_err(D::Error::custom)
    }

    /// Serde adapter for optional `OffsetDateTime` fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::OffsetDateTime;

        /// Serializes `date`, if present, using the service date layout.
        pub fn serialize<S: Serializer>(
            date: &Option<OffsetDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional date in the service date layout.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(text) => super::super::parse_date(&text)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

/// Serde adapter for binary fields that travel as hex strings.
pub mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `bytes` as a lowercase hex string.
    pub fn serialize<B: AsRef<[u8]>, S: Serializer>(
        bytes: B,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    /// Deserializes a hex string into bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::from_hex(&text).map_err(D::Error::custom)
    }
}
