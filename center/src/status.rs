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

//! Classification of response status codes.

use crate::transport::Output;
use std::fmt;

/// Outcome of a response, tagged by the band its status code falls into.
///
/// Every variant carries the status code and the full output so that whoever consumes the outcome
/// can render diagnostics or recover the payload without going back to the transport.
#[derive(Clone, Debug)]
pub enum HttpStatus {
    /// Status codes in the 1xx range.
    Informational(u16, Output),

    /// Status codes in the 2xx range.
    Success(u16, Output),

    /// Status codes in the 3xx range.
    Redirect(u16, Output),

    /// Status codes in the 4xx range.
    ClientError(u16, Output),

    /// Status codes in the 5xx range.
    ServerError(u16, Output),

    /// Any status code outside of the 100..600 range.
    Unclassified(u16, Output),
}

impl HttpStatus {
    /// Classifies `output` by its status code.
    pub fn classify(output: Output) -> Self {
        let code = output.status();
        match code {
            100..=199 => HttpStatus::Informational(code, output),
            200..=299 => HttpStatus::Success(code, output),
            300..=399 => HttpStatus::Redirect(code, output),
            400..=499 => HttpStatus::ClientError(code, output),
            500..=599 => HttpStatus::ServerError(code, output),
            _ => HttpStatus::Unclassified(code, output),
        }
    }

    /// Returns the status code of the response.
    pub fn status_code(&self) -> u16 {
        match self {
            HttpStatus::Informational(code, _)
            | HttpStatus::Success(code, _)
            | HttpStatus::Redirect(code, _)
            | HttpStatus::ClientError(code, _)
            | HttpStatus::ServerError(code, _)
            | HttpStatus::Unclassified(code, _) => *code,
        }
    }

    /// Returns the output of the response.
    pub fn output(&self) -> &Output {
        match self {
            HttpStatus::Informational(_, output)
            | HttpStatus::Success(_, output)
            | HttpStatus::Redirect(_, output)
            | HttpStatus::ClientError(_, output)
            | HttpStatus::ServerError(_, output)
            | HttpStatus::Unclassified(_, output) => output,
        }
    }

    /// Consumes the status and returns its output.
    pub fn into_output(self) -> Output {
        match self {
            HttpStatus::Informational(_, output)
            | HttpStatus::Success(_, output)
            | HttpStatus::Redirect(_, output)
            | HttpStatus::ClientError(_, output)
            | HttpStatus::ServerError(_, output)
            | HttpStatus::Unclassified(_, output) => output,
        }
    }

    /// Returns true if the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        matches!(self, HttpStatus::Success(..))
    }

    /// Returns the body of the response as text, or `«»` if the body is not valid UTF-8.
    pub fn body_text(&self) -> String {
        match std::str::from_utf8(self.output().data()) {
            Ok(text) => text.to_owned(),
            Err(_) => "«»".to_owned(),
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.status_code(), self.body_text())
    }
}

impl std::error::Error for HttpStatus {}
