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

//! Timing records of service executions.

use crate::clocks::Clock;
use crate::model::Service;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;

/// Record of a single execution of a service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServicedAt {
    /// The service that was executed.
    service: Service,

    /// When the execution started.
    timestamp: OffsetDateTime,

    /// How long the execution took.  Zero until `split` is called.
    duration: Duration,
}

impl ServicedAt {
    /// Starts recording an execution of `service` that began at `timestamp`.
    pub fn new(service: Service, timestamp: OffsetDateTime) -> Self {
        Self { service, timestamp, duration: Duration::ZERO }
    }

    /// Finalizes the record by computing the duration up to the current time of `clock`.
    pub fn split(&mut self, clock: &dyn Clock) {
        self.duration = clock.elapsed(self.timestamp);
    }

    /// Returns a textual identifier for this record.
    pub fn id(&self) -> String {
        format!("{}[{}]", self.service.name(), self.timestamp.unix_timestamp_nanos())
    }

    /// Returns the service that was executed.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns when the execution started.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Returns how long the execution took.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Sink for execution records.
///
/// Histories are purely for observability and must never fail, which is why none of these
/// operations return errors.
pub trait ServiceHistory {
    /// Appends a new record.
    fn add(&self, serviced: ServicedAt);

    /// Removes all records equal to `serviced`.
    fn remove(&self, serviced: &ServicedAt);

    /// Removes all records.
    fn remove_all(&self);

    /// Returns all records in the order in which they were added.
    fn events(&self) -> Vec<ServicedAt>;
}

/// History that keeps all records in memory.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    /// The recorded events, in insertion order.
    events: Mutex<Vec<ServicedAt>>,
}

impl InMemoryHistory {
    /// Locks the events, ignoring poisoning as the vector is always left in a valid state.
    fn lock(&self) -> MutexGuard<'_, Vec<ServicedAt>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ServiceHistory for InMemoryHistory {
    fn add(&self, serviced: ServicedAt) {
        self.lock().push(serviced);
    }

    fn remove(&self, serviced: &ServicedAt) {
        self.lock().retain(|event| event != serviced);
    }

    fn remove_all(&self) {
        self.lock().clear();
    }

    fn events(&self) -> Vec<ServicedAt> {
        self.lock().clone()
    }
}
