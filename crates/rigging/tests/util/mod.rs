// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared support for the integration tests.

#![allow(dead_code, reason = "not every test file exercises every helper")]

use std::sync::Mutex;

use rigging::{BoxError, Listener, Object, TypeKey};

/// Listener that records every notification in arrival order.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<TypeKey>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The notified keys in arrival order.
    pub fn events(&self) -> Vec<TypeKey> {
        self.events.lock().expect("recorder lock").clone()
    }

    /// How many notifications arrived for `key`.
    pub fn count_for(&self, key: TypeKey) -> usize {
        self.events
            .lock()
            .expect("recorder lock")
            .iter()
            .filter(|&&event| event == key)
            .count()
    }

    /// The total number of notifications.
    pub fn total(&self) -> usize {
        self.events.lock().expect("recorder lock").len()
    }
}

impl Listener for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn constructed(&self, key: TypeKey, _instance: &Object) -> Result<(), BoxError> {
        self.events.lock().expect("recorder lock").push(key);
        Ok(())
    }
}

/// Listener that rejects every notification.
pub struct Rejecting;

impl Listener for Rejecting {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn constructed(&self, _key: TypeKey, _instance: &Object) -> Result<(), BoxError> {
        Err("rejected by test listener".into())
    }
}
