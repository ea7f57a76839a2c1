// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::Result;
use crate::key::{Object, TypeKey};

/// Concurrent, type-keyed cache of singleton instances.
///
/// At most one build per key is in flight at any moment. Concurrent
/// requesters for the same key block until that build completes; on success
/// they receive the cached instance, on failure the entry is removed and the
/// first requester to re-check takes over as the new builder. Builds for
/// different keys proceed concurrently because the map lock is never held
/// across a build.
///
/// Callers must not re-enter the store for a key whose build is running on
/// the same thread; the session's cycle detection rejects such requests
/// before they reach the store.
pub(crate) struct SingletonStore {
    entries: Mutex<HashMap<TypeKey, Entry>>,
    wakeup: Condvar,
}

enum Entry {
    /// A build is in flight on some thread.
    Building,
    /// The cached instance; never replaced or removed once present.
    Ready(Object),
}

impl SingletonStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            wakeup: Condvar::new(),
        }
    }

    /// Returns the instance cached under `key`, building it first if absent.
    ///
    /// The boolean reports whether this call performed the build, so the
    /// caller can fire exactly one construction notification per instance.
    pub(crate) fn get_or_build<F>(&self, key: TypeKey, build: F) -> Result<(Object, bool)>
    where
        F: FnOnce() -> Result<Object>,
    {
        let mut build = Some(build);
        let mut entries = self.entries.lock();
        loop {
            match entries.get(&key) {
                Some(Entry::Ready(value)) => return Ok((Arc::clone(value), false)),
                Some(Entry::Building) => self.wakeup.wait(&mut entries),
                None => {
                    entries.insert(key, Entry::Building);
                    drop(entries);

                    // The marker is reverted if the build errors or panics,
                    // so waiters can take over instead of hanging.
                    let in_flight = InFlight {
                        store: self,
                        key,
                        completed: false,
                    };
                    let value = (build.take().expect("build closure consumed once"))()?;
                    in_flight.complete(Arc::clone(&value));
                    return Ok((value, true));
                }
            }
        }
    }

    /// Returns the instance cached under `key` without triggering a build.
    pub(crate) fn peek(&self, key: TypeKey) -> Option<Object> {
        match self.entries.lock().get(&key) {
            Some(Entry::Ready(value)) => Some(Arc::clone(value)),
            _ => None,
        }
    }
}

struct InFlight<'a> {
    store: &'a SingletonStore,
    key: TypeKey,
    completed: bool,
}

impl InFlight<'_> {
    fn complete(mut self, value: Object) {
        let mut entries = self.store.entries.lock();
        entries.insert(self.key, Entry::Ready(value));
        drop(entries);
        self.completed = true;
        self.store.wakeup.notify_all();
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.store.entries.lock().remove(&self.key);
            self.store.wakeup.notify_all();
        }
    }
}

impl fmt::Debug for SingletonStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("SingletonStore")
            .field("len", &entries.len())
            .finish()
    }
}
