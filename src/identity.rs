//! Allocation of unique identifiers for model objects.
//!
//! Identifiers are never released. A registry is a cheap cloneable handle;
//! all clones share one identifier set behind a mutex, so objects may be
//! created from several threads.

use crate::model_object::ObjectId;
use log::{debug, warn};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Default)]
struct IdentitySet {
    issued: HashSet<usize>,
    next_free: usize,
}

impl IdentitySet {
    fn advance(&mut self) {
        while self.issued.contains(&self.next_free) {
            self.next_free += 1;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct IdentityRegistry {
    inner: Arc<Mutex<IdentitySet>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Nothing in the set can be left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, IdentitySet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the next identifier past everything issued or claimed so far.
    pub fn allocate(&self) -> ObjectId {
        let mut set = self.lock();
        let id = set.next_free;
        set.issued.insert(id);
        set.advance();
        debug!("Allocated identifier {id}");
        ObjectId::new(id)
    }

    /// Reserves a specific identifier, e.g. when reloading saved objects.
    /// Returns `false` if it was already issued.
    pub fn claim(&self, id: ObjectId) -> bool {
        let mut set = self.lock();
        if !set.issued.insert(id.value()) {
            warn!("Identifier {id} is already taken");
            return false;
        }
        set.next_free = set.next_free.max(id.value() + 1);
        set.advance();
        debug!("Claimed identifier {id}");
        true
    }

    pub fn is_issued(&self, id: ObjectId) -> bool {
        self.lock().issued.contains(&id.value())
    }

    pub fn issued_count(&self) -> usize {
        self.lock().issued.len()
    }

    pub fn next_free(&self) -> ObjectId {
        ObjectId::new(self.lock().next_free)
    }
}
