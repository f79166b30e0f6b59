//! Name-keyed idempotency for volume creation.
//!
//! A create request first takes the lease for its volume name and only then
//! asks the backend whether a volume with that name exists. Holding the
//! lease until provisioning finishes turns the lookup-then-create sequence
//! into a per-name critical section, so concurrent retries of one request
//! cannot both create a volume. Requests for different names never wait on
//! each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::backend::{BlockStorage, RemoteVolume};
use crate::error::ControllerError;
use crate::provision::RequestContext;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// A table entry and the number of handles registered against it.
#[derive(Debug)]
struct Entry {
    slot: Slot,
    users: usize,
}

/// Table of per-name locks.
#[derive(Debug, Default)]
pub struct NameLocks {
    slots: Mutex<HashMap<String, Entry>>,
}

/// Registration of one holder or waiter for a name.
///
/// The entry leaves the table when its last handle is dropped, whether the
/// handle belonged to a finished lease or to an acquire that was abandoned
/// while waiting.
#[derive(Debug)]
struct SlotHandle<'a> {
    locks: &'a NameLocks,
    name: String,
}

impl<'a> SlotHandle<'a> {
    fn register(locks: &'a NameLocks, name: &str) -> (Self, Slot) {
        let mut slots = locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = slots.entry(name.to_owned()).or_insert_with(|| Entry {
            slot: Slot::default(),
            users: 0,
        });
        entry.users = entry.users.saturating_add(1);
        let slot = Arc::clone(&entry.slot);
        (
            Self {
                locks,
                name: name.to_owned(),
            },
            slot,
        )
    }
}

impl Drop for SlotHandle<'_> {
    fn drop(&mut self) {
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = slots.get_mut(&self.name) else {
            return;
        };
        entry.users = entry.users.saturating_sub(1);
        if entry.users == 0 {
            slots.remove(&self.name);
        }
    }
}

/// Exclusive hold on one volume name. Released on drop.
#[derive(Debug)]
pub struct NameLease<'a> {
    // Field order matters: the guard is released before the handle leaves
    // the table.
    guard: OwnedMutexGuard<()>,
    handle: SlotHandle<'a>,
}

impl NameLocks {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `name`.
    ///
    /// Dropping the returned future before it resolves withdraws the
    /// registration, so abandoned waits leave nothing behind.
    pub async fn acquire(&self, name: &str) -> NameLease<'_> {
        let (handle, slot) = SlotHandle::register(self, name);
        let guard = slot.lock_owned().await;
        NameLease { guard, handle }
    }

    /// Number of names currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no name is held or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NameLease<'_> {
    /// The name this lease protects.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.handle.name
    }
}

/// Result of passing the idempotency gate.
#[derive(Debug)]
pub enum GateOutcome<'a> {
    /// A volume with the requested name already exists.
    Existing(RemoteVolume),
    /// No such volume exists; the lease must be held while creating it.
    Vacant(NameLease<'a>),
}

/// Looks up volumes by name under the per-name lease.
#[derive(Debug)]
pub struct IdempotencyGate<'a, B> {
    storage: &'a B,
    locks: &'a NameLocks,
}

impl<'a, B: BlockStorage> IdempotencyGate<'a, B> {
    /// Creates a gate over `storage` using `locks` for serialisation.
    #[must_use]
    pub const fn new(storage: &'a B, locks: &'a NameLocks) -> Self {
        Self { storage, locks }
    }

    /// Takes the lease for `name` and checks whether the volume exists.
    ///
    /// An existing volume is returned as-is; its size and capabilities are
    /// not compared with the new request.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Backend`] when the lookup fails and
    /// [`ControllerError::Cancelled`] or [`ControllerError::DeadlineExceeded`]
    /// when the caller gives up while waiting for the lease.
    pub async fn enter(
        &self,
        name: &str,
        context: &RequestContext,
    ) -> Result<GateOutcome<'a>, ControllerError> {
        let lease = tokio::select! {
            biased;
            interruption = context.interruption() => {
                return Err(interruption.into_error(None, &format!("waiting for volume name {name}")));
            }
            lease = self.locks.acquire(name) => lease,
        };

        let existing = self
            .storage
            .lookup(name)
            .await
            .map_err(|err| ControllerError::backend("cannot look up volume", &err))?;
        match existing {
            Some(volume) => {
                debug!(name, volume_id = %volume.id, "volume already exists");
                Ok(GateOutcome::Existing(volume))
            }
            None => Ok(GateOutcome::Vacant(lease)),
        }
    }
}
