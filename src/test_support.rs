//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::backend::{
    BackendFuture, BlockStorage, CreateVolumeParams, RemoteVolume, VolumeStatus,
};

/// Errors produced by [`ScriptedStorage`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedStorageError {
    /// The volume does not exist.
    #[error("volume {0} not found")]
    NotFound(String),
    /// A failure injected by the test.
    #[error("{0}")]
    Injected(String),
}

#[derive(Debug)]
struct StoredVolume {
    label: String,
    size_gb: u64,
    statuses: VecDeque<VolumeStatus>,
    status: VolumeStatus,
}

#[derive(Debug, Default)]
struct ScriptState {
    volumes: BTreeMap<String, StoredVolume>,
    next_id: u64,
    create_script: Vec<VolumeStatus>,
    create_delay: Option<Duration>,
    lookup_failure: Option<String>,
    poll_failure: Option<String>,
    create_failure: Option<String>,
    delete_failure: Option<String>,
    lookup_calls: u32,
    status_polls: u32,
    create_calls: u32,
    created: Vec<CreateVolumeParams>,
    deleted: Vec<String>,
}

/// In-memory [`BlockStorage`] with scripted status sequences and injected
/// failures. Clones share state, so a test can keep a handle while the
/// controller owns another.
///
/// A lookup by identifier is a status poll: it advances the volume's script
/// and returns the next status. The final scripted status repeats once the
/// script runs out. Lookups by label return the current status unchanged.
#[derive(Clone, Debug, Default)]
pub struct ScriptedStorage {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedStorage {
    /// Creates a backend with no volumes whose new volumes are active on the
    /// first poll.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts an active volume.
    pub fn insert_volume(&self, id: &str, label: &str, size_gb: u64) {
        self.state().volumes.insert(
            id.to_owned(),
            StoredVolume {
                label: label.to_owned(),
                size_gb,
                statuses: VecDeque::new(),
                status: VolumeStatus::Active,
            },
        );
    }

    /// Sets the statuses successive polls of the next created volumes report.
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = VolumeStatus>) {
        self.state().create_script = statuses.into_iter().collect();
    }

    /// New volumes report `creating` until poll `poll`, then `active`.
    pub fn activate_on_poll(&self, poll: u32) {
        let creating = (1..poll).map(|_| VolumeStatus::Creating);
        self.script_statuses(creating.chain([VolumeStatus::Active]));
    }

    /// Delays every create call, widening race windows in concurrency tests.
    pub fn delay_creates(&self, delay: Duration) {
        self.state().create_delay = Some(delay);
    }

    /// Fails every lookup with `message`.
    pub fn fail_lookups(&self, message: &str) {
        self.state().lookup_failure = Some(message.to_owned());
    }

    /// Fails lookups by volume identifier (status polls) with `message`.
    pub fn fail_status_polls(&self, message: &str) {
        self.state().poll_failure = Some(message.to_owned());
    }

    /// Fails every create with `message`.
    pub fn fail_creates(&self, message: &str) {
        self.state().create_failure = Some(message.to_owned());
    }

    /// Fails every delete with `message`.
    pub fn fail_deletes(&self, message: &str) {
        self.state().delete_failure = Some(message.to_owned());
    }

    /// Number of lookups, including status polls.
    #[must_use]
    pub fn lookup_calls(&self) -> u32 {
        self.state().lookup_calls
    }

    /// Number of lookups by volume identifier.
    #[must_use]
    pub fn status_polls(&self) -> u32 {
        self.state().status_polls
    }

    /// Number of create calls, including failed ones.
    #[must_use]
    pub fn create_calls(&self) -> u32 {
        self.state().create_calls
    }

    /// Parameters of every successful create call.
    #[must_use]
    pub fn created(&self) -> Vec<CreateVolumeParams> {
        self.state().created.clone()
    }

    /// Identifiers passed to delete, including failed calls.
    #[must_use]
    pub fn delete_calls(&self) -> Vec<String> {
        self.state().deleted.clone()
    }

    /// Number of volumes currently stored.
    #[must_use]
    pub fn volume_count(&self) -> usize {
        self.state().volumes.len()
    }

    fn lookup_now(&self, key: &str) -> Result<Option<RemoteVolume>, ScriptedStorageError> {
        let mut state = self.state();
        state.lookup_calls += 1;
        if let Some(message) = &state.lookup_failure {
            return Err(ScriptedStorageError::Injected(message.clone()));
        }

        if state.volumes.contains_key(key) {
            state.status_polls += 1;
            if let Some(message) = &state.poll_failure {
                return Err(ScriptedStorageError::Injected(message.clone()));
            }
            return Ok(state.volumes.get_mut(key).map(|volume| {
                if let Some(next) = volume.statuses.pop_front() {
                    volume.status = next;
                }
                remote(key, volume)
            }));
        }

        Ok(state
            .volumes
            .iter()
            .find(|(_, volume)| volume.label == key)
            .map(|(id, volume)| remote(id, volume)))
    }

    fn create_now(&self, params: &CreateVolumeParams) -> Result<RemoteVolume, ScriptedStorageError> {
        let mut state = self.state();
        if let Some(message) = &state.create_failure {
            return Err(ScriptedStorageError::Injected(message.clone()));
        }

        state.next_id += 1;
        let id = format!("vol-{:04}", state.next_id);
        let statuses = if state.create_script.is_empty() {
            VecDeque::from([VolumeStatus::Active])
        } else {
            state.create_script.iter().cloned().collect()
        };
        let volume = StoredVolume {
            label: params.label.clone(),
            size_gb: params.size_gb,
            statuses,
            status: VolumeStatus::Creating,
        };
        let created = remote(&id, &volume);
        state.volumes.insert(id, volume);
        state.created.push(params.clone());
        Ok(created)
    }

    fn delete_now(&self, id: &str) -> Result<(), ScriptedStorageError> {
        let mut state = self.state();
        state.deleted.push(id.to_owned());
        if let Some(message) = &state.delete_failure {
            return Err(ScriptedStorageError::Injected(message.clone()));
        }
        state
            .volumes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ScriptedStorageError::NotFound(id.to_owned()))
    }
}

fn remote(id: &str, volume: &StoredVolume) -> RemoteVolume {
    RemoteVolume {
        id: id.to_owned(),
        size_gb: volume.size_gb,
        status: volume.status.clone(),
    }
}

impl BlockStorage for ScriptedStorage {
    type Error = ScriptedStorageError;

    fn lookup<'a>(
        &'a self,
        name_or_id: &'a str,
    ) -> BackendFuture<'a, Option<RemoteVolume>, Self::Error> {
        Box::pin(async move { self.lookup_now(name_or_id) })
    }

    fn create<'a>(
        &'a self,
        params: &'a CreateVolumeParams,
    ) -> BackendFuture<'a, RemoteVolume, Self::Error> {
        Box::pin(async move {
            let delay = {
                let mut state = self.state();
                state.create_calls += 1;
                state.create_delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.create_now(params)
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_now(id) })
    }

    fn is_not_found(error: &Self::Error) -> bool {
        matches!(error, ScriptedStorageError::NotFound(_))
    }
}
