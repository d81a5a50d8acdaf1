use crate::state::changes::{diff, ChangeSet};
use crate::state::snapshot::{Snapshot, StatusValue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A tracked host: its latest and previous observation plus the change
/// set that produced the latest one.
///
/// Each entity carries its own lock so that updates to distinct hosts never
/// contend. The three fields always move together under that lock; readers
/// never see a half-applied update. Mutation only happens through
/// [`Registry::upsert`](crate::state::Registry::upsert).
#[derive(Debug)]
pub struct Entity {
    inner: RwLock<EntityState>,
}

#[derive(Debug)]
struct EntityState {
    current: Snapshot,
    previous: Option<Snapshot>,
    last_change: ChangeSet,
}

/// Consistent copy of an entity taken under a single read lock
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityView {
    pub current: Snapshot,
    pub previous: Option<Snapshot>,
    #[serde(serialize_with = "serialize_changes")]
    pub changes: ChangeSet,
}

fn serialize_changes<S: serde::Serializer>(
    changes: &ChangeSet,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(changes.names())
}

impl Entity {
    /// First sighting of a host
    pub(crate) fn new(snapshot: Snapshot) -> Self {
        let last_change = diff(Some(&snapshot), None);
        Self {
            inner: RwLock::new(EntityState {
                current: snapshot,
                previous: None,
                last_change,
            }),
        }
    }

    /// Diff `snapshot` against the current observation and, if anything
    /// differs, shift current into previous. Returns the changes of this call.
    pub(crate) fn apply(&self, snapshot: Snapshot) -> ChangeSet {
        let mut state = self.write();
        let changes = diff(Some(&snapshot), Some(&state.current));
        if !changes.is_empty() {
            state.last_change = changes;
            state.previous = Some(std::mem::replace(&mut state.current, snapshot));
        }
        changes
    }

    fn read(&self) -> RwLockReadGuard<'_, EntityState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view(&self) -> EntityView {
        let state = self.read();
        EntityView {
            current: state.current.clone(),
            previous: state.previous.clone(),
            changes: state.last_change,
        }
    }

    pub fn current(&self) -> Snapshot {
        self.read().current.clone()
    }

    pub fn previous(&self) -> Option<Snapshot> {
        self.read().previous.clone()
    }

    // Current observation

    pub fn host_id(&self) -> u64 {
        self.read().current.host_id
    }

    pub fn name(&self) -> String {
        self.read().current.name.clone()
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.read().current.address
    }

    pub fn status(&self) -> StatusValue {
        self.read().current.status
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.read().current.timestamp
    }

    // Previous observation; zero values when there is none

    pub fn old_host_id(&self) -> u64 {
        self.read().previous.as_ref().map_or(0, |p| p.host_id)
    }

    pub fn old_name(&self) -> String {
        self.read()
            .previous
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    pub fn old_address(&self) -> Option<IpAddr> {
        self.read().previous.as_ref().and_then(|p| p.address)
    }

    pub fn old_status(&self) -> StatusValue {
        self.read()
            .previous
            .as_ref()
            .map(|p| p.status)
            .unwrap_or_default()
    }

    pub fn old_observed_at(&self) -> DateTime<Utc> {
        self.read()
            .previous
            .as_ref()
            .map(|p| p.timestamp)
            .unwrap_or_default()
    }

    // Most recent change set

    pub fn change_set(&self) -> ChangeSet {
        self.read().last_change
    }

    pub fn is_new(&self) -> bool {
        self.change_set().is_new()
    }

    pub fn is_deleted(&self) -> bool {
        self.change_set().is_deleted()
    }

    pub fn is_unchanged(&self) -> bool {
        self.change_set().is_unchanged()
    }

    pub fn changed_host_id(&self) -> bool {
        self.change_set().changed_host_id()
    }

    pub fn changed_name(&self) -> bool {
        self.change_set().changed_name()
    }

    pub fn changed_address(&self) -> bool {
        self.change_set().changed_address()
    }

    pub fn changed_status(&self) -> bool {
        self.change_set().changed_status()
    }
}
