use crate::state::snapshot::{same_address, Snapshot};
use bitflags::bitflags;

bitflags! {
    /// Field-level difference between two observations of a host.
    ///
    /// The empty set means "no change".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChangeSet: u32 {
        const IS_NEW = 1 << 0;
        const IS_DELETED = 1 << 1;
        const CHANGED_HOST_ID = 1 << 2;
        const CHANGED_NAME = 1 << 3;
        const CHANGED_ADDRESS = 1 << 4;
        const CHANGED_STATUS = 1 << 5;

        /// Observable fields, all of which change relative to absence
        const FIELDS = Self::CHANGED_NAME.bits()
            | Self::CHANGED_ADDRESS.bits()
            | Self::CHANGED_STATUS.bits();
    }
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl ChangeSet {
    pub fn is_unchanged(&self) -> bool {
        self.is_empty()
    }

    pub fn is_new(&self) -> bool {
        self.contains(Self::IS_NEW)
    }

    pub fn is_deleted(&self) -> bool {
        self.contains(Self::IS_DELETED)
    }

    pub fn changed_host_id(&self) -> bool {
        self.contains(Self::CHANGED_HOST_ID)
    }

    pub fn changed_name(&self) -> bool {
        self.contains(Self::CHANGED_NAME)
    }

    pub fn changed_address(&self) -> bool {
        self.contains(Self::CHANGED_ADDRESS)
    }

    pub fn changed_status(&self) -> bool {
        self.contains(Self::CHANGED_STATUS)
    }

    /// Flag names, in bit order (e.g. `["IS_NEW", "CHANGED_NAME"]`)
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// Compare a new observation against the previous one.
///
/// `None` on the old side means the host was never seen (`IS_NEW`); `None`
/// on the new side means it disappeared (`IS_DELETED`). Either way every
/// observable field counts as changed. The capture timestamp never
/// participates in the comparison.
pub fn diff(new: Option<&Snapshot>, old: Option<&Snapshot>) -> ChangeSet {
    match (new, old) {
        (None, None) => ChangeSet::empty(),
        (Some(_), None) => ChangeSet::IS_NEW | ChangeSet::FIELDS,
        (None, Some(_)) => ChangeSet::IS_DELETED | ChangeSet::FIELDS,
        (Some(new), Some(old)) => {
            let mut changes = ChangeSet::empty();
            changes.set(ChangeSet::CHANGED_HOST_ID, new.host_id != old.host_id);
            changes.set(ChangeSet::CHANGED_NAME, new.name != old.name);
            changes.set(
                ChangeSet::CHANGED_ADDRESS,
                !same_address(new.address, old.address),
            );
            changes.set(ChangeSet::CHANGED_STATUS, new.status != old.status);
            changes
        }
    }
}
