// Host snapshots, change detection and the host registry

mod changes;
mod entity;
mod registry;
mod snapshot;

pub use changes::{diff, ChangeSet};
pub use entity::{Entity, EntityView};
pub use registry::Registry;
pub use snapshot::{Snapshot, StatusValue};
