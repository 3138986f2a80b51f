pub mod overwrite;
pub mod record_store;

pub use overwrite::{ArtifactKind, OverwritePlan, PlannedRemoval};
pub use record_store::{Materialization, RecordStore};
