//! Domain types: raw observations, typed records, partition keys.

pub mod partition;
pub mod record;

pub use partition::{ExistingPartitionSet, PartitionKey, DATE_FORMAT};
pub use record::{CandidateRecord, CleanRecord, RawObservation, TIME_FORMAT};
