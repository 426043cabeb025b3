#![deny(missing_docs)]
#![doc = "Shared types for pulsed-irradiation activation post-processing: the error surface, energy group structures, time units and run provenance."]

pub mod errors;
pub mod groups;
pub mod provenance;
pub mod units;

pub use errors::{ActError, ErrorInfo};
pub use groups::GroupStructure;
pub use provenance::{canonical_json_bytes, stable_hash_string, RunProvenance};
pub use units::TimeUnit;
