#![deny(missing_docs)]
#![doc = "Core data types, errors and canonical serde helpers for the SAP² decoding pipeline."]

pub mod channel;
pub mod errors;
/// Canonical hashing helpers.
pub mod hash;
/// Canonical JSON and YAML serde helpers.
pub mod serde;
pub mod transcript;

pub use channel::{Channel, Event, InputKind, Matrix, Measure, RelationPair};
pub use errors::{ErrorInfo, SapError};
pub use hash::stable_hash_string;
pub use transcript::{load_transcript, parse_transcript, Transcript};
